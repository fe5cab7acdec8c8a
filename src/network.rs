//! Two-stage feed-forward classifier.
//!
//! The network has a single hidden unit whose weights cover the whole grid and a
//! single output unit whose weights do too:
//!
//! - `hidden_sum = Σ input · hidden`
//! - `activation = step(hidden_sum > bias)`
//! - `score = activation · Σ output`
//!
//! Both reductions are split across rows and accumulate in `f64`, so the score
//! does not depend on how rayon schedules the rows in practice.

use rayon::prelude::*;

use crate::Grid;

/// Default decision threshold.
pub const DEFAULT_BIAS: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    hidden: Grid,
    output: Grid,
    bias: f32,
}

impl Network {
    pub fn new(hidden: Grid, output: Grid, bias: f32) -> Self {
        Self {
            hidden,
            output,
            bias,
        }
    }

    /// All-zero weights. Every input scores 0.
    pub fn zeros(bias: f32) -> Self {
        Self::new(Grid::zeros(), Grid::zeros(), bias)
    }

    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    #[inline]
    pub fn hidden(&self) -> &Grid {
        &self.hidden
    }

    #[inline]
    pub fn output(&self) -> &Grid {
        &self.output
    }

    /// Mutable access to both weight grids at once.
    #[inline]
    pub fn weights_mut(&mut self) -> (&mut Grid, &mut Grid) {
        (&mut self.hidden, &mut self.output)
    }

    pub fn into_weights(self) -> (Grid, Grid) {
        (self.hidden, self.output)
    }

    /// Score `input`. Compare the result against [`Network::bias`].
    #[inline]
    pub fn classify(&self, input: &Grid) -> f32 {
        classify(input, &self.hidden, &self.output, self.bias)
    }
}

/// Feed `input` through the two weight grids and return the output score.
pub fn classify(input: &Grid, hidden: &Grid, output: &Grid, bias: f32) -> f32 {
    let hidden_sum = dot(input, hidden);
    let activation = step(hidden_sum, f64::from(bias));
    if activation == 0.0 {
        return 0.0;
    }
    (activation * output.sum()) as f32
}

#[inline]
fn step(x: f64, threshold: f64) -> f64 {
    if x > threshold { 1.0 } else { 0.0 }
}

fn dot(a: &Grid, b: &Grid) -> f64 {
    a.rows()
        .par_iter()
        .zip(b.rows().par_iter())
        .map(|(ra, rb)| {
            ra.iter()
                .zip(rb)
                .map(|(&x, &w)| f64::from(x) * f64::from(w))
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RandomSource;

    #[test]
    fn zero_weights_score_zero() {
        let net = Network::zeros(DEFAULT_BIAS);
        let mut rng = RandomSource::new(5);
        let mut input = Grid::zeros();
        for _ in 0..20 {
            input.fill_noise(&mut rng);
            assert_eq!(net.classify(&input), 0.0);
        }
        assert_eq!(net.classify(&Grid::filled(1.0)), 0.0);
    }

    #[test]
    fn hidden_sum_must_exceed_the_bias() {
        let mut input = Grid::zeros();
        input.fill_rect(0, 0, 4, 5, 1.0).unwrap();
        let output = Grid::filled(0.25);

        // 20 cells at weight 1.0 sum to exactly the bias: not above it.
        let at_bias = Network::new(Grid::filled(1.0), output, 20.0);
        assert_eq!(at_bias.classify(&input), 0.0);

        let above = Network::new(Grid::filled(1.5), output, 20.0);
        assert!((above.classify(&input) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn score_is_the_output_sum_when_active() {
        let mut rng = RandomSource::new(9);
        let mut output = Grid::zeros();
        output.fill_noise(&mut rng);
        let net = Network::new(Grid::filled(1.0), output, 0.0);
        let score = net.classify(&Grid::filled(1.0));
        assert!((f64::from(score) - output.sum()).abs() < 1e-4);
    }

    #[test]
    fn classify_is_pure() {
        let mut rng = RandomSource::new(12);
        let (mut input, mut hidden, mut output) = (Grid::zeros(), Grid::zeros(), Grid::zeros());
        input.fill_noise(&mut rng);
        hidden.fill_noise(&mut rng);
        output.fill_noise(&mut rng);
        let net = Network::new(hidden, output, -100.0);

        let a = net.classify(&input);
        let b = net.classify(&input);
        assert!((a - b).abs() < 1e-6);
        assert_eq!(net.hidden(), &hidden);
        assert_eq!(net.output(), &output);
    }
}

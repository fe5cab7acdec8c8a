//! Training and evaluation passes.
//!
//! A pass draws `sample_size` rectangle/circle pairs. Each sample is classified and
//! checked against its class trigger (`score > bias` for rectangles, `score < bias`
//! for circles). The same trigger drives both modes:
//!
//! - [`Mode::Train`] corrects the weights and counts the sample;
//! - [`Mode::Evaluate`] only counts it.
//!
//! Training passes run their samples one after another, since every correction
//! changes the weights the next sample sees. Evaluation passes draw the whole
//! shape sequence up front, then classify the samples in parallel, each on its own
//! input grid.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::store::SnapshotSink;
use crate::{Config, Grid, Network, PatternGenerator, Result, Shape, ShapeKind, adjust};

/// Sample order within one iteration of a pass.
const PAIR: [ShapeKind; 2] = [ShapeKind::Rectangle, ShapeKind::Circle];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Evaluate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassReport {
    pub mode: Mode,
    /// Triggered samples: corrections in training, failures in evaluation.
    pub tally: usize,
    pub samples: usize,
    pub elapsed: Duration,
}

impl PassReport {
    #[inline]
    pub fn fail_rate(&self) -> f64 {
        self.tally as f64 / self.samples as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Evaluation before any training.
    pub initial: PassReport,
    /// Evaluation after the last training pass.
    pub trained: PassReport,
    /// Training passes actually run.
    pub passes: usize,
    /// Whether training stopped on a pass without corrections.
    pub converged: bool,
    pub last_tally: usize,
}

/// Drives passes over a [`Network`].
///
/// The trainer owns the pattern generator and the input grid used by training
/// passes. It is the only writer of the network's weights while a pass runs.
pub struct Trainer {
    config: Config,
    generator: PatternGenerator,
    input: Grid,
    sink: Option<Box<dyn SnapshotSink>>,
}

impl Trainer {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let generator = PatternGenerator::new(config.train_seed);
        Ok(Self {
            config,
            generator,
            input: Grid::zeros(),
            sink: None,
        })
    }

    /// Hand every post-correction pair of weight grids to `sink`.
    pub fn with_snapshots(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn generator_mut(&mut self) -> &mut PatternGenerator {
        &mut self.generator
    }

    /// Run one pass continuing from the generator's current state.
    pub fn run_pass(&mut self, mode: Mode, network: &mut Network) -> Result<PassReport> {
        match mode {
            Mode::Train => self.train_pass(network),
            Mode::Evaluate => self.evaluate_pass(network),
        }
    }

    /// One training pass. Returns the number of corrections made.
    pub fn train_pass(&mut self, network: &mut Network) -> Result<PassReport> {
        let start = Instant::now();
        let mut tally = 0;

        for _ in 0..self.config.sample_size {
            for kind in PAIR {
                let shape = self.generator.next_shape(kind)?;
                shape.render(&mut self.input)?;

                let score = network.classify(&self.input);
                if kind.triggers(score, network.bias()) {
                    adjust::correct(kind, &self.input, network);
                    self.snapshot(network);
                    tally += 1;
                }
            }
        }

        Ok(self.report(Mode::Train, tally, start))
    }

    /// One evaluation pass. Returns the number of failed samples.
    pub fn evaluate_pass(&mut self, network: &Network) -> Result<PassReport> {
        let start = Instant::now();

        let mut shapes = Vec::with_capacity(self.config.samples_per_pass());
        for _ in 0..self.config.sample_size {
            for kind in PAIR {
                shapes.push(self.generator.next_shape(kind)?);
            }
        }

        let bias = network.bias();
        let tally = shapes
            .par_iter()
            .map(|shape| failed(shape, network, bias))
            .try_fold(|| 0_usize, |acc, hit| hit.map(|h| acc + usize::from(h)))
            .try_reduce(|| 0, |a, b| Ok(a + b))?;

        Ok(self.report(Mode::Evaluate, tally, start))
    }

    /// Evaluation pass from the fixed check seed.
    pub fn evaluate(&mut self, network: &Network) -> Result<PassReport> {
        self.generator.reseed(self.config.check_seed);
        self.evaluate_pass(network)
    }

    /// Training pass from the fixed training seed, as run by [`Trainer::fit`].
    pub fn seeded_train_pass(&mut self, network: &mut Network) -> Result<PassReport> {
        self.generator.reseed(self.config.train_seed);
        // Placeholder baseline; every sample overwrites the input grid anyway.
        self.input.fill_noise(self.generator.source_mut());
        self.train_pass(network)
    }

    /// Full schedule: evaluate, train until a pass makes no correction or the pass
    /// budget runs out, evaluate again.
    ///
    /// Every training pass restarts from the training seed, so all passes see the
    /// same sample sequence.
    #[instrument(level = "debug", skip_all)]
    pub fn fit(&mut self, network: &mut Network) -> Result<FitReport> {
        let initial = self.evaluate(network)?;
        info!(
            fail_rate = initial.fail_rate(),
            "fail rate of untrained model"
        );

        let mut passes = 0;
        let mut converged = false;
        let mut last_tally = 0;
        for pass in 0..self.config.train_passes {
            let report = self.seeded_train_pass(network)?;
            passes += 1;
            last_tally = report.tally;
            info!(pass, adjusted = report.tally, "training pass");

            if report.tally == 0 {
                debug!(pass, "no corrections, stopping training");
                converged = true;
                break;
            }
        }

        let trained = self.evaluate(network)?;
        info!(
            fail_rate = trained.fail_rate(),
            passes, converged, "fail rate of trained model"
        );

        Ok(FitReport {
            initial,
            trained,
            passes,
            converged,
            last_tally,
        })
    }

    fn snapshot(&mut self, network: &Network) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.snapshot(network.hidden(), network.output()) {
                warn!(%err, "failed to write weight snapshot");
            }
        }
    }

    fn report(&self, mode: Mode, tally: usize, start: Instant) -> PassReport {
        let elapsed = start.elapsed();
        debug!(?mode, tally, ?elapsed, "pass finished");
        PassReport {
            mode,
            tally,
            samples: self.config.samples_per_pass(),
            elapsed,
        }
    }
}

fn failed(shape: &Shape, network: &Network, bias: f32) -> Result<bool> {
    let mut input = Grid::zeros();
    shape.render(&mut input)?;
    Ok(shape.kind().triggers(network.classify(&input), bias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config(sample_size: usize, bias: f32) -> Config {
        Config {
            sample_size,
            bias,
            ..Config::default()
        }
    }

    /// Counts snapshots; fails every call when `fail` is set.
    struct Counting {
        calls: Rc<RefCell<usize>>,
        fail: bool,
    }

    impl SnapshotSink for Counting {
        fn snapshot(&mut self, _hidden: &Grid, _output: &Grid) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            if self.fail {
                return Err(Error::Format("disk full".to_owned()));
            }
            Ok(())
        }
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(Trainer::new(config(0, 20.0)).is_err());
    }

    #[test]
    fn zero_weights_fail_every_circle_and_no_rectangle() {
        // Score is always 0: circles trigger (0 < 20), rectangles do not.
        let mut trainer = Trainer::new(config(30, 20.0)).unwrap();
        let net = Network::zeros(20.0);
        let report = trainer.evaluate(&net).unwrap();
        assert_eq!(report.mode, Mode::Evaluate);
        assert_eq!(report.samples, 60);
        assert_eq!(report.tally, 30);
        assert!((report.fail_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn evaluation_is_reproducible_and_read_only() {
        let mut trainer = Trainer::new(config(40, 2.0)).unwrap();
        let mut net = Network::new(Grid::filled(0.3), Grid::filled(-0.01), 2.0);
        let before = net.clone();

        let a = trainer.evaluate(&net).unwrap();
        let b = trainer.run_pass(Mode::Evaluate, &mut net);
        let c = trainer.evaluate(&net).unwrap();
        assert!(b.is_ok());
        assert_eq!(a.tally, c.tally);
        assert_eq!(net, before);
    }

    #[test]
    fn parallel_evaluation_matches_sequential_replay() {
        let cfg = config(25, 1.0);
        let mut trainer = Trainer::new(cfg.clone()).unwrap();
        let net = Network::new(Grid::filled(0.2), Grid::filled(0.01), 1.0);
        let report = trainer.evaluate(&net).unwrap();

        let mut generator = PatternGenerator::new(cfg.check_seed);
        let mut input = Grid::zeros();
        let mut expected = 0;
        for _ in 0..cfg.sample_size {
            generator.random_rectangle(&mut input).unwrap();
            expected += usize::from(net.classify(&input) > 1.0);
            generator.random_circle(&mut input).unwrap();
            expected += usize::from(net.classify(&input) < 1.0);
        }
        assert_eq!(report.tally, expected);
    }

    #[test]
    fn training_snapshots_every_correction_and_survives_sink_errors() {
        let calls = Rc::new(RefCell::new(0));
        let mut trainer = Trainer::new(config(10, 20.0))
            .unwrap()
            .with_snapshots(Counting {
                calls: Rc::clone(&calls),
                fail: true,
            });
        let mut net = Network::zeros(20.0);
        let report = trainer.train_pass(&mut net).unwrap();
        assert!(report.tally > 0);
        assert_eq!(*calls.borrow(), report.tally);
    }

    #[test]
    fn fit_stops_on_the_first_quiet_pass() {
        // With bias 0 and zero weights nothing triggers: 0 > 0 and 0 < 0 are false.
        let mut trainer = Trainer::new(config(10, 0.0)).unwrap();
        let mut net = Network::zeros(0.0);
        let report = trainer.fit(&mut net).unwrap();
        assert_eq!(report.passes, 1);
        assert!(report.converged);
        assert_eq!(report.last_tally, 0);
        assert_eq!(report.initial.tally, 0);
        assert_eq!(net, Network::zeros(0.0));
    }
}

//! Random rectangle/circle patterns.
//!
//! Rectangles are the positive class and circles the negative class. A pattern
//! is not stored anywhere: it is the 0/1 image a [`Shape`] leaves on an input
//! grid after the grid has been cleared.

use crate::grid::{HEIGHT, WIDTH};
use crate::{Grid, RandomSource, Result};

/// The two pattern classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Positive class: expected score above the bias.
    Rectangle,
    /// Negative class: expected score below the bias.
    Circle,
}

impl ShapeKind {
    /// Whether `score` marks a sample of this class for correction (training) or
    /// as a failure (evaluation). Both modes share the same condition.
    #[inline]
    pub fn triggers(self, score: f32, bias: f32) -> bool {
        match self {
            ShapeKind::Rectangle => score > bias,
            ShapeKind::Circle => score < bias,
        }
    }
}

/// A concrete shape, in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rectangle { x: i32, y: i32, w: i32, h: i32 },
    Circle { cx: i32, cy: i32, r: i32 },
}

impl Shape {
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Replace `grid` with the shape drawn in 1.0 on a cleared background.
    ///
    /// On error `grid` is left untouched.
    pub fn render(&self, grid: &mut Grid) -> Result<()> {
        let mut canvas = Grid::zeros();
        match *self {
            Shape::Rectangle { x, y, w, h } => canvas.fill_rect(x, y, w, h, 1.0)?,
            Shape::Circle { cx, cy, r } => canvas.fill_circle(cx, cy, r, 1.0)?,
        }
        *grid = canvas;
        Ok(())
    }
}

/// Draws shapes from an owned [`RandomSource`].
///
/// The draw order is fixed (`x, y, w, h` for rectangles, `cx, cy, r` for circles),
/// so a seed fully determines the sequence of shapes.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    rng: RandomSource,
}

impl PatternGenerator {
    pub fn new(seed: u64) -> Self {
        Self::from_source(RandomSource::new(seed))
    }

    pub fn from_source(rng: RandomSource) -> Self {
        Self { rng }
    }

    /// Restart the shape sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    #[inline]
    pub fn source_mut(&mut self) -> &mut RandomSource {
        &mut self.rng
    }

    /// Draw a rectangle.
    ///
    /// The height bound is taken from the column `x`, not the row `y`. Fixed-seed
    /// fail rates depend on this distribution; overhang is clipped when drawn.
    pub fn next_rectangle(&mut self) -> Result<Shape> {
        let x = self.rng.range(0, WIDTH as i32)?;
        let y = self.rng.range(0, HEIGHT as i32)?;
        let w = self.rng.range(1, (WIDTH as i32 - x).max(2))?;
        let h = self.rng.range(1, (HEIGHT as i32 - x).max(2))?;
        Ok(Shape::Rectangle { x, y, w, h })
    }

    /// Draw a circle whose bounding box stays inside the grid where possible.
    pub fn next_circle(&mut self) -> Result<Shape> {
        let cx = self.rng.range(0, WIDTH as i32)?;
        let cy = self.rng.range(0, HEIGHT as i32)?;
        let bound = cx
            .min(cy)
            .min(WIDTH as i32 - cx)
            .min(HEIGHT as i32 - cy)
            .max(2);
        let r = self.rng.range(1, bound)?;
        Ok(Shape::Circle { cx, cy, r })
    }

    #[inline]
    pub fn next_shape(&mut self, kind: ShapeKind) -> Result<Shape> {
        match kind {
            ShapeKind::Rectangle => self.next_rectangle(),
            ShapeKind::Circle => self.next_circle(),
        }
    }

    /// Regenerate `grid` as a random filled rectangle.
    pub fn random_rectangle(&mut self, grid: &mut Grid) -> Result<Shape> {
        let shape = self.next_rectangle()?;
        shape.render(grid)?;
        Ok(shape)
    }

    /// Regenerate `grid` as a random filled circle.
    pub fn random_circle(&mut self, grid: &mut Grid) -> Result<Shape> {
        let shape = self.next_circle()?;
        shape.render(grid)?;
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn ones(grid: &Grid) -> usize {
        grid.as_flat().iter().filter(|&&v| v == 1.0).count()
    }

    #[test]
    fn same_seed_same_shapes() {
        let mut a = PatternGenerator::new(69);
        let mut b = PatternGenerator::new(69);
        for _ in 0..200 {
            assert_eq!(a.next_rectangle().unwrap(), b.next_rectangle().unwrap());
            assert_eq!(a.next_circle().unwrap(), b.next_circle().unwrap());
        }
    }

    #[test]
    fn reseed_replays_the_grids() {
        let mut generator = PatternGenerator::new(420);
        let mut first = Vec::new();
        let mut grid = Grid::zeros();
        for _ in 0..10 {
            generator.random_rectangle(&mut grid).unwrap();
            first.push(grid);
            generator.random_circle(&mut grid).unwrap();
            first.push(grid);
        }

        generator.reseed(420);
        let mut replay = Vec::new();
        for _ in 0..10 {
            generator.random_rectangle(&mut grid).unwrap();
            replay.push(grid);
            generator.random_circle(&mut grid).unwrap();
            replay.push(grid);
        }
        assert_eq!(first, replay);
    }

    #[test]
    fn rectangle_parameters_respect_their_bounds() {
        let mut generator = PatternGenerator::new(7);
        for _ in 0..2_000 {
            let Shape::Rectangle { x, y, w, h } = generator.next_rectangle().unwrap() else {
                panic!("expected a rectangle");
            };
            assert!((0..WIDTH as i32).contains(&x));
            assert!((0..HEIGHT as i32).contains(&y));
            assert!(w >= 1 && w < (WIDTH as i32 - x).max(2));
            assert!(h >= 1 && h < (HEIGHT as i32 - x).max(2));
        }
    }

    #[test]
    fn circle_parameters_respect_their_bounds() {
        let mut generator = PatternGenerator::new(11);
        for _ in 0..2_000 {
            let Shape::Circle { cx, cy, r } = generator.next_circle().unwrap() else {
                panic!("expected a circle");
            };
            let bound = cx
                .min(cy)
                .min(WIDTH as i32 - cx)
                .min(HEIGHT as i32 - cy)
                .max(2);
            assert!(r >= 1 && r < bound);
        }
    }

    #[test]
    fn rendering_discards_previous_contents() {
        let mut grid = Grid::filled(5.0);
        Shape::Rectangle { x: 1, y: 1, w: 2, h: 3 }
            .render(&mut grid)
            .unwrap();
        assert_eq!(ones(&grid), 6);
        assert_eq!(grid.sum(), 6.0);
    }

    #[test]
    fn invalid_shapes_leave_the_grid_alone() {
        let mut grid = Grid::filled(3.0);
        let flat = Shape::Rectangle { x: 2, y: 2, w: 0, h: 4 };
        assert!(matches!(flat.render(&mut grid), Err(Error::InvalidShape(_))));
        let dot = Shape::Circle { cx: 5, cy: 5, r: 0 };
        assert!(matches!(dot.render(&mut grid), Err(Error::InvalidShape(_))));
        assert_eq!(grid, Grid::filled(3.0));
    }

    #[test]
    fn shapes_are_never_empty() {
        let mut generator = PatternGenerator::new(1);
        let mut grid = Grid::zeros();
        for _ in 0..500 {
            generator.random_rectangle(&mut grid).unwrap();
            assert!(ones(&grid) >= 1);
            generator.random_circle(&mut grid).unwrap();
            assert!(ones(&grid) >= 1);
        }
    }

    #[test]
    fn trigger_conditions() {
        assert!(ShapeKind::Rectangle.triggers(21.0, 20.0));
        assert!(!ShapeKind::Rectangle.triggers(20.0, 20.0));
        assert!(ShapeKind::Circle.triggers(0.0, 20.0));
        assert!(!ShapeKind::Circle.triggers(20.0, 20.0));
        assert_eq!(
            Shape::Circle { cx: 0, cy: 0, r: 1 }.kind(),
            ShapeKind::Circle
        );
    }
}

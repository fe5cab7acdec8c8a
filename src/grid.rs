//! Fixed-size 2D float buffer.
//!
//! A `Grid` is used both for pattern samples and for layer weights. The size is a
//! compile-time constant and storage is an inline row-major array, so grids are
//! plain values: no allocation, no resizing.
//!
//! Whole-grid loops are split across rows on the rayon pool. Rows are disjoint, so
//! writes never need synchronization.

use std::ops::{AddAssign, SubAssign};

use rayon::prelude::*;

use crate::{Error, RandomSource, Result};

/// Number of columns.
pub const WIDTH: usize = 20;
/// Number of rows.
pub const HEIGHT: usize = 20;
/// Number of cells.
pub const CELLS: usize = WIDTH * HEIGHT;

pub type Row = [f32; WIDTH];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    cells: [Row; HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Grid {
    #[inline]
    pub const fn zeros() -> Self {
        Self::filled(0.0)
    }

    #[inline]
    pub const fn filled(value: f32) -> Self {
        Self {
            cells: [[value; WIDTH]; HEIGHT],
        }
    }

    /// Build a grid from `CELLS` row-major values.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        if values.len() != CELLS {
            return Err(Error::Format(format!(
                "expected {CELLS} values for a {WIDTH}x{HEIGHT} grid, got {}",
                values.len()
            )));
        }
        let mut grid = Self::zeros();
        for (row, chunk) in grid.cells.iter_mut().zip(values.chunks_exact(WIDTH)) {
            row.copy_from_slice(chunk);
        }
        Ok(grid)
    }

    #[inline]
    /// Returns the cell at column `x`, row `y`.
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.cells[y][x]
    }

    #[inline]
    /// Overwrites the cell at column `x`, row `y`.
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.cells[y][x] = value;
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.cells
    }

    #[inline]
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.cells
    }

    #[inline]
    /// Row-major view of all cells.
    pub fn as_flat(&self) -> &[f32] {
        self.cells.as_flattened()
    }

    /// Sum of all cells.
    pub fn sum(&self) -> f64 {
        self.cells
            .par_iter()
            .map(|row| row.iter().map(|&v| f64::from(v)).sum::<f64>())
            .sum()
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: f32) {
        self.cells.par_iter_mut().for_each(|row| row.fill(value));
    }

    /// Overwrite every cell with uniform noise in `[-1, 1]`.
    ///
    /// Cells are drawn in row-major order so the result only depends on the
    /// state of `rng`.
    pub fn fill_noise(&mut self, rng: &mut RandomSource) {
        for v in self.cells.as_flattened_mut() {
            *v = rng.noise();
        }
    }

    /// Write `value` into the rectangle with origin `(x, y)` and extent `w` x `h`.
    ///
    /// The origin is clamped into the grid first, then the far corner
    /// `origin + extent - 1` is clamped, so the region can shrink to a single row or
    /// column but never becomes empty.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, value: f32) -> Result<()> {
        if w <= 0 || h <= 0 {
            return Err(Error::InvalidShape(format!(
                "rectangle extent must be > 0, got {w}x{h}"
            )));
        }

        let x0 = clamp_col(x);
        let y0 = clamp_row(y);
        let x1 = clamp_col(x0.saturating_add(w - 1));
        let y1 = clamp_row(y0.saturating_add(h - 1));
        let (x0, x1) = (x0 as usize, x1 as usize);

        self.cells[y0 as usize..=y1 as usize]
            .par_iter_mut()
            .for_each(|row| row[x0..=x1].fill(value));
        Ok(())
    }

    /// Write `value` into every cell within distance `r` of `(cx, cy)`.
    ///
    /// The center may lie outside the grid; only cells inside the grid are written.
    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, value: f32) -> Result<()> {
        if r <= 0 {
            return Err(Error::InvalidShape(format!(
                "circle radius must be > 0, got {r}"
            )));
        }

        // A disc clear of the grid writes nothing. Past this point every clamped
        // cell lies within `r` of the center on both axes.
        let (cx64, cy64, r64) = (i64::from(cx), i64::from(cy), i64::from(r));
        if cx64 + r64 < 0
            || cy64 + r64 < 0
            || cx64 - r64 >= WIDTH as i64
            || cy64 - r64 >= HEIGHT as i64
        {
            return Ok(());
        }

        let x0 = clamp_col(cx.saturating_sub(r));
        let y0 = clamp_row(cy.saturating_sub(r));
        let x1 = clamp_col(cx.saturating_add(r));
        let y1 = clamp_row(cy.saturating_add(r));
        let r2 = r64 * r64;

        self.cells[y0 as usize..=y1 as usize]
            .par_iter_mut()
            .enumerate()
            .for_each(|(offset, row)| {
                let dy = i64::from(y0) + offset as i64 - cy64;
                for px in x0..=x1 {
                    let dx = i64::from(px) - cx64;
                    if dx * dx + dy * dy <= r2 {
                        row[px as usize] = value;
                    }
                }
            });
        Ok(())
    }
}

impl AddAssign<&Grid> for Grid {
    fn add_assign(&mut self, rhs: &Grid) {
        self.cells
            .par_iter_mut()
            .zip(rhs.cells.par_iter())
            .for_each(|(out, inp)| {
                for (w, &v) in out.iter_mut().zip(inp) {
                    *w += v;
                }
            });
    }
}

impl SubAssign<&Grid> for Grid {
    fn sub_assign(&mut self, rhs: &Grid) {
        self.cells
            .par_iter_mut()
            .zip(rhs.cells.par_iter())
            .for_each(|(out, inp)| {
                for (w, &v) in out.iter_mut().zip(inp) {
                    *w -= v;
                }
            });
    }
}

#[inline]
fn clamp_col(x: i32) -> i32 {
    x.clamp(0, WIDTH as i32 - 1)
}

#[inline]
fn clamp_row(y: i32) -> i32 {
    y.clamp(0, HEIGHT as i32 - 1)
}

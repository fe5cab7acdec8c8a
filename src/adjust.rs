//! Additive/subtractive weight corrections.
//!
//! There is no learning rate, decay, or clipping: a correction moves a weight grid
//! by exactly one input grid, and weights may grow without bound.

use crate::{Grid, Network, ShapeKind};

/// `weights += input`, cell by cell.
#[inline]
pub fn add(input: &Grid, weights: &mut Grid) {
    *weights += input;
}

/// `weights -= input`, cell by cell.
#[inline]
pub fn subtract(input: &Grid, weights: &mut Grid) {
    *weights -= input;
}

/// Apply the correction for a triggered sample of class `kind`.
///
/// - rectangle: hidden -= input, output += input
/// - circle: hidden += input, output -= input
pub fn correct(kind: ShapeKind, input: &Grid, network: &mut Network) {
    let (hidden, output) = network.weights_mut();
    match kind {
        ShapeKind::Rectangle => {
            subtract(input, hidden);
            add(input, output);
        }
        ShapeKind::Circle => {
            add(input, hidden);
            subtract(input, output);
        }
    }
}

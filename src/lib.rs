//! A tiny trainable shape classifier.
//!
//! `grid-perceptron` learns to tell filled rectangles from filled circles on a fixed
//! 20x20 grid. The network is two weight grids and a threshold:
//!
//! - the hidden unit fires when `Σ input · hidden` exceeds the bias;
//! - the score is then `Σ output`, otherwise 0.
//!
//! Learning is a correction rule, not gradient descent: whenever a sample trips its
//! class trigger, the input grid is added to one weight grid and subtracted from
//! the other.
//!
//! # Data layout
//!
//! - Scalars are `f32`; reductions accumulate in `f64`.
//! - [`Grid`] is an inline `[[f32; WIDTH]; HEIGHT]`, row-major, `Copy`.
//! - Shapes use signed grid coordinates and are clipped to the grid when drawn.
//!
//! # Randomness
//!
//! All randomness flows through an owned [`RandomSource`]. Passes reseed it
//! explicitly, so fail rates are reproducible for a given seed.
//!
//! # Quick start
//!
//! ```rust
//! use grid_perceptron::{Config, Network, Trainer};
//!
//! # fn main() -> grid_perceptron::Result<()> {
//! let config = Config {
//!     sample_size: 10,
//!     train_passes: 5,
//!     ..Config::default()
//! };
//! let mut network = Network::zeros(config.bias);
//! let mut trainer = Trainer::new(config)?;
//!
//! let report = trainer.fit(&mut network)?;
//! println!(
//!     "fail rate {:.3} -> {:.3} after {} passes",
//!     report.initial.fail_rate(),
//!     report.trained.fail_rate(),
//!     report.passes
//! );
//! # Ok(())
//! # }
//! ```

pub mod adjust;
pub mod config;
pub mod error;
pub mod grid;
pub mod network;
pub mod pattern;
pub mod random;
pub mod store;
pub mod train;

#[cfg(feature = "json")]
pub mod model_file;

pub use config::Config;
pub use error::{Error, Result};
pub use grid::{Grid, HEIGHT, WIDTH};
pub use network::{Network, classify};
pub use pattern::{PatternGenerator, Shape, ShapeKind};
pub use random::RandomSource;
pub use store::{ImageStyle, PpmSnapshots, SnapshotSink};
pub use train::{FitReport, Mode, PassReport, Trainer};

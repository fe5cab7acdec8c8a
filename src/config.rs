//! Run configuration.
//!
//! Every knob of a training run lives in one [`Config`]. Values can be read from a
//! TOML file; missing keys fall back to the defaults below.
//!
//! ```toml
//! bias = 20.0
//! sample_size = 75
//! train_passes = 2000
//! train_seed = 69
//! check_seed = 420
//! data_dir = "data"
//! snapshots = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::grid::{HEIGHT, WIDTH};
use crate::network::DEFAULT_BIAS;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Grid columns. Must match the compiled grid size.
    pub width: usize,
    /// Grid rows. Must match the compiled grid size.
    pub height: usize,
    /// Activation and decision threshold.
    pub bias: f32,
    /// Rectangle/circle pairs per pass.
    pub sample_size: usize,
    /// Upper bound on training passes.
    pub train_passes: usize,
    /// Seed every training pass restarts from.
    pub train_seed: u64,
    /// Seed evaluation passes restart from.
    pub check_seed: u64,
    /// Where snapshots and saved weights go.
    pub data_dir: PathBuf,
    /// Write an image of both weight grids after every correction.
    pub snapshots: bool,
    /// Pixels per cell in rendered images.
    pub image_scale: usize,
    /// Weight magnitude mapped to full color intensity.
    pub image_range: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            bias: DEFAULT_BIAS,
            sample_size: 75,
            train_passes: 2000,
            train_seed: 69,
            check_seed: 420,
            data_dir: PathBuf::from("data"),
            snapshots: false,
            image_scale: 25,
            image_range: 10.0,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let contents = fs::read_to_string(p).map_err(|e| Error::io(p, e))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(s).map_err(|e| Error::Format(format!("invalid config toml: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Format(format!("failed to render config: {e}")))
    }

    /// Number of samples in one pass (one rectangle and one circle per iteration).
    #[inline]
    pub fn samples_per_pass(&self) -> usize {
        2 * self.sample_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.width != WIDTH || self.height != HEIGHT {
            return Err(Error::InvalidConfig(format!(
                "grid size is fixed at {WIDTH}x{HEIGHT}, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.bias.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "bias must be finite, got {}",
                self.bias
            )));
        }
        if self.sample_size == 0 {
            return Err(Error::InvalidConfig("sample_size must be > 0".to_owned()));
        }
        if self.train_passes == 0 {
            return Err(Error::InvalidConfig("train_passes must be > 0".to_owned()));
        }
        if self.image_scale == 0 {
            return Err(Error::InvalidConfig("image_scale must be > 0".to_owned()));
        }
        if !(self.image_range.is_finite() && self.image_range > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "image_range must be finite and > 0, got {}",
                self.image_range
            )));
        }
        Ok(())
    }
}

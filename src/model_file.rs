//! Model file (feature: `json`).
//!
//! A trained network is stored as one versioned JSON document holding the bias
//! and both weight grids as flat row-major arrays. Loading validates the format
//! version, the grid dimensions, and that every value is finite.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grid::{CELLS, HEIGHT, WIDTH};
use crate::{Error, Grid, Network, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNetwork {
    pub format_version: u32,
    pub width: usize,
    pub height: usize,
    pub bias: f32,
    /// Row-major (height, width).
    pub hidden: Vec<f32>,
    /// Row-major (height, width).
    pub output: Vec<f32>,
}

impl SerializedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::Format(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.width != WIDTH || self.height != HEIGHT {
            return Err(Error::Format(format!(
                "model grid is {}x{}, expected {WIDTH}x{HEIGHT}",
                self.width, self.height
            )));
        }
        if !self.bias.is_finite() {
            return Err(Error::Format("bias must be finite".to_owned()));
        }
        for (name, values) in [("hidden", &self.hidden), ("output", &self.output)] {
            if values.len() != CELLS {
                return Err(Error::Format(format!(
                    "{name} has {} values, expected {CELLS}",
                    values.len()
                )));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(Error::Format(format!(
                    "{name} must contain only finite values"
                )));
            }
        }
        Ok(())
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(network: &Network) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            width: WIDTH,
            height: HEIGHT,
            bias: network.bias(),
            hidden: network.hidden().as_flat().to_vec(),
            output: network.output().as_flat().to_vec(),
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> std::result::Result<Self, Self::Error> {
        value.validate()?;
        Ok(Network::new(
            Grid::from_flat(&value.hidden)?,
            Grid::from_flat(&value.output)?,
            value.bias,
        ))
    }
}

impl Network {
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SerializedNetwork::from(self))
            .map_err(|e| Error::Format(format!("failed to serialize model: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNetwork = serde_json::from_str(s)
            .map_err(|e| Error::Format(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s).map_err(|e| Error::io(p, e))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p).map_err(|e| Error::io(p, e))?;
        Self::from_json_str(&s)
    }
}

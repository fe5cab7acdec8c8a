use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A rectangle or circle with a non-positive extent.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    /// A random draw over an empty range.
    #[error("invalid range: [{low}, {high}) is empty")]
    InvalidRange { low: i32, high: i32 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A persisted grid or config that could not be decoded.
    #[error("format error: {0}")]
    Format(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

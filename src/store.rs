//! Grid persistence: CSV and raw binary weights, PPM images.
//!
//! Formats:
//! - CSV: `HEIGHT` lines of `WIDTH` values, each value followed by a comma. The
//!   reader accepts any mix of commas and whitespace as separators and only needs
//!   the first `CELLS` values to be well-formed.
//! - Binary: `CELLS` little-endian `f32` values, row-major.
//! - PPM: binary `P6` image, each cell drawn as a `scale` x `scale` block. Negative
//!   weights tend to yellow-white, positive weights to blue.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use crate::grid::{CELLS, HEIGHT, WIDTH};
use crate::{Error, Grid, Result};

/// Color mapping for rendered grids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStyle {
    /// Pixels per cell along each axis.
    pub scale: usize,
    /// Weight magnitude mapped to full intensity; values beyond it saturate.
    pub range: f32,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            scale: 25,
            range: 10.0,
        }
    }
}

const COLOR_INTENSITY: f32 = 255.0;

/// Load a grid, choosing the format from the extension (`.bin` is binary,
/// anything else is CSV).
pub fn load<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let p = path.as_ref();
    match p.extension().and_then(|e| e.to_str()) {
        Some("bin") => load_bin(p),
        _ => load_csv(p),
    }
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let p = path.as_ref();
    let s = fs::read_to_string(p).map_err(|e| Error::io(p, e))?;
    parse_csv(&s).map_err(|e| match e {
        Error::Format(msg) => Error::Format(format!("{}: {msg}", p.display())),
        other => other,
    })
}

pub fn parse_csv(s: &str) -> Result<Grid> {
    let mut values = Vec::with_capacity(CELLS);
    let tokens = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    for (idx, token) in tokens.take(CELLS).enumerate() {
        let v: f32 = token.parse().map_err(|_| {
            Error::Format(format!("value {idx} is not a float: {token:?}"))
        })?;
        values.push(v);
    }
    if values.len() < CELLS {
        return Err(Error::Format(format!(
            "expected {CELLS} values, found {}",
            values.len()
        )));
    }
    Grid::from_flat(&values)
}

pub fn to_csv_string(grid: &Grid) -> String {
    let mut out = String::with_capacity(CELLS * 10);
    for row in grid.rows() {
        for v in row {
            // Writing into a String cannot fail.
            let _ = write!(out, "{v:.6},");
        }
        out.push('\n');
    }
    out
}

pub fn save_csv<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<()> {
    let p = path.as_ref();
    fs::write(p, to_csv_string(grid)).map_err(|e| Error::io(p, e))?;
    debug!(path = %p.display(), "saved grid as csv");
    Ok(())
}

pub fn load_bin<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let p = path.as_ref();
    let bytes = fs::read(p).map_err(|e| Error::io(p, e))?;
    decode_bin(&bytes).map_err(|e| match e {
        Error::Format(msg) => Error::Format(format!("{}: {msg}", p.display())),
        other => other,
    })
}

pub fn decode_bin(bytes: &[u8]) -> Result<Grid> {
    let needed = CELLS * size_of::<f32>();
    if bytes.len() < needed {
        return Err(Error::Format(format!(
            "expected {needed} bytes, found {}",
            bytes.len()
        )));
    }
    let values: Vec<f32> = bytes[..needed]
        .chunks_exact(size_of::<f32>())
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Grid::from_flat(&values)
}

pub fn encode_bin(grid: &Grid) -> Vec<u8> {
    grid.as_flat().iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn save_bin<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<()> {
    let p = path.as_ref();
    fs::write(p, encode_bin(grid)).map_err(|e| Error::io(p, e))?;
    debug!(path = %p.display(), "saved grid as binary");
    Ok(())
}

/// Render `grid` as a binary PPM image.
pub fn encode_ppm(grid: &Grid, style: ImageStyle) -> Vec<u8> {
    let scale = style.scale.max(1);
    let (px_w, px_h) = (WIDTH * scale, HEIGHT * scale);
    let header = format!("P6\n{px_w} {px_h} 255\n");
    let row_bytes = px_w * 3;

    let mut pixels = vec![0_u8; row_bytes * px_h];
    pixels
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(py, line)| {
            let cells = &grid.rows()[py / scale];
            for (px, pixel) in line.chunks_exact_mut(3).enumerate() {
                pixel.copy_from_slice(&color(cells[px / scale], style.range));
            }
        });

    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&pixels);
    out
}

pub fn save_ppm<P: AsRef<Path>>(grid: &Grid, path: P, style: ImageStyle) -> Result<()> {
    let p = path.as_ref();
    let file = File::create(p).map_err(|e| Error::io(p, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&encode_ppm(grid, style))
        .and_then(|()| writer.flush())
        .map_err(|e| Error::io(p, e))?;
    debug!(path = %p.display(), "saved grid as ppm");
    Ok(())
}

#[inline]
fn color(value: f32, range: f32) -> [u8; 3] {
    let s = ((value + range) / (2.0 * range)).clamp(0.0, 1.0);
    let neg = (COLOR_INTENSITY * (1.0 - s)).floor() as u8;
    let pos = (COLOR_INTENSITY * s).floor() as u8;
    [neg, neg, pos]
}

/// Receives the weight grids after every training correction.
pub trait SnapshotSink {
    fn snapshot(&mut self, hidden: &Grid, output: &Grid) -> Result<()>;
}

/// Writes `hidden_weights-NNN.ppm` / `output_weights-NNN.ppm` pairs into a
/// directory, numbering them in the order corrections happen.
#[derive(Debug, Clone)]
pub struct PpmSnapshots {
    dir: PathBuf,
    style: ImageStyle,
    count: usize,
}

impl PpmSnapshots {
    pub fn new(dir: impl Into<PathBuf>, style: ImageStyle) -> Self {
        Self {
            dir: dir.into(),
            style,
            count: 0,
        }
    }

    /// Number of snapshot pairs attempted so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl SnapshotSink for PpmSnapshots {
    fn snapshot(&mut self, hidden: &Grid, output: &Grid) -> Result<()> {
        let n = self.count;
        self.count += 1;
        save_ppm(
            hidden,
            self.dir.join(format!("hidden_weights-{n:03}.ppm")),
            self.style,
        )?;
        save_ppm(
            output,
            self.dir.join(format!("output_weights-{n:03}.ppm")),
            self.style,
        )
    }
}

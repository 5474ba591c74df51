//! TIFF export for detector arrays.
//!
//! Writes one single-frame 64-bit float grayscale TIFF per array, the way an
//! area detector's TIFF plugin emits one file per exposure. Samples are
//! stored as IEEE doubles, so the file holds the array exactly.
//!
//! # Features
//!
//! This module requires the `storage_tiff` feature (enabled by default):
//!
//! ```toml
//! [dependencies]
//! ssrl-storage = { version = "0.1", features = ["storage_tiff"] }
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ssrl_storage::tiff_writer::TiffWriter;
//!
//! let image = ndarray::Array2::<f64>::ones((512, 512)).into_dyn();
//! TiffWriter::write_array(&image, "frame_1.tiff")?;
//! ```

use anyhow::{anyhow, Result};
use ndarray::ArrayD;
use std::path::Path;

/// Whether TIFF support was compiled in.
pub const TIFF_ENABLED: bool = cfg!(feature = "storage_tiff");

/// TIFF export for detector arrays.
///
/// Arrays are interpreted as `(rows, columns)`; 1-D arrays become a single
/// row. Pixels are written in row-major order as `Gray64Float` samples.
pub struct TiffWriter;

impl TiffWriter {
    /// Write a 1-D or 2-D array as a single-frame TIFF.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The array has more than two dimensions or is empty
    /// - File cannot be created
    /// - TIFF encoding fails
    pub fn write_array<P: AsRef<Path>>(array: &ArrayD<f64>, path: P) -> Result<()> {
        let (height, width) = frame_dimensions(array)?;
        let pixels: Vec<f64> = array.iter().copied().collect();
        Self::write_frame(&pixels, width, height, path.as_ref())
    }

    /// Read a frame written by [`TiffWriter::write_array`].
    ///
    /// Returns the samples in row-major order with the `(height, width)` of
    /// the frame.
    #[cfg(feature = "storage_tiff")]
    pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, (u32, u32))> {
        use anyhow::Context;
        use std::fs::File;
        use std::io::BufReader;
        use tiff::decoder::{Decoder, DecodingResult};

        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to read TIFF header from {:?}", path))?;
        let (width, height) = decoder.dimensions()?;

        match decoder.read_image()? {
            DecodingResult::F64(samples) => Ok((samples, (height, width))),
            _ => Err(anyhow!("{:?} does not hold 64-bit float samples", path)),
        }
    }

    #[cfg(feature = "storage_tiff")]
    fn write_frame(pixels: &[f64], width: u32, height: u32, path: &Path) -> Result<()> {
        use anyhow::Context;
        use std::fs::File;
        use std::io::BufWriter;
        use tiff::encoder::{colortype, TiffEncoder};

        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file))
            .with_context(|| format!("Failed to start TIFF stream in {:?}", path))?;
        encoder
            .write_image::<colortype::Gray64Float>(width, height, pixels)
            .with_context(|| format!("Failed to encode float TIFF to {:?}", path))?;

        tracing::debug!(
            path = ?path,
            dimensions = format!("{}x{}", width, height),
            bit_depth = 64,
            "Wrote float TIFF"
        );

        Ok(())
    }

    #[cfg(not(feature = "storage_tiff"))]
    fn write_frame(_pixels: &[f64], _width: u32, _height: u32, path: &Path) -> Result<()> {
        Err(anyhow!(
            "Cannot write {:?}: built without the storage_tiff feature",
            path
        ))
    }
}

/// `(height, width)` of the frame an array maps onto.
fn frame_dimensions(array: &ArrayD<f64>) -> Result<(u32, u32)> {
    if array.is_empty() {
        return Err(anyhow!("Cannot write empty array as TIFF"));
    }
    let (rows, cols) = match array.shape() {
        [n] => (1, *n),
        [rows, cols] => (*rows, *cols),
        other => {
            return Err(anyhow!(
                "TIFF frames must be 1-D or 2-D, got {} dimensions",
                other.len()
            ))
        }
    };
    let height = u32::try_from(rows).map_err(|_| anyhow!("Frame height {rows} too large"))?;
    let width = u32::try_from(cols).map_err(|_| anyhow!("Frame width {cols} too large"))?;
    Ok((height, width))
}

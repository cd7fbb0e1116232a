//! Decoded input frame

use crate::error::CvError;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    prelude::*,
};

/// Immutable BGR, 8-bit, 3-channel image handed to the detectors.
///
/// A 0x0 frame is allowed; detectors answer it with their low-confidence
/// verdicts instead of failing.
#[derive(Debug)]
pub struct Frame {
    mat: Mat,
}

impl Frame {
    /// Wrap an existing BGR `Mat`.
    pub fn from_bgr_mat(mat: Mat) -> Result<Self> {
        if !mat.empty() && mat.typ() != CV_8UC3 {
            return Err(CvError::invalid_frame(format!(
                "expected 8-bit 3-channel BGR data, got Mat type {}",
                mat.typ()
            ))
            .into());
        }
        Ok(Self { mat })
    }

    /// Copy row-major BGR bytes into a new frame.
    pub fn from_bgr_bytes(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        Self::from_interleaved(width, height, data, false)
    }

    /// Convert an `image` crate RGB buffer, swapping channels to BGR.
    pub fn from_rgb_image(rgb_image: &image::RgbImage) -> Result<Self> {
        let (width, height) = rgb_image.dimensions();
        Self::from_interleaved(width, height, rgb_image.as_raw(), true)
    }

    pub fn empty() -> Self {
        Self {
            mat: Mat::default(),
        }
    }

    fn from_interleaved(width: u32, height: u32, data: &[u8], swap_rb: bool) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CvError::invalid_frame(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            ))
            .into());
        }
        if width == 0 || height == 0 {
            return Ok(Self::empty());
        }

        let rows = i32::try_from(height).context("frame height out of range")?;
        let cols = i32::try_from(width).context("frame width out of range")?;
        let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0))
            .context("Failed to allocate frame")?;

        let bytes = mat.data_bytes_mut()?;
        if swap_rb {
            for (dst, src) in bytes.chunks_exact_mut(3).zip(data.chunks_exact(3)) {
                dst[0] = src[2];
                dst[1] = src[1];
                dst[2] = src[0];
            }
        } else {
            bytes.copy_from_slice(data);
        }

        Ok(Self { mat })
    }

    pub fn as_mat(&self) -> &Mat {
        &self.mat
    }

    pub fn width(&self) -> i32 {
        self.mat.cols()
    }

    pub fn height(&self) -> i32 {
        self.mat.rows()
    }

    pub fn pixel_count(&self) -> usize {
        self.width().max(0) as usize * self.height().max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.mat.empty() || self.pixel_count() == 0
    }

    /// Deep copy, for handing the frame to another thread.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            mat: self.mat.try_clone()?,
        })
    }
}

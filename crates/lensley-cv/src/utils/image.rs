//! Image processing utilities shared by the detectors

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat, Rect, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
};

/// Thin wrappers over the OpenCV calls every detector needs
pub struct ImageUtils;

impl ImageUtils {
    /// BGR to single-channel grayscale
    pub fn to_grayscale(bgr: &Mat) -> Result<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color_def(bgr, &mut gray, imgproc::COLOR_BGR2GRAY)
            .context("Failed to convert image to grayscale")?;
        Ok(gray)
    }

    /// BGR to 8-bit HSV (H in [0, 180), S and V in [0, 255])
    pub fn to_hsv(bgr: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(bgr, &mut hsv, imgproc::COLOR_BGR2HSV)
            .context("Failed to convert image to HSV")?;
        Ok(hsv)
    }

    /// Owned copy of a sub-rectangle
    pub fn crop(image: &Mat, rect: Rect) -> Result<Mat> {
        let view = Mat::roi(image, rect)
            .with_context(|| format!("Failed to take ROI {:?}", rect))?;
        Ok(view.try_clone()?)
    }

    /// Pixels strictly above `threshold` become 255, the rest 0
    pub fn binarize(gray: &Mat, threshold: f64) -> Result<Mat> {
        let mut binary = Mat::default();
        imgproc::threshold(gray, &mut binary, threshold, 255.0, imgproc::THRESH_BINARY)
            .context("Binary threshold failed")?;
        Ok(binary)
    }

    /// Resize by `factor` on both axes with bicubic interpolation
    pub fn upscale_cubic(image: &Mat, factor: f64) -> Result<Mat> {
        let mut scaled = Mat::default();
        imgproc::resize(
            image,
            &mut scaled,
            Size::default(),
            factor,
            factor,
            imgproc::INTER_CUBIC,
        )
        .context("Resize failed")?;
        Ok(scaled)
    }

    /// Fraction of non-zero pixels in a single-channel mask
    pub fn nonzero_ratio(mask: &Mat) -> Result<f64> {
        let total = mask.total();
        if mask.empty() || total == 0 {
            return Ok(0.0);
        }
        let hits = core::count_non_zero(mask).context("count_non_zero failed")?;
        Ok(hits as f64 / total as f64)
    }

    /// Encode as PNG bytes
    pub fn encode_png(image: &Mat) -> Result<Vec<u8>> {
        let mut buf = Vector::<u8>::new();
        imgcodecs::imencode(".png", image, &mut buf, &Vector::new())
            .context("Failed to encode PNG")?;
        Ok(buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1, CV_8UC3};

    #[test]
    fn test_grayscale_and_crop() -> Result<()> {
        let bgr = Mat::new_rows_cols_with_default(40, 60, CV_8UC3, Scalar::new(10.0, 20.0, 30.0, 0.0))?;
        let gray = ImageUtils::to_grayscale(&bgr)?;
        assert_eq!(gray.channels(), 1);

        let crop = ImageUtils::crop(&gray, Rect::new(30, 0, 30, 22))?;
        assert_eq!((crop.cols(), crop.rows()), (30, 22));
        Ok(())
    }

    #[test]
    fn test_binarize_and_ratio() -> Result<()> {
        let mut gray = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(100.0))?;
        imgproc::rectangle(
            &mut gray,
            Rect::new(0, 0, 10, 5),
            Scalar::all(220.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let binary = ImageUtils::binarize(&gray, 170.0)?;
        assert!((ImageUtils::nonzero_ratio(&binary)? - 0.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_ratio_of_empty_mask_is_zero() -> Result<()> {
        assert_eq!(ImageUtils::nonzero_ratio(&Mat::default())?, 0.0);
        Ok(())
    }

    #[test]
    fn test_upscale_doubles_size() -> Result<()> {
        let gray = Mat::new_rows_cols_with_default(12, 7, CV_8UC1, Scalar::all(50.0))?;
        let scaled = ImageUtils::upscale_cubic(&gray, 2.0)?;
        assert_eq!((scaled.cols(), scaled.rows()), (14, 24));
        Ok(())
    }

    #[test]
    fn test_encode_png_signature() -> Result<()> {
        let gray = Mat::new_rows_cols_with_default(4, 4, CV_8UC1, Scalar::all(0.0))?;
        let png = ImageUtils::encode_png(&gray)?;
        assert_eq!(&png[..4], b"\x89PNG");
        Ok(())
    }
}

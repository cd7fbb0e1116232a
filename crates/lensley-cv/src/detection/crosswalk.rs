//! Crosswalk detection from painted stripes

use super::config::CrosswalkConfig;
use crate::bbox::{BBox, BBoxCollection};
use crate::frame::Frame;
use crate::traits::Detector;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use lensley_core::DetectionValue;
use opencv::{
    core::{Mat, Point, Size, Vector},
    imgproc,
};
use tracing::debug;

/// Finds bright, wide, short blobs and scores how much they look like a
/// zebra crossing.
pub struct CrosswalkDetector {
    config: CrosswalkConfig,
}

impl CrosswalkDetector {
    pub fn new(config: CrosswalkConfig) -> Self {
        Self { config }
    }

    /// Bright-region mask after blur, threshold and a stripe-shaped opening
    fn stripe_mask(&self, frame: &Frame) -> Result<Mat> {
        let gray = ImageUtils::to_grayscale(frame.as_mat())?;

        let (kw, kh) = self.config.blur_kernel;
        let mut blurred = Mat::default();
        imgproc::gaussian_blur_def(&gray, &mut blurred, Size::new(kw, kh), 0.0)
            .context("Gaussian blur failed")?;

        let binary = ImageUtils::binarize(&blurred, self.config.binary_threshold)?;

        let (ow, oh) = self.config.open_kernel;
        let kernel = imgproc::get_structuring_element_def(imgproc::MORPH_RECT, Size::new(ow, oh))?;
        let mut cleaned = Mat::default();
        imgproc::morphology_ex_def(&binary, &mut cleaned, imgproc::MORPH_OPEN, &kernel)
            .context("Morphological opening failed")?;

        Ok(cleaned)
    }

    /// Bounding boxes of external contours that pass the noise floor
    fn blobs(&self, mask: &Mat) -> Result<BBoxCollection> {
        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours_def(
            mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
        )
        .context("find_contours failed")?;

        let mut blobs = BBoxCollection::new();
        for contour in contours.iter() {
            let bbox = BBox::from_rect(imgproc::bounding_rect(&contour)?);
            if bbox.area() >= self.config.min_blob_area {
                blobs.push(bbox);
            }
        }
        Ok(blobs)
    }

    fn is_stripe(&self, bbox: &BBox) -> bool {
        let (min_h, max_h) = self.config.stripe_height_range;
        bbox.aspect_ratio() > self.config.min_aspect_ratio
            && (min_h..=max_h).contains(&bbox.height)
    }

    /// Weighted score from stripe count and how uniform the stripes are
    pub fn score(&self, stripes: &BBoxCollection) -> f64 {
        let density = (stripes.len() as f64 / self.config.saturation_count).min(1.0);
        let width_consistency = 1.0 - stripes.width_stats().dispersion();
        let height_consistency = 1.0 - stripes.height_stats().dispersion();

        self.config.density_weight * density
            + self.config.width_consistency_weight * width_consistency
            + self.config.height_consistency_weight * height_consistency
    }

    /// Verdict for an already extracted set of stripes
    pub fn classify(&self, stripes: &BBoxCollection) -> DetectionValue<bool> {
        if stripes.is_empty() {
            return self.fallback();
        }
        let verdict = DetectionValue::new(false, self.score(stripes));
        let is_crosswalk = verdict.confidence() > self.config.decision_threshold;
        verdict.map(|_| is_crosswalk)
    }
}

impl Detector for CrosswalkDetector {
    type Output = DetectionValue<bool>;

    fn name(&self) -> &'static str {
        "crosswalk"
    }

    fn detect(&self, frame: &Frame) -> Result<Self::Output> {
        if frame.is_empty() {
            return Ok(self.fallback());
        }

        let mask = self.stripe_mask(frame)?;
        let blobs = self.blobs(&mask)?;
        let blob_count = blobs.len();
        let stripes = blobs.filter(|b| self.is_stripe(b));

        let verdict = self.classify(&stripes);
        debug!(
            blobs = blob_count,
            stripes = stripes.len(),
            conf = verdict.confidence(),
            "crosswalk scored"
        );
        Ok(verdict)
    }

    fn fallback(&self) -> Self::Output {
        DetectionValue::new(false, self.config.no_stripes_confidence)
    }
}

impl Default for CrosswalkDetector {
    fn default() -> Self {
        Self::new(CrosswalkConfig::default())
    }
}

//! Pedestrian signal state from color coverage

use super::config::{HsvBand, SignalConfig};
use crate::frame::Frame;
use crate::traits::Detector;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use lensley_core::{DetectionValue, SignalState};
use opencv::core::{self, Mat, Scalar};
use tracing::debug;

/// Fraction of frame pixels falling in the red and walk color bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCoverage {
    pub red_ratio: f64,
    pub walk_ratio: f64,
}

/// Picks STOP or WALK by which signal color covers more of the frame.
pub struct SignalDetector {
    config: SignalConfig,
}

impl SignalDetector {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Union of `in_range` masks over all bands
    fn band_mask(hsv: &Mat, bands: &[HsvBand]) -> Result<Mat> {
        let mut union: Option<Mat> = None;
        for band in bands {
            let lower = Scalar::new(band.lower[0] as f64, band.lower[1] as f64, band.lower[2] as f64, 0.0);
            let upper = Scalar::new(band.upper[0] as f64, band.upper[1] as f64, band.upper[2] as f64, 0.0);
            let mut mask = Mat::default();
            core::in_range(hsv, &lower, &upper, &mut mask).context("in_range failed")?;

            union = Some(match union {
                None => mask,
                Some(acc) => {
                    let mut merged = Mat::default();
                    core::bitwise_or_def(&acc, &mask, &mut merged)?;
                    merged
                }
            });
        }
        Ok(union.unwrap_or_default())
    }

    pub fn coverage(&self, frame: &Frame) -> Result<ColorCoverage> {
        if frame.is_empty() {
            return Ok(ColorCoverage {
                red_ratio: 0.0,
                walk_ratio: 0.0,
            });
        }

        let hsv = ImageUtils::to_hsv(frame.as_mat())?;
        let red = Self::band_mask(&hsv, &self.config.red_bands)?;
        let walk = Self::band_mask(&hsv, &self.config.walk_bands)?;

        Ok(ColorCoverage {
            red_ratio: ImageUtils::nonzero_ratio(&red)?,
            walk_ratio: ImageUtils::nonzero_ratio(&walk)?,
        })
    }

    /// Verdict for measured coverage. Ties go to WALK.
    pub fn classify(&self, coverage: ColorCoverage) -> DetectionValue<SignalState> {
        let ColorCoverage {
            red_ratio,
            walk_ratio,
        } = coverage;

        if red_ratio.max(walk_ratio) < self.config.noise_floor {
            return self.fallback();
        }

        let (state, ratio, sensitivity) = if red_ratio > walk_ratio {
            (SignalState::Stop, red_ratio, self.config.red_sensitivity)
        } else {
            (SignalState::Walk, walk_ratio, self.config.walk_sensitivity)
        };

        let raw = DetectionValue::new(state, (ratio * sensitivity).min(1.0));
        let confidence = raw.confidence().max(self.config.min_confidence);
        raw.with_confidence(confidence)
    }
}

impl Detector for SignalDetector {
    type Output = DetectionValue<SignalState>;

    fn name(&self) -> &'static str {
        "signal"
    }

    fn detect(&self, frame: &Frame) -> Result<Self::Output> {
        let coverage = self.coverage(frame)?;
        let verdict = self.classify(coverage);
        debug!(
            red_ratio = coverage.red_ratio,
            walk_ratio = coverage.walk_ratio,
            state = %verdict.value,
            conf = verdict.confidence(),
            "signal classified"
        );
        Ok(verdict)
    }

    fn fallback(&self) -> Self::Output {
        DetectionValue::new(SignalState::Unknown, self.config.unknown_confidence)
    }
}

impl Default for SignalDetector {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}

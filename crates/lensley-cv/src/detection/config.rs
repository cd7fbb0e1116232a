//! Detection configuration
//!
//! Every threshold the detectors use lives here. The defaults are the
//! empirically tuned values; a JSON file can override any subset.

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main detection configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub crosswalk: CrosswalkConfig,
    pub signal: SignalConfig,
    pub timer: TimerConfig,
    pub ocr: OcrConfig,
}

impl DetectionConfig {
    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid config: {:?}", path))
    }

    /// Same thresholds, OCR switched off.
    pub fn without_ocr() -> Self {
        let mut config = Self::default();
        config.ocr.enabled = false;
        config
    }
}

/// Crosswalk stripe detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosswalkConfig {
    pub blur_kernel: (i32, i32),
    pub binary_threshold: f64,
    /// Opening element (width, height); much wider than tall
    pub open_kernel: (i32, i32),
    pub min_blob_area: i64,
    pub min_aspect_ratio: f64,
    pub stripe_height_range: (i32, i32), // (min, max), inclusive
    /// Stripe count that saturates the density term
    pub saturation_count: f64,
    pub density_weight: f64,
    pub width_consistency_weight: f64,
    pub height_consistency_weight: f64,
    pub decision_threshold: f64,
    pub no_stripes_confidence: f64,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            blur_kernel: (5, 5),
            binary_threshold: 170.0,
            open_kernel: (7, 3),
            min_blob_area: 250,
            min_aspect_ratio: 2.0,
            stripe_height_range: (6, 80),
            saturation_count: 8.0,
            density_weight: 0.55,
            width_consistency_weight: 0.25,
            height_consistency_weight: 0.20,
            decision_threshold: 0.45,
            no_stripes_confidence: 0.15,
        }
    }
}

/// Inclusive 8-bit HSV range as OpenCV stores it (hue in [0, 180))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }
}

/// Pedestrian signal color classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Red wraps around hue 0, so it takes several bands
    pub red_bands: Vec<HsvBand>,
    pub walk_bands: Vec<HsvBand>,
    pub noise_floor: f64,
    pub red_sensitivity: f64,
    pub walk_sensitivity: f64,
    pub min_confidence: f64,
    pub unknown_confidence: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            red_bands: vec![
                HsvBand::new([0, 90, 70], [12, 255, 255]),
                HsvBand::new([165, 90, 70], [180, 255, 255]),
            ],
            walk_bands: vec![HsvBand::new([35, 55, 120], [90, 255, 255])],
            noise_floor: 0.001,
            red_sensitivity: 45.0,
            walk_sensitivity: 35.0,
            min_confidence: 0.35,
            unknown_confidence: 0.2,
        }
    }
}

/// Countdown timer presence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// ROI as fractions of the frame: rows [0, roi_bottom), cols [roi_left, 1)
    pub roi_bottom: f64,
    pub roi_left: f64,
    pub canny_low: f64,
    pub canny_high: f64,
    pub edge_ratio_threshold: f64,
    pub base_confidence: f64,
    pub edge_gain: f64,
    pub max_edge_bonus: f64,
    /// Presence confidence floor once digits were read
    pub read_confidence_floor: f64,
    pub empty_roi_confidence: f64,
    /// Timer value confidence cap when no digits were read
    pub unread_value_cap: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            roi_bottom: 0.55,
            roi_left: 0.45,
            canny_low: 80.0,
            canny_high: 180.0,
            edge_ratio_threshold: 0.07,
            base_confidence: 0.35,
            edge_gain: 2.5,
            max_edge_bonus: 0.55,
            read_confidence_floor: 0.7,
            empty_roi_confidence: 0.2,
            unread_value_cap: 0.3,
        }
    }
}

/// Optional digit recognition on the timer ROI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub enabled: bool,
    /// Tesseract executable, looked up on PATH when relative
    pub binary: PathBuf,
    pub timeout_ms: u64,
    /// Tesseract page segmentation mode; 7 treats the image as one text line
    pub page_seg_mode: u8,
    pub upscale: f64,
    pub binarize_threshold: f64,
    pub whitelist: String,
    pub unavailable_confidence: f64,
    pub no_token_confidence: f64,
    pub value_confidence: f64,
    pub zero_confidence: f64,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "tesseract".into(),
            timeout_ms: 2000,
            page_seg_mode: 7,
            upscale: 2.0,
            binarize_threshold: 140.0,
            whitelist: "0123456789".into(),
            unavailable_confidence: 0.1,
            no_token_confidence: 0.25,
            value_confidence: 0.55,
            zero_confidence: 0.45,
        }
    }
}

//! Lensley Computer Vision Library
//!
//! Heuristic OpenCV detectors that classify a single crossing-scene frame:
//! crosswalk stripes, pedestrian signal color, countdown timer presence and
//! (when an OCR engine is installed) the timer's digits.

pub mod bbox;
pub mod detection;
pub mod error;
pub mod frame;
pub mod ocr;
pub mod utils;

// Re-export commonly used types
pub use bbox::{BBox, BBoxCollection};
pub use detection::{DetectionConfig, InferencePipeline};
pub use error::CvError;
pub use frame::Frame;
pub use lensley_core::{DetectionValue, InferenceResult, SignalState};
pub use ocr::{DigitRecognizer, TesseractCli, TimerReading, TimerValueReader};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;

    /// A stateless component computing one attribute of a frame.
    pub trait Detector {
        type Output;

        /// Short name used in logs.
        fn name(&self) -> &'static str;

        /// Run the heuristic. Errors only come from the OpenCV backend.
        fn detect(&self, frame: &Frame) -> Result<Self::Output>;

        /// Low-confidence verdict reported when `detect` fails.
        fn fallback(&self) -> Self::Output;

        /// `detect`, degrading to `fallback` on backend errors.
        fn detect_or_fallback(&self, frame: &Frame) -> Self::Output {
            self.detect(frame).unwrap_or_else(|e| {
                tracing::warn!(detector = self.name(), error = %e, "detector failed, using fallback");
                self.fallback()
            })
        }
    }
}

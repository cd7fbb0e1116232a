//! Inference aggregator: runs every detector on one frame

use super::config::DetectionConfig;
use super::crosswalk::CrosswalkDetector;
use super::signal::SignalDetector;
use super::timer::{TimerDetection, TimerDetector};
use crate::frame::Frame;
use crate::ocr::{DigitRecognizer, TimerValueReader};
use crate::traits::Detector;
use lensley_core::{DetectionValue, InferenceResult, SignalState};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Stateless pipeline; one instance can serve any number of frames.
pub struct InferencePipeline {
    crosswalk: CrosswalkDetector,
    signal: SignalDetector,
    timer: TimerDetector,
    unread_value_cap: f64,
}

impl InferencePipeline {
    /// Build the pipeline, probing for the OCR engine once.
    pub fn new(config: DetectionConfig) -> Self {
        let reader = TimerValueReader::detect(config.ocr.clone());
        Self::from_parts(config, reader)
    }

    /// Build the pipeline around an explicit recognizer capability.
    pub fn with_recognizer(
        config: DetectionConfig,
        recognizer: Option<Arc<dyn DigitRecognizer>>,
    ) -> Self {
        let reader = TimerValueReader::new(config.ocr.clone(), recognizer);
        Self::from_parts(config, reader)
    }

    fn from_parts(config: DetectionConfig, reader: TimerValueReader) -> Self {
        Self {
            crosswalk: CrosswalkDetector::new(config.crosswalk),
            signal: SignalDetector::new(config.signal),
            unread_value_cap: config.timer.unread_value_cap,
            timer: TimerDetector::new(config.timer, reader),
        }
    }

    pub fn ocr_available(&self) -> bool {
        self.timer.reader().is_available()
    }

    /// Classify one frame. Always returns a verdict for every attribute.
    pub fn infer(&self, frame: &Frame) -> InferenceResult {
        let start_time = Instant::now();

        let (is_crosswalk, signal_state, timer) = self.run_detectors(frame);
        let result = self.assemble(is_crosswalk, signal_state, timer);

        debug!(
            width = frame.width(),
            height = frame.height(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "frame classified"
        );
        result
    }

    #[cfg(not(feature = "parallel"))]
    fn run_detectors(
        &self,
        frame: &Frame,
    ) -> (DetectionValue<bool>, DetectionValue<SignalState>, TimerDetection) {
        (
            self.crosswalk.detect_or_fallback(frame),
            self.signal.detect_or_fallback(frame),
            self.timer.detect_or_fallback(frame),
        )
    }

    /// Detectors share nothing, so each branch gets its own copy of the frame.
    #[cfg(feature = "parallel")]
    fn run_detectors(
        &self,
        frame: &Frame,
    ) -> (DetectionValue<bool>, DetectionValue<SignalState>, TimerDetection) {
        let copies = || -> crate::Result<[Frame; 3]> {
            Ok([frame.try_clone()?, frame.try_clone()?, frame.try_clone()?])
        };
        let [crosswalk_frame, signal_frame, timer_frame] = match copies() {
            Ok(copies) => copies,
            Err(e) => {
                tracing::warn!(error = %e, "frame copy failed, running detectors sequentially");
                return (
                    self.crosswalk.detect_or_fallback(frame),
                    self.signal.detect_or_fallback(frame),
                    self.timer.detect_or_fallback(frame),
                );
            }
        };

        let (timer, (is_crosswalk, signal_state)) = rayon::join(
            move || self.timer.detect_or_fallback(&timer_frame),
            move || {
                rayon::join(
                    move || self.crosswalk.detect_or_fallback(&crosswalk_frame),
                    move || self.signal.detect_or_fallback(&signal_frame),
                )
            },
        );
        (is_crosswalk, signal_state, timer)
    }

    /// Cap the timer value confidence when no digits were read.
    fn assemble(
        &self,
        is_crosswalk: DetectionValue<bool>,
        signal_state: DetectionValue<SignalState>,
        timer: TimerDetection,
    ) -> InferenceResult {
        let timer_value = if timer.timer_value.is_absent() {
            let capped = timer.timer_value.confidence().min(self.unread_value_cap);
            timer.timer_value.with_confidence(capped)
        } else {
            timer.timer_value
        };

        InferenceResult {
            is_crosswalk,
            signal_state,
            has_timer: timer.has_timer,
            timer_value,
        }
    }
}

impl Default for InferencePipeline {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use opencv::core::{Mat, Scalar, CV_8UC3};

    struct Reads(&'static str);

    impl DigitRecognizer for Reads {
        fn recognize(&self, _image: &Mat) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn gray_frame() -> Result<Frame> {
        Frame::from_bgr_mat(Mat::new_rows_cols_with_default(90, 120, CV_8UC3, Scalar::all(128.0))?)
    }

    #[test]
    fn test_blank_frame_without_ocr() -> Result<()> {
        let pipeline = InferencePipeline::with_recognizer(DetectionConfig::default(), None);
        assert!(!pipeline.ocr_available());

        let result = pipeline.infer(&gray_frame()?);
        assert_eq!(result.is_crosswalk, DetectionValue::new(false, 0.15));
        assert_eq!(result.signal_state, DetectionValue::new(SignalState::Unknown, 0.2));
        assert_eq!(result.has_timer, DetectionValue::new(false, 0.35));
        assert_eq!(result.timer_value, DetectionValue::absent(0.1));
        Ok(())
    }

    #[test]
    fn test_unread_value_is_capped() -> Result<()> {
        let pipeline = InferencePipeline::with_recognizer(
            DetectionConfig::default(),
            Some(Arc::new(Reads("no digits here"))),
        );
        let result = pipeline.infer(&gray_frame()?);
        assert_eq!(result.timer_value, DetectionValue::absent(0.25));

        let mut config = DetectionConfig::default();
        config.ocr.no_token_confidence = 0.6;
        let pipeline = InferencePipeline::with_recognizer(config, Some(Arc::new(Reads("x"))));
        assert_eq!(pipeline.infer(&gray_frame()?).timer_value, DetectionValue::absent(0.3));
        Ok(())
    }

    #[test]
    fn test_read_value_is_kept() -> Result<()> {
        let pipeline =
            InferencePipeline::with_recognizer(DetectionConfig::default(), Some(Arc::new(Reads("9"))));
        let result = pipeline.infer(&gray_frame()?);
        assert_eq!(result.timer_value, DetectionValue::new(Some(9), 0.55));
        assert!(result.has_timer.value);
        Ok(())
    }

    #[test]
    fn test_empty_frame_is_fully_populated() {
        let pipeline = InferencePipeline::with_recognizer(DetectionConfig::default(), None);
        let result = pipeline.infer(&Frame::empty());
        assert!(!result.is_crosswalk.value);
        assert_eq!(result.signal_state.value, SignalState::Unknown);
        assert_eq!(result.has_timer, DetectionValue::new(false, 0.2));
        assert_eq!(result.timer_value, DetectionValue::absent(0.2));
    }
}

//! Countdown digit reading
//!
//! Recognition is optional: the reader is built once with or without a
//! recognizer, and every failure along the way collapses into an explicit
//! [`TimerReading`] instead of an error.

pub mod tesseract;

pub use tesseract::TesseractCli;

use crate::detection::config::OcrConfig;
use crate::utils::ImageUtils;
use crate::Result;
use lensley_core::DetectionValue;
use opencv::core::Mat;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

static DIGIT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{1,2})\b").expect("digit token pattern is valid"));

/// Turns a preprocessed single-channel image into text.
pub trait DigitRecognizer: Send + Sync {
    fn recognize(&self, image: &Mat) -> Result<String>;
}

/// Outcome of one read attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerReading {
    /// No recognizer installed, or it failed or timed out
    Unavailable,
    /// Recognizer ran but produced no usable 1-2 digit token
    NoToken,
    Value(u8),
}

impl TimerReading {
    pub fn value(&self) -> Option<u8> {
        match self {
            TimerReading::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// First standalone 1-2 digit token in `text`, if it is in `0..=99`.
pub fn parse_timer_token(text: &str) -> Option<u8> {
    let token = DIGIT_TOKEN.captures(text)?.get(1)?;
    token.as_str().parse::<u8>().ok().filter(|v| *v <= 99)
}

pub struct TimerValueReader {
    config: OcrConfig,
    recognizer: Option<Arc<dyn DigitRecognizer>>,
}

impl TimerValueReader {
    pub fn new(config: OcrConfig, recognizer: Option<Arc<dyn DigitRecognizer>>) -> Self {
        Self { config, recognizer }
    }

    /// Reader with the local Tesseract install, when enabled and present.
    pub fn detect(config: OcrConfig) -> Self {
        let recognizer: Option<Arc<dyn DigitRecognizer>> = if config.enabled {
            match TesseractCli::probe(&config) {
                Some(cli) => {
                    info!(binary = ?config.binary, "digit recognition available");
                    Some(Arc::new(cli))
                }
                None => {
                    info!(binary = ?config.binary, "digit recognition unavailable, timer values will be absent");
                    None
                }
            }
        } else {
            debug!("digit recognition disabled by config");
            None
        };
        Self::new(config, recognizer)
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Read the countdown from a grayscale ROI.
    pub fn read(&self, gray_roi: &Mat) -> TimerReading {
        let Some(recognizer) = &self.recognizer else {
            return TimerReading::Unavailable;
        };

        match self.recognize(recognizer.as_ref(), gray_roi) {
            Ok(text) => {
                let reading = parse_timer_token(&text).map_or(TimerReading::NoToken, TimerReading::Value);
                debug!(text = text.trim(), ?reading, "timer digits recognized");
                reading
            }
            Err(e) => {
                warn!(error = %e, "digit recognition failed");
                TimerReading::Unavailable
            }
        }
    }

    fn recognize(&self, recognizer: &dyn DigitRecognizer, gray_roi: &Mat) -> Result<String> {
        let scaled = ImageUtils::upscale_cubic(gray_roi, self.config.upscale)?;
        let binary = ImageUtils::binarize(&scaled, self.config.binarize_threshold)?;
        recognizer.recognize(&binary)
    }

    pub fn to_detection(&self, reading: TimerReading) -> DetectionValue<Option<u8>> {
        match reading {
            TimerReading::Unavailable => DetectionValue::absent(self.config.unavailable_confidence),
            TimerReading::NoToken => DetectionValue::absent(self.config.no_token_confidence),
            TimerReading::Value(0) => DetectionValue::new(Some(0), self.config.zero_confidence),
            TimerReading::Value(v) => DetectionValue::new(Some(v), self.config.value_confidence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CvError;
    use opencv::core::{Scalar, CV_8UC1};

    struct FixedText(&'static str);

    impl DigitRecognizer for FixedText {
        fn recognize(&self, _image: &Mat) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl DigitRecognizer for Broken {
        fn recognize(&self, _image: &Mat) -> Result<String> {
            Err(CvError::RecognizerFailed("engine crashed".into()).into())
        }
    }

    fn roi() -> Mat {
        Mat::new_rows_cols_with_default(20, 30, CV_8UC1, Scalar::all(0.0)).unwrap()
    }

    fn reader(recognizer: impl DigitRecognizer + 'static) -> TimerValueReader {
        TimerValueReader::new(OcrConfig::default(), Some(Arc::new(recognizer)))
    }

    #[test]
    fn test_parse_timer_token() {
        assert_eq!(parse_timer_token("17\n"), Some(17));
        assert_eq!(parse_timer_token(" 5 "), Some(5));
        assert_eq!(parse_timer_token("00"), Some(0));
        assert_eq!(parse_timer_token("123 45"), Some(45));
        assert_eq!(parse_timer_token("1234"), None);
        assert_eq!(parse_timer_token(""), None);
        assert_eq!(parse_timer_token("\u{c}"), None);
    }

    #[test]
    fn test_without_recognizer() {
        let reader = TimerValueReader::new(OcrConfig::default(), None);
        assert!(!reader.is_available());
        let reading = reader.read(&roi());
        assert_eq!(reading, TimerReading::Unavailable);
        assert_eq!(reader.to_detection(reading), DetectionValue::absent(0.1));
    }

    #[test]
    fn test_disabled_config_skips_probe() {
        let mut config = OcrConfig::default();
        config.enabled = false;
        assert!(!TimerValueReader::detect(config).is_available());
    }

    #[test]
    fn test_value_confidences() {
        let reader = reader(FixedText("42"));
        let reading = reader.read(&roi());
        assert_eq!(reading, TimerReading::Value(42));
        assert_eq!(reader.to_detection(reading), DetectionValue::new(Some(42), 0.55));
        assert_eq!(
            reader.to_detection(TimerReading::Value(0)),
            DetectionValue::new(Some(0), 0.45)
        );
    }

    #[test]
    fn test_no_token() {
        let reader = reader(FixedText("--:--"));
        let reading = reader.read(&roi());
        assert_eq!(reading, TimerReading::NoToken);
        assert_eq!(reader.to_detection(reading), DetectionValue::absent(0.25));
    }

    #[test]
    fn test_recognizer_failure_is_unavailable() {
        let reader = reader(Broken);
        assert_eq!(reader.read(&roi()), TimerReading::Unavailable);
    }
}

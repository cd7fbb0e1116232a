//! Detector verdicts

mod result;
mod signal;

pub use result::InferenceResult;
pub use signal::{ParseSignalStateError, SignalState};

use crate::confidence::clamp_confidence;
use serde::Serialize;

/// One detector's verdict: a value and how much the heuristic trusts it.
///
/// The confidence is clamped on construction, so every `DetectionValue`
/// reports a confidence in `[0.0, 0.99]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionValue<T> {
    pub value: T,
    #[serde(rename = "conf")]
    confidence: f64,
}

impl<T> DetectionValue<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Keep the value, replace the confidence (clamped again).
    pub fn with_confidence(self, confidence: f64) -> Self {
        Self::new(self.value, confidence)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DetectionValue<U> {
        DetectionValue::new(f(self.value), self.confidence)
    }
}

impl<T> DetectionValue<Option<T>> {
    /// Verdict with no value.
    pub fn absent(confidence: f64) -> Self {
        Self::new(None, confidence)
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(DetectionValue::new(true, 1.0).confidence(), 0.99);
        assert_eq!(DetectionValue::new(true, -0.2).confidence(), 0.0);
        assert_eq!(DetectionValue::new(false, 0.15).confidence(), 0.15);
        assert_eq!(DetectionValue::new(1u8, 0.5).with_confidence(3.0).confidence(), 0.99);
    }

    #[test]
    fn test_absent() {
        let value = DetectionValue::<Option<u8>>::absent(0.1);
        assert!(value.is_absent());
        assert_eq!(value.confidence(), 0.1);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(DetectionValue::new(Some(12u8), 0.55)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": 12, "conf": 0.55 }));

        let json = serde_json::to_value(DetectionValue::<Option<u8>>::absent(0.25)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": null, "conf": 0.25 }));
    }
}

// tests/core_tests.rs
use lensley_core::{
    confidence::{MAX_CONFIDENCE, MIN_CONFIDENCE},
    clamp_confidence, DetectionValue, InferenceResult, SignalState,
};

fn sample_result() -> InferenceResult {
    InferenceResult {
        is_crosswalk: DetectionValue::new(true, 0.82),
        signal_state: DetectionValue::new(SignalState::Walk, 0.35),
        has_timer: DetectionValue::new(true, 0.7),
        timer_value: DetectionValue::new(Some(14), 0.55),
    }
}

#[test]
fn test_normalizer_properties() {
    let mut previous = f64::NEG_INFINITY;
    for step in -200..=300 {
        let x = step as f64 / 100.0;
        let y = clamp_confidence(x);
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&y));
        assert!(y >= previous);
        assert_eq!(clamp_confidence(y), y);
        previous = y;
    }
}

#[test]
fn test_confidence_never_reaches_certainty() {
    let value = DetectionValue::new(SignalState::Stop, 45.0);
    assert!(value.confidence() < 1.0);
}

#[test]
fn test_wire_shape() {
    let json = serde_json::to_value(sample_result()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "is_crosswalk": { "value": true, "conf": 0.82 },
            "signal_state": { "value": "WALK", "conf": 0.35 },
            "has_timer": { "value": true, "conf": 0.7 },
            "timer_value": { "value": 14, "conf": 0.55 },
        })
    );
}

#[test]
fn test_absent_timer_serializes_null() {
    let mut result = sample_result();
    result.timer_value = DetectionValue::absent(0.1);
    let json = serde_json::to_value(result).unwrap();
    assert!(json["timer_value"]["value"].is_null());
    assert_eq!(json["timer_value"]["conf"], 0.1);
}

#[test]
fn test_confidences_in_field_order() {
    assert_eq!(sample_result().confidences(), [0.82, 0.35, 0.7, 0.55]);
}

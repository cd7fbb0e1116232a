//! Confidence normalization

/// Lowest confidence a detector may report.
pub const MIN_CONFIDENCE: f64 = 0.0;

/// Highest confidence a detector may report. Heuristics never claim certainty.
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Clamp a raw score into `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.
///
/// NaN maps to `MIN_CONFIDENCE`.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_CONFIDENCE;
    }
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 11] = [
        f64::NEG_INFINITY,
        -12.0,
        -0.0001,
        0.0,
        0.15,
        0.45,
        0.98999,
        0.99,
        1.0,
        37.5,
        f64::INFINITY,
    ];

    #[test]
    fn test_output_in_range() {
        for value in SAMPLES {
            let clamped = clamp_confidence(value);
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&clamped), "{value} -> {clamped}");
        }
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_monotonic() {
        for pair in SAMPLES.windows(2) {
            assert!(clamp_confidence(pair[0]) <= clamp_confidence(pair[1]));
        }
    }

    #[test]
    fn test_idempotent() {
        for value in SAMPLES {
            let once = clamp_confidence(value);
            assert_eq!(clamp_confidence(once), once);
        }
    }

    #[test]
    fn test_passthrough_inside_range() {
        assert_eq!(clamp_confidence(0.35), 0.35);
        assert_eq!(clamp_confidence(1.0), 0.99);
        assert_eq!(clamp_confidence(-1.0), 0.0);
    }
}

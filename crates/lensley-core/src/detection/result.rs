use super::{DetectionValue, SignalState};
use serde::Serialize;

/// Everything the pipeline says about one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceResult {
    pub is_crosswalk: DetectionValue<bool>,
    pub signal_state: DetectionValue<SignalState>,
    pub has_timer: DetectionValue<bool>,
    pub timer_value: DetectionValue<Option<u8>>,
}

impl InferenceResult {
    /// Confidences in field order.
    pub fn confidences(&self) -> [f64; 4] {
        [
            self.is_crosswalk.confidence(),
            self.signal_state.confidence(),
            self.has_timer.confidence(),
            self.timer_value.confidence(),
        ]
    }
}

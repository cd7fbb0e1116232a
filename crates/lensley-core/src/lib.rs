//! Data model shared by the Lensley detectors.
//!
//! Nothing in here touches pixels: detectors in `lensley-cv` produce these
//! values and the front end serializes them.

pub mod confidence;
pub mod detection;

pub use confidence::clamp_confidence;
pub use detection::{DetectionValue, InferenceResult, ParseSignalStateError, SignalState};

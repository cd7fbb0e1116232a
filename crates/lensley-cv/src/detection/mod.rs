//! High-level detection module

pub mod config;
pub mod crosswalk;
pub mod pipeline;
pub mod signal;
pub mod timer;

pub use config::DetectionConfig;
pub use crosswalk::CrosswalkDetector;
pub use pipeline::InferencePipeline;
pub use signal::{ColorCoverage, SignalDetector};
pub use timer::{TimerDetection, TimerDetector};

//! Typed failures

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CvError {
    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("digit recognizer timed out after {0:?}")]
    RecognizerTimeout(Duration),

    #[error("digit recognizer failed: {0}")]
    RecognizerFailed(String),

    #[error("digit recognizer i/o error")]
    RecognizerIo(#[from] std::io::Error),
}

impl CvError {
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        CvError::InvalidFrame {
            reason: reason.into(),
        }
    }
}

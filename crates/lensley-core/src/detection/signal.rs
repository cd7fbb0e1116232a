use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pedestrian signal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalState {
    Stop,
    Walk,
    Unknown,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Stop => "STOP",
            SignalState::Walk => "WALK",
            SignalState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown signal state: {0:?}")]
pub struct ParseSignalStateError(String);

impl FromStr for SignalState {
    type Err = ParseSignalStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STOP" => Ok(SignalState::Stop),
            "WALK" => Ok(SignalState::Walk),
            "UNKNOWN" => Ok(SignalState::Unknown),
            _ => Err(ParseSignalStateError(s.to_string())),
        }
    }
}

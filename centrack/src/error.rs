//! Error types for the tracking core

use crate::bbox::BoundingBox;
use thiserror::Error;

/// Result type alias for the tracking core
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors surfaced by tracker and gate construction or by malformed input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Input contract violation: box {index} is malformed: {bbox}")]
    InputContractViolation { index: usize, bbox: BoundingBox },
}

impl TrackError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
}

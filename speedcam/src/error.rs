//! Error types for the speed camera pipeline

use thiserror::Error;

/// Result type alias for the speed camera pipeline
pub type Result<T> = std::result::Result<T, SpeedcamError>;

/// Errors that can occur while acquiring, detecting or tracking
#[derive(Error, Debug)]
pub enum SpeedcamError {
    #[error("Tracking error: {0}")]
    Tracking(#[from] centrack::TrackError),

    #[error("Frame source error: {0}")]
    SourceError(String),

    #[error("Motion preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SpeedcamError {
    pub fn frame_source<S: Into<String>>(msg: S) -> Self {
        Self::SourceError(msg.into())
    }

    pub fn preprocessing<S: Into<String>>(msg: S) -> Self {
        Self::PreprocessingError(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }
}

//! Motion-triggered speed camera
//!
//! Reads frames, isolates moving regions by background subtraction, keeps a
//! stable identity per region with [`centrack::CentroidTracker`] and times
//! each identity across a fixed band of the frame with
//! [`centrack::VelocityGate`].

pub mod config;
pub mod error;
pub mod motion;
pub mod pipeline;
pub mod render;
pub mod sink;
pub mod source;
#[cfg(feature = "opencv")]
pub mod video;

pub use config::SpeedcamConfig;
pub use error::{Result, SpeedcamError};
pub use motion::{Detector, MotionConfig, MotionDetector};
pub use pipeline::{FrameReport, RunOptions, RunSummary, SpeedPipeline};
pub use sink::{JsonLinesSink, ReadingSink};
pub use source::{Frame, FrameClock, FrameSource, ImageSequence, SourceKind};
#[cfg(feature = "opencv")]
pub use video::VideoCaptureSource;

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

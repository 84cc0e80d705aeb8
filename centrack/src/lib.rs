//! Centroid tracking and velocity gating
//!
//! This crate turns per-frame bounding boxes into stable object identities
//! and times each identity across a fixed band of the frame to estimate its
//! velocity. It performs no I/O; frame acquisition and motion detection are
//! left to the caller.
//!
//! ```rust
//! use centrack::{BoundingBox, CentroidTracker, GateConfig, TrackerConfig, VelocityGate};
//! use std::time::{Duration, Instant};
//!
//! let mut tracker = CentroidTracker::new(TrackerConfig::default())?;
//! let mut gate = VelocityGate::new(GateConfig::new(200, 600, 0.002, 3600.0))?;
//!
//! let t0 = Instant::now();
//! let mut readings = Vec::new();
//! for (step, x) in [150, 400, 650].into_iter().enumerate() {
//!     let boxes = [BoundingBox::new(x - 20, 100, x + 20, 140)];
//!     let centroids = tracker.update(&boxes)?;
//!     let now = t0 + Duration::from_secs(step as u64);
//!     readings.extend(gate.observe(&centroids, now));
//! }
//! assert_eq!(readings.len(), 1);
//! # Ok::<(), centrack::TrackError>(())
//! ```

pub mod assignment;
pub mod bbox;
pub mod error;
pub mod gate;
pub mod tracker;

pub use assignment::{greedy_assign, AssignmentResult};
pub use bbox::{BoundingBox, Centroid, ObjectId};
pub use error::{Result, TrackError};
pub use gate::{GateConfig, VelocityGate, VelocityReading};
pub use tracker::{CentroidTracker, TrackedObject, TrackerConfig};

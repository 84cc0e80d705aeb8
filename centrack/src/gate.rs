//! Velocity gate: times each tracked object across a fixed vertical band
//!
//! An object enters the gate when its centroid is first seen strictly between
//! `left_bound` and `right_bound`, and exits when a later centroid lands on or
//! beyond either bound. Each exit yields one reading of
//! `known_distance / elapsed_seconds * rate_scale`.

use crate::bbox::{Centroid, ObjectId};
use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Gate geometry and unit scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Left boundary x-coordinate in pixels
    pub left_bound: i32,
    /// Right boundary x-coordinate in pixels
    pub right_bound: i32,
    /// Physical distance between the two bounds, in the caller's unit
    pub known_distance: f64,
    /// Multiplier applied to distance per second, e.g. 3600 for per-hour rates
    pub rate_scale: f64,
}

impl GateConfig {
    pub fn new(left_bound: i32, right_bound: i32, known_distance: f64, rate_scale: f64) -> Self {
        Self {
            left_bound,
            right_bound,
            known_distance,
            rate_scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.left_bound >= self.right_bound {
            return Err(TrackError::config(format!(
                "left_bound ({}) must be less than right_bound ({})",
                self.left_bound, self.right_bound
            )));
        }
        if !(self.known_distance.is_finite() && self.known_distance > 0.0) {
            return Err(TrackError::config(format!(
                "known_distance must be a positive number, got {}",
                self.known_distance
            )));
        }
        if !(self.rate_scale.is_finite() && self.rate_scale > 0.0) {
            return Err(TrackError::config(format!(
                "rate_scale must be a positive number, got {}",
                self.rate_scale
            )));
        }
        Ok(())
    }

    /// Strictly between the two bounds
    pub fn contains(&self, x: i32) -> bool {
        self.left_bound < x && x < self.right_bound
    }
}

/// One completed transit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityReading {
    pub id: ObjectId,
    /// Time spent inside the gate, in seconds
    pub elapsed_secs: f64,
    /// Scaled rate, e.g. miles per hour
    pub velocity: f64,
}

impl VelocityReading {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }
}

/// Per-object entry timestamps for objects currently inside the gate
#[derive(Debug, Clone)]
pub struct VelocityGate {
    config: GateConfig,
    entries: BTreeMap<ObjectId, Instant>,
}

impl VelocityGate {
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            entries: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Advance every object's gate state by one frame
    ///
    /// Readings are returned in ascending id order. Objects missing from
    /// `centroids` keep their entry timestamp untouched.
    pub fn observe(
        &mut self,
        centroids: &BTreeMap<ObjectId, Centroid>,
        now: Instant,
    ) -> Vec<VelocityReading> {
        let mut readings = Vec::new();

        for (&id, centroid) in centroids {
            if self.config.contains(centroid.x) {
                if !self.entries.contains_key(&id) {
                    log::debug!("{} entered gate at x={}", id, centroid.x);
                    self.entries.insert(id, now);
                }
            } else if let Some(entered) = self.entries.remove(&id) {
                let elapsed = now.saturating_duration_since(entered);
                match self.reading(id, elapsed) {
                    Some(reading) => {
                        log::debug!(
                            "{} exited gate at x={} after {:.3}s",
                            id,
                            centroid.x,
                            reading.elapsed_secs
                        );
                        readings.push(reading);
                    }
                    None => log::warn!(
                        "{} crossed the gate with no measurable elapsed time, dropping transit",
                        id
                    ),
                }
            }
        }

        readings
    }

    fn reading(&self, id: ObjectId, elapsed: Duration) -> Option<VelocityReading> {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        Some(VelocityReading {
            id,
            elapsed_secs: secs,
            velocity: (self.config.known_distance / secs) * self.config.rate_scale,
        })
    }

    /// Evict entries for ids that can no longer be observed.
    ///
    /// Returns how many entries were removed.
    pub fn forget<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let mut removed = 0;
        for id in ids {
            if self.entries.remove(&id).is_some() {
                log::debug!("Evicted stale gate entry for {}", id);
                removed += 1;
            }
        }
        removed
    }

    /// Ids currently inside the gate
    pub fn in_zone(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.keys().copied()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

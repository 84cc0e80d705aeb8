//! Runtime configuration for the speed camera

use crate::error::{Result, SpeedcamError};
use crate::motion::MotionConfig;
use centrack::{CentroidTracker, GateConfig, TrackerConfig, VelocityGate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full pipeline configuration, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedcamConfig {
    pub tracker: TrackerConfig,
    pub gate: GateConfig,
    pub motion: MotionConfig,
    /// Label printed after each velocity value
    pub rate_unit: String,
    /// Drop gate entries for objects the tracker has deregistered
    pub evict_deregistered: bool,
}

impl Default for SpeedcamConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            // Reference lines at x=200 and x=600, 0.002 miles apart, reported per hour
            gate: GateConfig::new(200, 600, 0.002, 3600.0),
            motion: MotionConfig::default(),
            rate_unit: "mph".to_string(),
            evict_deregistered: true,
        }
    }
}

impl SpeedcamConfig {
    /// Load configuration from a JSON file. Missing sections fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            SpeedcamError::config(format!("invalid config file {}: {}", path.display(), e))
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check every section by building the components once
    pub fn validate(&self) -> Result<()> {
        CentroidTracker::new(self.tracker.clone())?;
        VelocityGate::new(self.gate.clone())?;
        self.motion.validate()?;
        Ok(())
    }
}

/// Speed camera pipeline: detect, track, gate
///
/// Per frame: motion boxes -> centroid tracker -> velocity gate -> readings.
/// Everything runs on the caller's thread, one frame at a time.
use crate::config::SpeedcamConfig;
use crate::error::Result;
use crate::motion::Detector;
use crate::render::{annotate, save_frame};
use crate::sink::ReadingSink;
use crate::source::{Frame, FrameSource};
use centrack::{BoundingBox, Centroid, CentroidTracker, ObjectId, VelocityGate, VelocityReading};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Everything the pipeline learned from one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub index: u64,
    pub detections: Vec<BoundingBox>,
    pub tracked: BTreeMap<ObjectId, Centroid>,
    pub readings: Vec<VelocityReading>,
}

/// Loop controls for [`SpeedPipeline::run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    /// Write annotated frames here
    pub output_dir: Option<PathBuf>,
}

/// Totals for a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub readings: u64,
    pub ids_issued: u64,
    pub evicted: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} detections, {} ids issued, {} readings, {} stale gate entries evicted",
            self.frames, self.detections, self.ids_issued, self.readings, self.evicted
        )
    }
}

pub struct SpeedPipeline {
    detector: Box<dyn Detector>,
    tracker: CentroidTracker,
    gate: VelocityGate,
    rate_unit: String,
    evict_deregistered: bool,
    evicted: u64,
}

impl SpeedPipeline {
    pub fn new(config: &SpeedcamConfig, detector: Box<dyn Detector>) -> Result<Self> {
        let tracker = CentroidTracker::new(config.tracker.clone())?;
        let gate = VelocityGate::new(config.gate.clone())?;

        log::info!(
            "Speed pipeline: detector={}, max_disappeared={}, gate=({}, {}), known_distance={}, rate_scale={}",
            detector.name(),
            config.tracker.max_disappeared,
            config.gate.left_bound,
            config.gate.right_bound,
            config.gate.known_distance,
            config.gate.rate_scale
        );

        Ok(Self {
            detector,
            tracker,
            gate,
            rate_unit: config.rate_unit.clone(),
            evict_deregistered: config.evict_deregistered,
            evicted: 0,
        })
    }

    /// Run a single frame through detection, tracking and gating
    pub fn process(&mut self, frame: &Frame) -> Result<FrameReport> {
        let detections = self.detector.detect(&frame.image)?;
        self.observe(frame.index, detections, frame.timestamp)
    }

    /// Tracking and gating for boxes produced elsewhere
    pub fn observe(
        &mut self,
        index: u64,
        detections: Vec<BoundingBox>,
        timestamp: Instant,
    ) -> Result<FrameReport> {
        let tracked = self.tracker.update(&detections)?;
        let readings = self.gate.observe(&tracked, timestamp);

        let deregistered = self.tracker.drain_deregistered();
        if self.evict_deregistered && !deregistered.is_empty() {
            self.evicted += self.gate.forget(deregistered) as u64;
        }

        for reading in &readings {
            log::info!(
                "{} velocity is {:.3} {} ({:.3}s in zone)",
                reading.id,
                reading.velocity,
                self.rate_unit,
                reading.elapsed_secs
            );
        }

        Ok(FrameReport {
            index,
            detections,
            tracked,
            readings,
        })
    }

    /// Drain `source` until it is exhausted or `max_frames` is reached
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn ReadingSink,
        options: &RunOptions,
    ) -> Result<RunSummary> {
        if let Some(dir) = &options.output_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut summary = RunSummary::default();
        let started = Instant::now();

        while options.max_frames.map_or(true, |max| summary.frames < max) {
            let Some(frame) = source.next_frame()? else {
                break;
            };

            let report = self.process(&frame)?;
            summary.frames += 1;
            summary.detections += report.detections.len() as u64;
            summary.readings += report.readings.len() as u64;

            for reading in &report.readings {
                sink.record(report.index, reading)?;
            }

            if let Some(dir) = &options.output_dir {
                let annotated = annotate(
                    &frame.image,
                    self.gate.config(),
                    &report.detections,
                    &report.tracked,
                );
                save_frame(&annotated, dir, report.index)?;
            }

            if summary.frames % 100 == 0 {
                log::debug!(
                    "{} frames processed, {} tracked, {} in zone",
                    summary.frames,
                    self.tracker.len(),
                    self.gate.len()
                );
            }
        }

        sink.flush()?;
        summary.ids_issued = self.tracker.next_id().value();
        summary.evicted = self.evicted;

        let elapsed = started.elapsed().as_secs_f64();
        log::info!(
            "Run finished in {:.2}s ({:.1} fps): {}",
            elapsed,
            if elapsed > 0.0 { summary.frames as f64 / elapsed } else { 0.0 },
            summary
        );

        Ok(summary)
    }

    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    pub fn gate(&self) -> &VelocityGate {
        &self.gate
    }
}

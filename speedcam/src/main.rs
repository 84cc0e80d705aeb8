/// Speed camera over a recorded image sequence, a camera or a video file
///
/// Usage:
///   speedcam <frames_dir> [--config speedcam.json] [--fps 30] [--output annotated/]
///   speedcam --camera 0            (needs the `opencv` feature)
///   speedcam --video street.mp4    (needs the `opencv` feature)
///
/// Examples:
///   speedcam recordings/street --fps 30 --readings readings.jsonl
///   speedcam --video recordings/street.mp4 --fps 25 --output annotated
///   speedcam recordings/street --left-bound 150 --right-bound 650 --known-distance 0.0025
///   RUST_LOG=debug speedcam recordings/street --max-frames 300 --output annotated
use anyhow::Context;
use centrack::TrackerConfig;
use clap::{ArgGroup, Parser};
use speedcam::{
    FrameClock, JsonLinesSink, MotionDetector, RunOptions, SourceKind, SpeedPipeline,
    SpeedcamConfig,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "speedcam", version, about = "Estimate object speeds from a fixed camera")]
#[command(group(ArgGroup::new("input").required(true).args(["frames", "camera", "video"])))]
struct Args {
    /// Directory of frames, read in file name order
    frames: Option<PathBuf>,

    /// Capture from this camera device index
    #[arg(long, value_name = "ID")]
    camera: Option<i32>,

    /// Read frames from a video file
    #[arg(long, value_name = "PATH")]
    video: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Replay at a fixed frame rate instead of timing frames by the wall clock
    #[arg(long)]
    fps: Option<f64>,

    /// Consecutive missed frames before an object is dropped
    #[arg(long, allow_negative_numbers = true)]
    max_disappeared: Option<i64>,

    /// Left gate boundary (pixels)
    #[arg(long, allow_negative_numbers = true)]
    left_bound: Option<i32>,

    /// Right gate boundary (pixels)
    #[arg(long, allow_negative_numbers = true)]
    right_bound: Option<i32>,

    /// Physical distance between the boundaries
    #[arg(long, allow_negative_numbers = true)]
    known_distance: Option<f64>,

    /// Multiplier from distance per second to the reported rate
    #[arg(long, allow_negative_numbers = true)]
    rate_scale: Option<f64>,

    /// Unit label for printed readings
    #[arg(long)]
    unit: Option<String>,

    /// Minimum contour area for a motion region (pixels)
    #[arg(long)]
    min_area: Option<f64>,

    /// Keep gate entries of deregistered objects
    #[arg(long)]
    keep_stale: bool,

    /// Write annotated frames to this directory
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Write readings as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    readings: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,
}

impl Args {
    fn source_kind(&self) -> anyhow::Result<SourceKind> {
        match (&self.frames, self.camera, &self.video) {
            (Some(dir), None, None) => Ok(SourceKind::Images(dir.clone())),
            (None, Some(id), None) => Ok(SourceKind::Camera(id)),
            (None, None, Some(path)) => Ok(SourceKind::Video(path.clone())),
            _ => anyhow::bail!("give exactly one of <FRAMES>, --camera or --video"),
        }
    }

    fn apply_overrides(&self, config: &mut SpeedcamConfig) -> anyhow::Result<()> {
        if let Some(max_disappeared) = self.max_disappeared {
            config.tracker = TrackerConfig::try_from(max_disappeared)?;
        }
        if let Some(left) = self.left_bound {
            config.gate.left_bound = left;
        }
        if let Some(right) = self.right_bound {
            config.gate.right_bound = right;
        }
        if let Some(distance) = self.known_distance {
            config.gate.known_distance = distance;
        }
        if let Some(scale) = self.rate_scale {
            config.gate.rate_scale = scale;
        }
        if let Some(unit) = &self.unit {
            config.rate_unit = unit.clone();
        }
        if let Some(min_area) = self.min_area {
            config.motion.min_area = min_area;
        }
        if self.keep_stale {
            config.evict_deregistered = false;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("speedcam {}", speedcam::version());

    let mut config = match &args.config {
        Some(path) => SpeedcamConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SpeedcamConfig::default(),
    };
    args.apply_overrides(&mut config)?;
    config.validate().context("invalid configuration")?;

    let clock = FrameClock::from_fps(args.fps)?;
    let kind = args.source_kind()?;
    let mut source = kind
        .open(clock)
        .with_context(|| format!("opening {}", kind))?;

    let detector = MotionDetector::new(config.motion.clone())?;
    let mut pipeline = SpeedPipeline::new(&config, Box::new(detector))?;

    let mut sink = args
        .readings
        .as_ref()
        .map(|path| JsonLinesSink::create(path, config.rate_unit.clone()))
        .transpose()?;

    let options = RunOptions {
        max_frames: args.max_frames,
        output_dir: args.output.clone(),
    };

    let summary = pipeline.run(source.as_mut(), &mut sink, &options)?;
    println!("{}", summary);

    Ok(())
}

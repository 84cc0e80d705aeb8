/// Synthetic street scene run through the full speed camera pipeline
///
/// Renders two blocks crossing a 1000 px wide frame at different speeds,
/// writes them as PNG frames, and replays them at a fixed 30 FPS.
///
/// Usage:
///   cargo run --example synthetic_street [output_dir]
use image::{Rgb, RgbImage};
use speedcam::{
    FrameClock, ImageSequence, MotionConfig, MotionDetector, RunOptions, SpeedPipeline,
    SpeedcamConfig,
};
use std::env;
use std::path::PathBuf;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 400;

fn render_frame(index: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([40, 40, 40]));

    // (lane top, block width, speed px/frame, start x)
    let vehicles = [(60u32, 120u32, 24i64, -120i64), (240, 90, 12, 1000)];

    for (lane_top, block_width, speed, start) in vehicles {
        let direction = if start < 0 { 1 } else { -1 };
        let left = start + direction * speed * index as i64;
        for y in lane_top..lane_top + 70 {
            for x in left.max(0)..(left + block_width as i64).min(WIDTH as i64) {
                image.put_pixel(x as u32, y, Rgb([220, 220, 60]));
            }
        }
    }

    image
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out_dir: PathBuf = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("speedcam_synthetic"));
    let frames_dir = out_dir.join("frames");
    std::fs::create_dir_all(&frames_dir)?;

    println!("Rendering frames into {}", frames_dir.display());
    for index in 0..90 {
        render_frame(index).save(frames_dir.join(format!("{:04}.png", index)))?;
    }

    let config = SpeedcamConfig {
        motion: MotionConfig {
            min_area: 800.0,
            ..MotionConfig::default()
        },
        ..SpeedcamConfig::default()
    };
    config.validate()?;

    let mut source = ImageSequence::open(&frames_dir, FrameClock::from_fps(Some(30.0))?)?;
    let detector = MotionDetector::new(config.motion.clone())?;
    let mut pipeline = SpeedPipeline::new(&config, Box::new(detector))?;

    let mut readings = Vec::new();
    let options = RunOptions {
        max_frames: None,
        output_dir: Some(out_dir.join("annotated")),
    };
    let summary = pipeline.run(&mut source, &mut readings, &options)?;

    println!("\n{}", summary);
    for reading in &readings {
        println!(
            "  {}: {:.3} {} over {:.2}s",
            reading.id, reading.velocity, config.rate_unit, reading.elapsed_secs
        );
    }

    Ok(())
}

use centrack::{BoundingBox, CentroidTracker, GateConfig, TrackerConfig, VelocityGate};
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    println!("Simulating two objects crossing a 200..600 px gate...");

    let mut tracker = CentroidTracker::new(TrackerConfig::new(5))?;
    let mut gate = VelocityGate::new(GateConfig::new(200, 600, 0.002, 3600.0))?;

    let t0 = Instant::now();
    let frame_interval = Duration::from_millis(100);

    for frame in 0..40u32 {
        let fast_x = 100 + frame as i32 * 30; // 30 px per frame, left to right
        let slow_x = 700 - frame as i32 * 15; // 15 px per frame, right to left

        let mut boxes = vec![
            BoundingBox::new(fast_x - 25, 100, fast_x + 25, 140),
            BoundingBox::new(slow_x - 25, 300, slow_x + 25, 340),
        ];

        // The slow object is occluded for a few frames mid-transit
        if (18..21).contains(&frame) {
            boxes.pop();
        }

        let centroids = tracker.update(&boxes)?;
        let now = t0 + frame_interval * frame;

        for reading in gate.observe(&centroids, now) {
            println!(
                "Frame {:2}: {} crossed in {:.2}s -> velocity is {:.3} mph",
                frame, reading.id, reading.elapsed_secs, reading.velocity
            );
        }
    }

    println!("\nIds issued: {}", tracker.next_id().value());
    println!("Still tracked: {}", tracker.len());
    println!("Still inside gate: {}", gate.len());

    Ok(())
}

//! Frame annotation: gate lines, detection boxes and tracked centroids

use crate::error::Result;
use centrack::{BoundingBox, Centroid, GateConfig, ObjectId};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const GATE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
pub const CENTROID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const GATE_THICKNESS: i32 = 5;
const CENTROID_RADIUS: i32 = 4;

/// Draw a vertical line of the given thickness at column `x`
pub fn draw_vertical_line(img: &mut RgbImage, x: i32, color: Rgb<u8>, thickness: i32) {
    let bottom = img.height().saturating_sub(1) as f32;
    let half = thickness / 2;
    for offset in -half..=(thickness - 1 - half) {
        let col = (x + offset) as f32;
        draw_line_segment_mut(img, (col, 0.0), (col, bottom), color);
    }
}

/// Draw a hollow rectangle outlining a detection
pub fn draw_box(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    // Rect cannot be zero-sized
    let width = bbox.width().max(1) as u32;
    let height = bbox.height().max(1) as u32;
    draw_hollow_rect_mut(img, Rect::at(bbox.x_min, bbox.y_min).of_size(width, height), color);
}

/// Copy of `frame` with the gate bounds, detections and tracked centroids drawn on it
pub fn annotate(
    frame: &RgbImage,
    gate: &GateConfig,
    detections: &[BoundingBox],
    tracked: &BTreeMap<ObjectId, Centroid>,
) -> RgbImage {
    let mut img = frame.clone();

    draw_vertical_line(&mut img, gate.left_bound, GATE_COLOR, GATE_THICKNESS);
    draw_vertical_line(&mut img, gate.right_bound, GATE_COLOR, GATE_THICKNESS);

    for bbox in detections {
        draw_box(&mut img, bbox, BOX_COLOR);
    }

    for centroid in tracked.values() {
        draw_filled_circle_mut(&mut img, (centroid.x, centroid.y), CENTROID_RADIUS, CENTROID_COLOR);
    }

    img
}

/// Save an annotated frame as `frame_NNNNNN.png` inside `dir`
pub fn save_frame(img: &RgbImage, dir: &Path, index: u64) -> Result<PathBuf> {
    let path = dir.join(format!("frame_{:06}.png", index));
    img.save(&path)?;
    Ok(path)
}

//! Motion detection: background subtraction, mask cleanup and box extraction
//!
//! This is the frame preprocessing stage that feeds the tracker. It produces
//! one bounding box per sufficiently large moving region of the frame.

use crate::error::{Result, SpeedcamError};
use centrack::BoundingBox;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Motion detector tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Squared RGB distance above which a pixel counts as changed
    pub dist2_threshold: u32,
    /// Mask values above this become foreground
    pub binary_threshold: u8,
    /// Radius of the square structuring element used by open/close
    pub kernel_radius: u8,
    /// Passes of opening and then of closing
    pub iterations: u32,
    /// Minimum contour area in pixels
    pub min_area: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            dist2_threshold: 1000,
            binary_threshold: 0,
            kernel_radius: 4,
            iterations: 2,
            min_area: 1000.0,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_area.is_finite() && self.min_area >= 0.0) {
            return Err(SpeedcamError::config(format!(
                "min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }
        Ok(())
    }
}

/// Common interface for frame preprocessors
pub trait Detector: Send {
    /// Detect moving regions in a single frame
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<BoundingBox>>;

    /// Get the detector name (for logging/debugging)
    fn name(&self) -> &str;
}

/// Previous-frame background model
///
/// Equivalent to a nearest-neighbour background subtractor with a one-frame
/// history: a pixel is foreground when it moved far enough from the last frame.
#[derive(Debug, Clone, Default)]
pub struct BackgroundModel {
    dist2_threshold: u32,
    previous: Option<RgbImage>,
}

impl BackgroundModel {
    pub fn new(dist2_threshold: u32) -> Self {
        Self {
            dist2_threshold,
            previous: None,
        }
    }

    /// Foreground mask for `frame`; the frame then becomes the background
    pub fn apply(&mut self, frame: &RgbImage) -> Result<GrayImage> {
        let (width, height) = frame.dimensions();

        let mask = match &self.previous {
            Some(prev) if prev.dimensions() == frame.dimensions() && width > 0 && height > 0 => {
                foreground_mask(prev, frame, self.dist2_threshold)?
            }
            Some(prev) if prev.dimensions() != frame.dimensions() => {
                log::warn!(
                    "Frame size changed from {:?} to {:?}, resetting background",
                    prev.dimensions(),
                    frame.dimensions()
                );
                GrayImage::new(width, height)
            }
            _ => GrayImage::new(width, height),
        };

        self.previous = Some(frame.clone());
        Ok(mask)
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

fn foreground_mask(prev: &RgbImage, frame: &RgbImage, dist2_threshold: u32) -> Result<GrayImage> {
    let (width, height) = frame.dimensions();
    let stride = width as usize * 3;
    let mut data = vec![0u8; width as usize * height as usize];

    data.par_chunks_mut(width as usize)
        .zip(frame.as_raw().par_chunks(stride))
        .zip(prev.as_raw().par_chunks(stride))
        .for_each(|((mask_row, cur_row), prev_row)| {
            for (x, out) in mask_row.iter_mut().enumerate() {
                let dist2: u32 = (0..3)
                    .map(|c| {
                        let d = i32::from(cur_row[x * 3 + c]) - i32::from(prev_row[x * 3 + c]);
                        (d * d) as u32
                    })
                    .sum();
                *out = if dist2 > dist2_threshold { 255 } else { 0 };
            }
        });

    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| SpeedcamError::preprocessing("foreground mask has wrong size"))
}

/// Binarize the mask and suppress speckle noise with morphological open/close
pub fn mask_motion(mask: &GrayImage, config: &MotionConfig) -> GrayImage {
    let mut cleaned = threshold(mask, config.binary_threshold, ThresholdType::Binary);
    for _ in 0..config.iterations {
        cleaned = open(&cleaned, Norm::LInf, config.kernel_radius);
    }
    for _ in 0..config.iterations {
        cleaned = close(&cleaned, Norm::LInf, config.kernel_radius);
    }
    cleaned
}

/// Polygon area of a contour (shoelace formula)
pub fn contour_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice_area.abs() as f64 / 2.0
}

/// Bounding box `[x, y, x+w, y+h]` where `w`/`h` count pixels inclusively
pub fn bounding_rect(contour: &Contour<i32>) -> Option<BoundingBox> {
    let first = contour.points.first()?;
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        x_min = x_min.min(p.x);
        y_min = y_min.min(p.y);
        x_max = x_max.max(p.x);
        y_max = y_max.max(p.y);
    }
    Some(BoundingBox::from_xywh(
        x_min,
        y_min,
        x_max - x_min + 1,
        y_max - y_min + 1,
    ))
}

/// Boxes around the outermost foreground regions larger than `min_area`
pub fn find_boxes(mask: &GrayImage, min_area: f64) -> Vec<BoundingBox> {
    find_contours::<i32>(mask)
        .iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .filter(|c| contour_area(c) > min_area)
        .filter_map(bounding_rect)
        .collect()
}

/// Background-subtraction detector
pub struct MotionDetector {
    config: MotionConfig,
    background: BackgroundModel,
    frames_seen: u64,
}

impl MotionDetector {
    pub fn new(config: MotionConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Motion detector: dist2_threshold={}, kernel_radius={}, iterations={}, min_area={:.0}",
            config.dist2_threshold,
            config.kernel_radius,
            config.iterations,
            config.min_area
        );
        Ok(Self {
            background: BackgroundModel::new(config.dist2_threshold),
            config,
            frames_seen: 0,
        })
    }

    /// Cleaned foreground mask for a frame (also advances the background)
    pub fn motion_mask(&mut self, frame: &RgbImage) -> Result<GrayImage> {
        let raw = self.background.apply(frame)?;
        Ok(mask_motion(&raw, &self.config))
    }
}

impl Detector for MotionDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<BoundingBox>> {
        self.frames_seen += 1;
        let mask = self.motion_mask(frame)?;
        let boxes = find_boxes(&mask, self.config.min_area);
        log::trace!("frame {}: {} motion regions", self.frames_seen, boxes.len());
        Ok(boxes)
    }

    fn name(&self) -> &str {
        "background-subtraction"
    }
}

/// Count of foreground pixels, handy for diagnostics
pub fn foreground_pixels(mask: &GrayImage) -> usize {
    mask.pixels().filter(|Luma([v])| *v > 0).count()
}

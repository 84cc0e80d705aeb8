//! Live camera and video file input through OpenCV

use crate::error::{Result, SpeedcamError};
use crate::source::{Frame, FrameClock, FrameSource};
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc::{cvt_color, COLOR_BGR2RGB},
    prelude::*,
    videoio::{VideoCapture, CAP_ANY},
};
use std::path::Path;
use std::time::Instant;

/// Frames from an OpenCV capture device or video file
pub struct VideoCaptureSource {
    cap: VideoCapture,
    label: String,
    clock: FrameClock,
    start: Instant,
    frames_read: u64,
}

impl VideoCaptureSource {
    /// Open a camera by device index
    pub fn camera(camera_id: i32, clock: FrameClock) -> Result<Self> {
        let cap = VideoCapture::new(camera_id, CAP_ANY).map_err(|e| {
            SpeedcamError::frame_source(format!("Failed to open camera {}: {}", camera_id, e))
        })?;
        let source = Self::from_capture(cap, format!("camera {}", camera_id), clock)?;
        log::info!("Camera opened successfully (ID: {})", camera_id);
        Ok(source)
    }

    /// Open a video file
    pub fn file<P: AsRef<Path>>(path: P, clock: FrameClock) -> Result<Self> {
        let path = path.as_ref();
        let name = path.to_str().ok_or_else(|| {
            SpeedcamError::frame_source(format!("video path is not UTF-8: {}", path.display()))
        })?;
        let cap = VideoCapture::from_file(name, CAP_ANY).map_err(|e| {
            SpeedcamError::frame_source(format!("Failed to open video file {}: {}", name, e))
        })?;
        let source = Self::from_capture(cap, name.to_string(), clock)?;
        log::info!("Video file opened: {}", name);
        Ok(source)
    }

    fn from_capture(cap: VideoCapture, label: String, clock: FrameClock) -> Result<Self> {
        let opened = cap.is_opened().map_err(|e| {
            SpeedcamError::frame_source(format!("{} check failed: {}", label, e))
        })?;
        if !opened {
            return Err(SpeedcamError::frame_source(format!("{} is not opened", label)));
        }
        Ok(Self {
            cap,
            label,
            clock,
            start: Instant::now(),
            frames_read: 0,
        })
    }
}

/// Convert a BGR OpenCV frame into an `RgbImage`
pub fn mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
    let mut rgb_mat = Mat::default();
    cvt_color(mat, &mut rgb_mat, COLOR_BGR2RGB, 0)
        .map_err(|e| SpeedcamError::preprocessing(format!("Color conversion failed: {}", e)))?;

    let size = rgb_mat
        .size()
        .map_err(|e| SpeedcamError::preprocessing(format!("Mat size failed: {}", e)))?;
    let data = rgb_mat
        .data_bytes()
        .map_err(|e| SpeedcamError::preprocessing(format!("Mat data extraction failed: {}", e)))?
        .to_vec();

    RgbImage::from_raw(size.width as u32, size.height as u32, data)
        .ok_or_else(|| SpeedcamError::preprocessing("frame buffer does not match its size"))
}

impl FrameSource for VideoCaptureSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        let grabbed = self
            .cap
            .read(&mut mat)
            .map_err(|e| SpeedcamError::frame_source(format!("Frame read failed: {}", e)))?;

        if !grabbed || mat.rows() == 0 || mat.cols() == 0 {
            log::info!("{} ended after {} frames", self.label, self.frames_read);
            return Ok(None);
        }

        let index = self.frames_read;
        let image = mat_to_rgb(&mat)?;
        self.frames_read += 1;

        Ok(Some(Frame {
            index,
            image,
            timestamp: self.clock.timestamp(self.start, index),
        }))
    }
}

impl Drop for VideoCaptureSource {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            log::warn!("Failed to release {}: {}", self.label, e);
        }
        log::debug!("{} released after {} frames", self.label, self.frames_read);
    }
}

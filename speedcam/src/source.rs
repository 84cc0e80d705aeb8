//! Frame acquisition: image sequences on disk, plus cameras and video files
//! when built with the `opencv` feature

use crate::error::{Result, SpeedcamError};
use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Frame with metadata
#[derive(Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
    pub timestamp: Instant,
}

/// Anything that yields frames in capture order
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// How frame timestamps are produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameClock {
    /// `Instant::now()` when the frame is read
    WallClock,
    /// `start + index / fps`, for replaying recordings deterministically
    FixedRate { fps: f64 },
}

impl FrameClock {
    pub fn from_fps(fps: Option<f64>) -> Result<Self> {
        match fps {
            None => Ok(Self::WallClock),
            Some(fps) if fps.is_finite() && fps > 0.0 => Ok(Self::FixedRate { fps }),
            Some(fps) => Err(SpeedcamError::config(format!(
                "fps must be a positive number, got {}",
                fps
            ))),
        }
    }

    pub(crate) fn timestamp(&self, start: Instant, index: u64) -> Instant {
        match self {
            Self::WallClock => Instant::now(),
            Self::FixedRate { fps } => start + Duration::from_secs_f64(index as f64 / fps),
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Directory of still images
    Images(PathBuf),
    /// Capture device index
    Camera(i32),
    /// Video file
    Video(PathBuf),
}

impl SourceKind {
    pub fn open(&self, clock: FrameClock) -> Result<Box<dyn FrameSource>> {
        match self {
            Self::Images(dir) => Ok(Box::new(ImageSequence::open(dir, clock)?)),
            #[cfg(feature = "opencv")]
            Self::Camera(id) => Ok(Box::new(crate::video::VideoCaptureSource::camera(*id, clock)?)),
            #[cfg(feature = "opencv")]
            Self::Video(path) => Ok(Box::new(crate::video::VideoCaptureSource::file(path, clock)?)),
            #[cfg(not(feature = "opencv"))]
            Self::Camera(_) | Self::Video(_) => Err(SpeedcamError::frame_source(format!(
                "{} input requires building with the `opencv` feature",
                self
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Images(dir) => write!(f, "images in {}", dir.display()),
            Self::Camera(id) => write!(f, "camera {}", id),
            Self::Video(path) => write!(f, "video {}", path.display()),
        }
    }
}

/// Directory of still images, read in lexicographic file name order
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    position: usize,
    clock: FrameClock,
    start: Instant,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P, clock: FrameClock) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(SpeedcamError::frame_source(format!(
                "no image files found in {}",
                dir.display()
            )));
        }

        log::info!("Image sequence opened: {} ({} frames)", dir.display(), paths.len());

        Ok(Self {
            paths,
            position: 0,
            clock,
            start: Instant::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let index = self.position as u64;
        let image = image::open(path)?.to_rgb8();
        self.position += 1;

        Ok(Some(Frame {
            index,
            image,
            timestamp: self.clock.timestamp(self.start, index),
        }))
    }
}

impl Drop for ImageSequence {
    fn drop(&mut self) {
        log::debug!(
            "Image sequence released after {}/{} frames",
            self.position,
            self.paths.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn write_frames(dir: &Path, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            let img = RgbImage::from_pixel(8, 6, Rgb([i as u8 * 40, 0, 0]));
            img.save(dir.join(name)).unwrap();
        }
    }

    #[test]
    fn test_reads_in_name_order_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &["b_001.png", "a_000.png", "c_002.png"]);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequence::open(dir.path(), FrameClock::WallClock).unwrap();
        assert_eq!(source.len(), 3);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.image.dimensions(), (8, 6));
        // a_000.png was written second, so it carries red = 40
        assert_eq!(first.image.get_pixel(0, 0)[0], 40);

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_fixed_rate_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &["0.png", "1.png", "2.png"]);

        let clock = FrameClock::from_fps(Some(4.0)).unwrap();
        let mut source = ImageSequence::open(dir.path(), clock).unwrap();
        let t0 = source.next_frame().unwrap().unwrap().timestamp;
        source.next_frame().unwrap();
        let t2 = source.next_frame().unwrap().unwrap().timestamp;
        assert_eq!(t2.duration_since(t0), Duration::from_millis(500));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSequence::open(dir.path(), FrameClock::WallClock),
            Err(SpeedcamError::SourceError(_))
        ));
    }

    #[test]
    fn test_source_kind_opens_image_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &["0.png", "1.png"]);

        let kind = SourceKind::Images(dir.path().to_path_buf());
        let mut source = kind.open(FrameClock::WallClock).unwrap();
        assert_eq!(source.next_frame().unwrap().unwrap().index, 0);
        assert_eq!(source.next_frame().unwrap().unwrap().index, 1);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_video_inputs_need_opencv() {
        for kind in [SourceKind::Camera(0), SourceKind::Video(PathBuf::from("street.mp4"))] {
            let err = kind.open(FrameClock::WallClock).err().unwrap();
            assert!(matches!(err, SpeedcamError::SourceError(_)));
            assert!(err.to_string().contains("opencv"));
        }
    }

    #[test]
    fn test_invalid_fps() {
        assert!(FrameClock::from_fps(Some(0.0)).is_err());
        assert!(FrameClock::from_fps(Some(f64::INFINITY)).is_err());
        assert_eq!(FrameClock::from_fps(None).unwrap(), FrameClock::WallClock);
    }
}

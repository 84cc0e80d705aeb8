//! Bounding boxes, centroids and object identities

use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned bounding box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Build from OpenCV-style `(x, y, w, h)`, giving `[x, y, x+w, y+h]`
    ///
    /// The far corner saturates at the `i32` range.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn width(&self) -> i32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> i32 {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn is_well_formed(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }

    /// Check the detector contract (`x_min <= x_max`, `y_min <= y_max`)
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.is_well_formed() {
            Ok(())
        } else {
            Err(TrackError::InputContractViolation { index, bbox: *self })
        }
    }

    /// Box center, truncating toward zero
    pub fn centroid(&self) -> Centroid {
        Centroid::new(midpoint(self.x_min, self.x_max), midpoint(self.y_min, self.y_max))
    }

    /// Convert to bounds array [x_min, y_min, x_max, y_max]
    pub fn to_bounds(&self) -> [i32; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

/// `(a + b) / 2` without overflow; the result lies between `a` and `b`
fn midpoint(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bbox({}, {}, {}, {})",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// Integer center point of a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another centroid
    pub fn distance(&self, other: &Centroid) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identity assigned by the tracker. Ids grow monotonically and are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID {}", self.0)
    }
}

//! Bounding boxes of contour blobs
//!
//! The crosswalk detector reduces every contour to its bounding box and
//! scores a crossing from how many stripe-shaped boxes it sees and how
//! alike they are.

use opencv::core::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create from OpenCV Rect
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Width over height; a zero height counts as one pixel.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Collection of bounding boxes with batch operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BBoxCollection {
    boxes: Vec<BBox>,
}

impl BBoxCollection {
    /// Create new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from vector of boxes
    pub fn from_vec(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    pub fn push(&mut self, bbox: BBox) {
        self.boxes.push(bbox);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Keep boxes matching `predicate`
    pub fn filter(mut self, predicate: impl Fn(&BBox) -> bool) -> Self {
        self.boxes.retain(|bbox| predicate(bbox));
        self
    }

    /// Spread of box widths
    pub fn width_stats(&self) -> DimensionStats {
        DimensionStats::from_samples(self.boxes.iter().map(|b| b.width as f64))
    }

    /// Spread of box heights
    pub fn height_stats(&self) -> DimensionStats {
        DimensionStats::from_samples(self.boxes.iter().map(|b| b.height as f64))
    }
}

impl FromIterator<BBox> for BBoxCollection {
    fn from_iter<T: IntoIterator<Item = BBox>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Mean and population standard deviation of one box dimension
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl DimensionStats {
    pub fn from_samples(samples: impl Iterator<Item = f64> + Clone) -> Self {
        let count = samples.clone().count();
        if count == 0 {
            return Self::default();
        }
        let mean = samples.clone().sum::<f64>() / count as f64;
        let variance = samples.map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;

        Self {
            count,
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Coefficient of variation in `[0, 1]`; the mean is floored at one
    /// pixel so tiny or empty samples cannot divide by zero.
    pub fn dispersion(&self) -> f64 {
        (self.std_dev / self.mean.max(1.0)).min(1.0)
    }
}

//! Pixel-space geometry for the segmentation overlay.
//!
//! Region outlines are expressed in the image's natural pixel space. The UI
//! shows the image at some displayed size, so clicks arrive in displayed
//! pixels and must be scaled per axis to land on the same spot.

use serde::{Deserialize, Serialize};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Zero-sized images cannot carry an overlay.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// SVG `viewBox` attribute value covering these dimensions.
    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", self.width, self.height)
    }
}

/// A point in some pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Map a point from `from` pixel space into `to` pixel space.
    ///
    /// Returns `None` when `from` has a zero axis.
    pub fn rescale(&self, from: Dimensions, to: Dimensions) -> Option<Point> {
        if from.is_empty() {
            return None;
        }
        Some(Point {
            x: self.x * to.width as f64 / from.width as f64,
            y: self.y * to.height as f64 / from.height as f64,
        })
    }

    /// Whether the point lies inside `bounds` (edges inclusive).
    pub fn within(&self, bounds: Dimensions) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x <= bounds.width as f64
            && self.y <= bounds.height as f64
    }
}

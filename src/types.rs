use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Axis-aligned detection box in image pixels with its midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    pub cx: f64,
    pub cy: f64,
}

impl BoundingBox {
    /// Box anchored at `(x, y)` with the given size; the centroid is the midpoint.
    pub fn from_anchor(x: u32, y: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
            cx: x as f64 + width as f64 / 2.0,
            cy: y as f64 + height as f64 / 2.0,
        }
    }
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
    pub fn centroid(&self) -> glam::DVec2 {
        glam::DVec2::new(self.cx, self.cy)
    }
}

/// Fixed rectangle of the video frame that carries the burned-in counter.
///
/// Corners are half-open: columns `x1..x2`, rows `y1..y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRegion {
    /// Builds a region from two arbitrary corners, ordering them.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> CropRegion {
        CropRegion {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
        }
    }
    pub fn top_left(&self) -> (u32, u32) {
        (self.x1, self.y1)
    }
    pub fn bottom_right(&self) -> (u32, u32) {
        (self.x2, self.y2)
    }
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
    /// Smallest region covering both, ignoring empty regions.
    pub fn union(&self, other: &CropRegion) -> CropRegion {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        CropRegion {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
    /// Intersects the region with a `width` x `height` frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> CropRegion {
        CropRegion {
            x1: self.x1.min(width),
            y1: self.y1.min(height),
            x2: self.x2.min(width),
            y2: self.y2.min(height),
        }
    }
}

impl FromStr for CropRegion {
    type Err = String;

    /// Parses `x1,y1,x2,y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<u32> = s
            .split(',')
            .map(|v| v.trim().parse::<u32>().map_err(|e| format!("'{}': {}", v, e)))
            .collect::<Result<_, _>>()?;
        if values.len() != 4 {
            return Err(format!("expected x1,y1,x2,y2 but got {} values", values.len()));
        }
        Ok(CropRegion::from_corners(
            (values[0], values[1]),
            (values[2], values[3]),
        ))
    }
}

/// A decoded video frame together with its position in playback order.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub index: usize,
    pub image: RgbImage,
}

impl VideoFrame {
    pub fn new(index: usize, image: RgbImage) -> VideoFrame {
        VideoFrame { index, image }
    }
}

use glam::DVec2;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::template::Centroid;
use crate::types::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Cross,
    TiltedCross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: [u8; 3],
    pub size: u32,
    pub thickness: u32,
    pub shape: MarkerShape,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: [0, 225, 255],
            size: 20,
            thickness: 2,
            shape: MarkerShape::Cross,
        }
    }
}

/// Draws a marker centred on `p` (truncated to whole pixels). Parts outside
/// the image are clipped.
pub fn draw_marker_mut(image: &mut RgbImage, p: DVec2, style: &MarkerStyle) {
    let cx = p.x.trunc() as f32;
    let cy = p.y.trunc() as f32;
    let half = style.size as f32 / 2.0;
    let color = Rgb(style.color);
    let thickness = style.thickness.max(1) as i32;
    for t in 0..thickness {
        let o = (t - thickness / 2) as f32;
        match style.shape {
            MarkerShape::Cross => {
                draw_line_segment_mut(image, (cx - half, cy + o), (cx + half, cy + o), color);
                draw_line_segment_mut(image, (cx + o, cy - half), (cx + o, cy + half), color);
            }
            MarkerShape::TiltedCross => {
                let d = half * std::f32::consts::FRAC_1_SQRT_2;
                draw_line_segment_mut(image, (cx - d + o, cy - d), (cx + d + o, cy + d), color);
                draw_line_segment_mut(image, (cx - d + o, cy + d), (cx + d + o, cy - d), color);
            }
        }
    }
}

/// Copy of `image` with a marker at `p`.
pub fn draw_marker(image: &RgbImage, p: DVec2, style: &MarkerStyle) -> RgbImage {
    let mut out = image.clone();
    draw_marker_mut(&mut out, p, style);
    out
}

/// Copy of `image` with one hollow rectangle per box, coloured by box size,
/// and optionally a cross on each box centroid.
pub fn draw_bboxes(image: &RgbImage, bboxes: &[BoundingBox], draw_centroids: bool) -> RgbImage {
    let mut out = image.clone();
    let min_w = bboxes.iter().map(BoundingBox::width).min().unwrap_or(0);
    let max_w = bboxes.iter().map(BoundingBox::width).max().unwrap_or(0);
    for b in bboxes {
        let t = if max_w > min_w {
            (b.width() - min_w) as f64 / (max_w - min_w) as f64
        } else {
            0.5
        };
        let c = colorous::TURBO.eval_continuous(t);
        let color = [c.r, c.g, c.b];
        if b.width() > 0 && b.height() > 0 {
            let rect = Rect::at(b.x1 as i32, b.y1 as i32).of_size(b.width(), b.height());
            draw_hollow_rect_mut(&mut out, rect, Rgb(color));
        }
        if draw_centroids {
            let style = MarkerStyle {
                color,
                ..Default::default()
            };
            draw_marker_mut(&mut out, b.centroid(), &style);
        }
    }
    out
}

/// Copy of `image` with the aggregated centroid marked: a cross for the mean,
/// a tilted cross for the median. Empty input leaves the image unmarked.
pub fn draw_centroid(image: &RgbImage, bboxes: &[BoundingBox], centroid: Centroid) -> RgbImage {
    let style = match centroid {
        Centroid::Mean => MarkerStyle {
            color: [0, 255, 255],
            ..Default::default()
        },
        Centroid::Median => MarkerStyle {
            color: [0, 0, 0],
            shape: MarkerShape::TiltedCross,
            ..Default::default()
        },
    };
    match centroid.aggregate(bboxes) {
        Some(p) => draw_marker(image, p, &style),
        None => image.clone(),
    }
}

use glam::DVec2;
use image::imageops::FilterType;
use image::{ImageBuffer, Luma, RgbImage, RgbaImage};
use indicatif::ProgressIterator;
use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::BoundingBox;

/// Correlation response, one value per valid template anchor.
pub type ResponseMap = ImageBuffer<Luma<f32>, Vec<f32>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub min_size: u32,
    pub max_size: u32,
    pub size_step: u32,
    pub threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_size: 10,
            max_size: 50,
            size_step: 5,
            threshold: 0.9,
        }
    }
}

/// Multi-scale, alpha-masked template matcher for calibration markers.
pub struct TemplateDetector {
    pub config: DetectorConfig,
}

impl TemplateDetector {
    pub fn new(config: DetectorConfig) -> TemplateDetector {
        TemplateDetector { config }
    }
    pub fn detect(&self, source: &RgbImage, template: &RgbaImage) -> Vec<BoundingBox> {
        detect(
            source,
            template,
            self.config.min_size..self.config.max_size,
            self.config.size_step,
            self.config.threshold,
        )
    }
}

/// A square template at one candidate size: colour planes plus the alpha
/// plane as a weight in `[0, 1]`, replicated over the three channels.
pub struct ScaledTemplate {
    pub rgb: RgbImage,
    pub mask: Vec<f32>,
}

pub fn scaled_template(template: &RgbaImage, size: u32) -> ScaledTemplate {
    let resized = image::imageops::resize(template, size, size, FilterType::Triangle);
    let rgb = RgbImage::from_fn(size, size, |x, y| {
        let p = resized.get_pixel(x, y).0;
        image::Rgb([p[0], p[1], p[2]])
    });
    let mask = resized
        .pixels()
        .flat_map(|p| {
            let a = p.0[3] as f32 / 255.0;
            [a, a, a]
        })
        .collect();
    ScaledTemplate { rgb, mask }
}

struct Tap {
    dx: u32,
    dy: u32,
    tm2: [f32; 3],
    m2: [f32; 3],
}

/// Normalised cross-correlation weighted by the template mask:
///
/// `R(x, y) = sum(T * I * M^2) / sqrt(sum((T * M)^2) * sum((I * M)^2))`
///
/// summed over the template window and all three channels. Returns `None` when
/// the template does not fit inside the source.
pub fn masked_ccorr_normed(source: &RgbImage, template: &ScaledTemplate) -> Option<ResponseMap> {
    let (sw, sh) = source.dimensions();
    let (tw, th) = template.rgb.dimensions();
    if tw == 0 || th == 0 || tw > sw || th > sh {
        return None;
    }
    let out_w = sw - tw + 1;
    let out_h = sh - th + 1;

    let mut taps = Vec::new();
    let mut template_energy = 0.0f32;
    for (x, y, p) in template.rgb.enumerate_pixels() {
        let base = ((y * tw + x) * 3) as usize;
        let mut tap = Tap {
            dx: x,
            dy: y,
            tm2: [0.0; 3],
            m2: [0.0; 3],
        };
        let mut active = false;
        for c in 0..3 {
            let m = template.mask[base + c];
            let t = p.0[c] as f32;
            tap.tm2[c] = t * m * m;
            tap.m2[c] = m * m;
            template_energy += (t * m) * (t * m);
            active |= m > 0.0;
        }
        if active {
            taps.push(tap);
        }
    }

    let src: Vec<f32> = source.as_raw().iter().map(|v| *v as f32).collect();
    let rows: Vec<Vec<f32>> = (0..out_h)
        .into_par_iter()
        .map(|y| {
            (0..out_w)
                .map(|x| {
                    let mut cross = 0.0f32;
                    let mut energy = 0.0f32;
                    for tap in &taps {
                        let base = (((y + tap.dy) * sw + (x + tap.dx)) * 3) as usize;
                        for c in 0..3 {
                            let i = src[base + c];
                            cross += tap.tm2[c] * i;
                            energy += tap.m2[c] * i * i;
                        }
                    }
                    let denom = (template_energy * energy).sqrt();
                    if denom > f32::EPSILON { cross / denom } else { 0.0 }
                })
                .collect()
        })
        .collect();

    ImageBuffer::from_raw(out_w, out_h, rows.concat())
}

/// Scans every square template size in `sizes` (stepped by `size_step`) and
/// returns one box per response at or above `threshold`.
///
/// Boxes come back in discovery order: sizes ascending, then row-major within a
/// size. Overlapping boxes from neighbouring sizes are kept as-is.
pub fn detect(
    source: &RgbImage,
    template: &RgbaImage,
    sizes: std::ops::Range<u32>,
    size_step: u32,
    threshold: f32,
) -> Vec<BoundingBox> {
    let step = if size_step == 0 {
        warn!("template size step of 0 treated as 1");
        1
    } else {
        size_step
    };
    let candidates: Vec<u32> = sizes.step_by(step as usize).filter(|s| *s > 0).collect();
    let mut bboxes = Vec::new();
    for size in candidates.iter().copied().progress_count(candidates.len() as u64) {
        let scaled = scaled_template(template, size);
        let Some(response) = masked_ccorr_normed(source, &scaled) else {
            trace!("template size {} does not fit the source, skipped", size);
            continue;
        };
        let before = bboxes.len();
        for (x, y, v) in response.enumerate_pixels() {
            if v.0[0] >= threshold {
                bboxes.push(BoundingBox::from_anchor(x, y, size, size));
            }
        }
        trace!("size {}: {} boxes", size, bboxes.len() - before);
    }
    debug!("# detected bounding boxes: {}", bboxes.len());
    bboxes
}

/// How raw multi-scale detections are reduced to one landmark position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Centroid {
    Mean,
    #[default]
    Median,
}

impl Centroid {
    pub fn aggregate(&self, bboxes: &[BoundingBox]) -> Option<DVec2> {
        match self {
            Centroid::Mean => mean_centroid(bboxes),
            Centroid::Median => median_centroid(bboxes),
        }
    }
}

pub fn mean_centroid(bboxes: &[BoundingBox]) -> Option<DVec2> {
    if bboxes.is_empty() {
        return None;
    }
    let sum = bboxes.iter().fold(DVec2::ZERO, |acc, b| acc + b.centroid());
    Some(sum / bboxes.len() as f64)
}

/// Per-axis median; even counts average the two middle values.
pub fn median_centroid(bboxes: &[BoundingBox]) -> Option<DVec2> {
    if bboxes.is_empty() {
        return None;
    }
    let xs: Vec<f64> = bboxes.iter().map(|b| b.cx).collect();
    let ys: Vec<f64> = bboxes.iter().map(|b| b.cy).collect();
    Some(DVec2::new(median(xs), median(ys)))
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

use glam::DVec2;
use image::{RgbImage, RgbaImage};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::io::object_from_json;
use crate::template::{Centroid, DetectorConfig, TemplateDetector};
use crate::transform::CalibrationRecord;

/// An explicitly measured landmark pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub vr: DVec2,
    pub img: DVec2,
}

/// A still frame showing the calibration marker at a known VR position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFrame {
    pub image: PathBuf,
    pub vr: DVec2,
}

/// Describes one calibration. Relative paths resolve against the manifest's
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationManifest {
    pub name: String,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub frames: Vec<CalibrationFrame>,
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub centroid: Centroid,
}

/// Detects the marker in each frame and pairs the aggregated centroid with the
/// frame's VR position. Frames without detections are skipped. Returns the
/// number of landmarks added.
pub fn add_frame_landmarks<'a, I>(
    record: &mut CalibrationRecord,
    frames: I,
    template: &RgbaImage,
    detector: &TemplateDetector,
    centroid: Centroid,
) -> usize
where
    I: IntoIterator<Item = (DVec2, &'a RgbImage)>,
{
    let mut added = 0;
    for (i, (vr, frame)) in frames.into_iter().enumerate() {
        let bboxes = detector.detect(frame, template);
        match centroid.aggregate(&bboxes) {
            Some(img) => {
                info!(
                    "calibration frame {}: {} boxes, {:?} centroid ({:.1}, {:.1})",
                    i,
                    bboxes.len(),
                    centroid,
                    img.x,
                    img.y
                );
                record.add_landmark(vr, img);
                added += 1;
            }
            None => warn!("calibration frame {}: marker not found, skipped", i),
        }
    }
    added
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Builds and fits the calibration described by a manifest file.
pub fn calibrate_from_manifest(manifest_path: &Path) -> Result<CalibrationRecord> {
    let manifest: CalibrationManifest = object_from_json(manifest_path)?;
    let base = manifest_path.parent().unwrap_or(Path::new("."));
    let mut record = CalibrationRecord::new(&manifest.name);
    for l in &manifest.landmarks {
        record.add_landmark(l.vr, l.img);
    }

    if !manifest.frames.is_empty() {
        let template_path = manifest.template.as_ref().ok_or_else(|| {
            SyncError::Precondition("calibration frames given without a marker template".to_string())
        })?;
        let template = image::open(resolve(base, template_path))?.to_rgba8();
        let detector = TemplateDetector::new(manifest.detector.clone());
        let mut frames = Vec::with_capacity(manifest.frames.len());
        for f in &manifest.frames {
            frames.push((f.vr, image::open(resolve(base, &f.image))?.to_rgb8()));
        }
        add_frame_landmarks(
            &mut record,
            frames.iter().map(|(vr, img)| (*vr, img)),
            &template,
            &detector,
            manifest.centroid,
        );
    }

    record.fit()?;
    Ok(record)
}

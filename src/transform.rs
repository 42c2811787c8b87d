use glam::DVec2;
use log::info;
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::optimization::{affine_residual, solve_affine_lstsq};

/// Paired calibration landmarks, matched by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub vr_coords: Vec<DVec2>,
    pub img_coords: Vec<DVec2>,
}

impl LandmarkSet {
    pub fn new(vr_coords: Vec<DVec2>, img_coords: Vec<DVec2>) -> LandmarkSet {
        LandmarkSet {
            vr_coords,
            img_coords,
        }
    }
    pub fn push(&mut self, vr: DVec2, img: DVec2) {
        self.vr_coords.push(vr);
        self.img_coords.push(img);
    }
    pub fn len(&self) -> usize {
        self.vr_coords.len().min(self.img_coords.len())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Affine map from homogeneous VR screen coordinates to video pixels.
///
/// Stored as the 3x2 matrix `T` so that `[x, y, 1] * T = [u, v]`.
/// Immutable once fitted; cheap to copy and safe to share across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    matrix: na::Matrix3x2<f64>,
}

impl CoordinateTransform {
    /// Least-squares fit over every landmark pair. No outlier rejection.
    pub fn fit(landmarks: &LandmarkSet) -> Result<CoordinateTransform> {
        let matrix = solve_affine_lstsq(&landmarks.vr_coords, &landmarks.img_coords)?;
        let residual = affine_residual(&matrix, &landmarks.vr_coords, &landmarks.img_coords);
        info!(
            "fitted affine transform from {} landmarks, residual {:.6}",
            landmarks.len(),
            residual
        );
        Ok(CoordinateTransform { matrix })
    }

    pub fn from_matrix(matrix: na::Matrix3x2<f64>) -> CoordinateTransform {
        CoordinateTransform { matrix }
    }

    pub fn matrix(&self) -> &na::Matrix3x2<f64> {
        &self.matrix
    }

    /// Maps a 2- or 3-component point. Two components get a homogeneous 1 appended.
    pub fn apply(&self, point: &[f64]) -> Result<DVec2> {
        let p = match point.len() {
            2 => na::Vector3::new(point[0], point[1], 1.0),
            3 => na::Vector3::new(point[0], point[1], point[2]),
            n => return Err(SyncError::InvalidPoint(n)),
        };
        Ok(self.map(p))
    }

    pub fn apply_point(&self, p: DVec2) -> DVec2 {
        self.map(na::Vector3::new(p.x, p.y, 1.0))
    }

    fn map(&self, p: na::Vector3<f64>) -> DVec2 {
        let out = self.matrix.transpose() * p;
        DVec2::new(out.x, out.y)
    }

    /// Row-major nested form, `[[a, b], [c, d], [tx, ty]]`.
    pub fn to_rows(&self) -> Vec<[f64; 2]> {
        (0..3)
            .map(|r| [self.matrix[(r, 0)], self.matrix[(r, 1)]])
            .collect()
    }

    pub fn from_rows(rows: &[[f64; 2]]) -> Result<CoordinateTransform> {
        if rows.len() != 3 {
            return Err(SyncError::InvalidPoint(rows.len()));
        }
        Ok(CoordinateTransform {
            matrix: na::Matrix3x2::from_fn(|r, c| rows[r][c]),
        })
    }
}

/// Named calibration: the landmarks and, once fitted, the transform they produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub name: Option<String>,
    pub vr_coords: Option<Vec<DVec2>>,
    pub img_coords: Option<Vec<DVec2>>,
    pub transform: Option<Vec<[f64; 2]>>,
}

impl CalibrationRecord {
    pub fn new(name: &str) -> CalibrationRecord {
        CalibrationRecord {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
    pub fn set_vr_coords(mut self, vr_coords: Vec<DVec2>) -> Self {
        self.vr_coords = Some(vr_coords);
        self
    }
    pub fn set_img_coords(mut self, img_coords: Vec<DVec2>) -> Self {
        self.img_coords = Some(img_coords);
        self
    }
    pub fn add_landmark(&mut self, vr: DVec2, img: DVec2) {
        self.vr_coords.get_or_insert_with(Vec::new).push(vr);
        self.img_coords.get_or_insert_with(Vec::new).push(img);
    }

    pub fn landmarks(&self) -> Option<LandmarkSet> {
        match (&self.vr_coords, &self.img_coords) {
            (Some(vr), Some(img)) => Some(LandmarkSet::new(vr.clone(), img.clone())),
            _ => None,
        }
    }

    /// Fits (or re-fits) the transform from the stored landmarks.
    pub fn fit(&mut self) -> Result<CoordinateTransform> {
        let landmarks = self.landmarks().ok_or(SyncError::InsufficientData {
            vr: self.vr_coords.as_ref().map_or(0, Vec::len),
            image: self.img_coords.as_ref().map_or(0, Vec::len),
        })?;
        let transform = CoordinateTransform::fit(&landmarks)?;
        self.transform = Some(transform.to_rows());
        Ok(transform)
    }

    pub fn transform(&self) -> Result<CoordinateTransform> {
        match &self.transform {
            Some(rows) => CoordinateTransform::from_rows(rows),
            None => Err(SyncError::TransformNotFitted),
        }
    }

    /// VR screen coordinates to video-frame pixels.
    pub fn screen_to_frame(&self, point: &[f64]) -> Result<DVec2> {
        self.transform()?.apply(point)
    }
}

use faer::linalg::solvers::SolveLstsqCore;
use log::debug;
use nalgebra as na;

use crate::error::{Result, SyncError};

/// Solves `min ||A T - B||^2` for the 3x2 affine map `T`, where each row of `A`
/// is `[vr.x, vr.y, 1]` and each row of `B` is `[img.x, img.y]`.
///
/// Full-rank systems go through a QR least-squares solve. Rank-deficient or
/// underdetermined systems (collinear landmarks, fewer than three pairs) fall
/// back to the SVD minimum-norm solution with the usual `eps * max(m, n) * s_max`
/// cutoff.
pub fn solve_affine_lstsq(vr: &[glam::DVec2], img: &[glam::DVec2]) -> Result<na::Matrix3x2<f64>> {
    if vr.is_empty() || vr.len() != img.len() {
        return Err(SyncError::InsufficientData {
            vr: vr.len(),
            image: img.len(),
        });
    }
    let n = vr.len();
    let a_na = na::DMatrix::<f64>::from_fn(n, 3, |r, c| homogeneous(&vr[r], c));
    let b_na = na::DMatrix::<f64>::from_fn(n, 2, |r, c| if c == 0 { img[r].x } else { img[r].y });

    let singular_values = a_na.clone().singular_values();
    let s_max = singular_values.max();
    let cutoff = f64::EPSILON * n.max(3) as f64 * s_max;
    let rank = singular_values.iter().filter(|s| **s > cutoff).count();

    if rank == 3 {
        let a: faer::Mat<f64> = faer::Mat::from_fn(n, 3, |r, c| homogeneous(&vr[r], c));
        let mut x: faer::Mat<f64> = faer::Mat::from_fn(n, 2, |r, c| b_na[(r, c)]);
        a.qr()
            .solve_lstsq_in_place_with_conj(faer::Conj::No, x.as_mut());
        Ok(na::Matrix3x2::from_fn(|r, c| *x.get(r, c)))
    } else {
        debug!("landmark matrix has rank {}, using svd minimum-norm solve", rank);
        let svd = a_na.svd(true, true);
        let x = svd.solve(&b_na, cutoff).map_err(SyncError::Solver)?;
        Ok(na::Matrix3x2::from_fn(|r, c| x[(r, c)]))
    }
}

fn homogeneous(p: &glam::DVec2, c: usize) -> f64 {
    match c {
        0 => p.x,
        1 => p.y,
        _ => 1.0,
    }
}

/// Sum of squared residuals of `T` over the landmark pairs.
pub fn affine_residual(t: &na::Matrix3x2<f64>, vr: &[glam::DVec2], img: &[glam::DVec2]) -> f64 {
    vr.iter()
        .zip(img)
        .map(|(v, i)| {
            let p = t.transpose() * na::Vector3::new(v.x, v.y, 1.0);
            (p.x - i.x).powi(2) + (p.y - i.y).powi(2)
        })
        .sum()
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Jacobian builder: the steepest-descent images and the cached
//! `N × 6` matrix used, unchanged, throughout a call's IC inner loop.
//! This is the part of the algorithm that makes the "inverse" in inverse
//! compositional possible: it only depends on the template and the bbox,
//! never on the warped current frame.

use crate::bbox::BBox;
use crate::sampling::sample;
use nalgebra::{DMatrix, DVector};

/// The cached Jacobian of one `track` call: `J` (`N × 6`) and its
/// transpose, built once from the template gradients and reused across
/// every inner iteration.
pub struct Jacobian {
    pub j: DMatrix<f64>,
    pub jt: DMatrix<f64>,
}

impl Jacobian {
    /// Build `J` from the template's Sobel gradients and the bbox's
    /// sample grid. Row `k` (in the grid's row-major enumeration) is
    /// `[gx·x, gy·x, gx·y, gy·y, gx, gy]`, matching the parameter layout
    /// of [`crate::warp::Warp::from_params`].
    pub fn build(gx: &DMatrix<f32>, gy: &DMatrix<f32>, bbox: &BBox) -> Self {
        let grid = bbox.sample_grid();
        let n = grid.len();
        let mut j = DMatrix::<f64>::zeros(n, 6);
        for (k, (x, y)) in grid.points().enumerate() {
            let gx_k = sample(gx, x, y);
            let gy_k = sample(gy, x, y);
            j[(k, 0)] = gx_k * x;
            j[(k, 1)] = gy_k * x;
            j[(k, 2)] = gx_k * y;
            j[(k, 3)] = gy_k * y;
            j[(k, 4)] = gx_k;
            j[(k, 5)] = gy_k;
        }
        let jt = j.transpose();
        Jacobian { j, jt }
    }
}

/// Flatten an `nY × nX` patch into a length-`N` vector in the grid's
/// row-major order, the same order [`Jacobian::build`] uses for its
/// rows. `nalgebra::DMatrix::iter` is column-major, so this must index
/// explicitly rather than iterate the patch directly.
pub fn flatten_row_major(patch: &DMatrix<f64>) -> DVector<f64> {
    let (n_y, n_x) = patch.shape();
    DVector::from_iterator(
        n_y * n_x,
        (0..n_y).flat_map(move |i| (0..n_x).map(move |j| patch[(i, j)])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradients::sobel;

    #[test]
    fn jacobian_has_expected_shape() {
        let template = DMatrix::from_fn(100, 100, |row, col| ((col + 2 * row) % 17) as f32);
        let bbox = BBox::new(20.0, 20.0, 80.0, 80.0);
        let (gx, gy) = sobel(&template);
        let jac = Jacobian::build(&gx, &gy, &bbox);
        let grid = bbox.sample_grid();
        assert_eq!(jac.j.shape(), (grid.len(), 6));
        assert_eq!(jac.jt.shape(), (6, grid.len()));
    }

    #[test]
    fn flatten_row_major_matches_manual_order() {
        let patch = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let flat = flatten_row_major(&patch);
        assert_eq!(flat.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}

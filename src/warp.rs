// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The 2×3 affine warp, represented as a 3×3 homogeneous matrix whose last
//! row is always `[0, 0, 1]`.

use crate::sampling;
use nalgebra::{DMatrix, Matrix3, Vector6};

/// A 2-D affine warp in homogeneous-coordinate form.
///
/// The last row is `[0, 0, 1]` by construction: every public constructor
/// and composition method preserves it, so the affine subspace invariant
/// is structural rather than merely checked after the fact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Warp(Matrix3<f64>);

impl Warp {
    pub fn identity() -> Self {
        Warp(Matrix3::identity())
    }

    /// Build `M(p)` from the six affine parameters:
    /// `[[1+p1, p3, p5], [p2, 1+p4, p6], [0, 0, 1]]`.
    #[rustfmt::skip]
    pub fn from_params(p: &Vector6<f64>) -> Self {
        Warp(Matrix3::new(
            1.0 + p[0], p[2],       p[4],
            p[1],       1.0 + p[3], p[5],
            0.0,        0.0,        1.0,
        ))
    }

    /// The six affine parameters recovered from this warp's matrix.
    pub fn to_params(&self) -> Vector6<f64> {
        let m = &self.0;
        Vector6::new(m.m11 - 1.0, m.m21, m.m12, m.m22 - 1.0, m.m13, m.m23)
    }

    pub fn as_matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Compose `self · other`, i.e. apply `other` first, then `self`.
    pub fn compose(&self, other: &Warp) -> Warp {
        Warp(self.0 * other.0)
    }

    /// The inverse warp, falling back to identity (with a logged warning)
    /// if the matrix is numerically singular — this should not happen for
    /// well-posed incremental updates, but a tracker must never panic on
    /// a degenerate frame.
    pub fn inverse(&self) -> Warp {
        match self.0.try_inverse() {
            Some(inv) => Warp(inv),
            None => {
                log::warn!("warp matrix is not invertible; using identity as fallback");
                Warp::identity()
            }
        }
    }

    /// Frobenius distance to the identity warp, used by callers checking
    /// for a zero-motion fixed point.
    pub fn distance_to_identity(&self) -> f64 {
        (self.0 - Matrix3::identity()).norm()
    }
}

/// Affine warper: produce a new image of the same shape as `image`
/// whose pixel at `(x, y)` equals `sample(image, inverse(warp) * [x, y, 1])`.
///
/// `warp` is interpreted as mapping source coordinates to destination
/// coordinates; the inverse map is used at the destination grid with
/// bilinear interpolation and the same border policy as the sampler.
pub fn warp_image(image: &DMatrix<f32>, warp: &Warp) -> DMatrix<f32> {
    let (height, width) = image.shape();
    let inv = warp.inverse();
    let inv_mat = inv.as_matrix();
    DMatrix::from_fn(height, width, |row, col| {
        let x = col as f64;
        let y = row as f64;
        let src_x = inv_mat.m11 * x + inv_mat.m12 * y + inv_mat.m13;
        let src_y = inv_mat.m21 * x + inv_mat.m22 * y + inv_mat.m23;
        sampling::sample(image, src_x, src_y) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_roundtrips_params() {
        let w = Warp::identity();
        let p = w.to_params();
        assert_relative_eq!(p, Vector6::zeros());
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let p = Vector6::new(0.1, -0.02, 0.03, 0.05, 4.0, -2.0);
        let w = Warp::from_params(&p);
        let composed = w.compose(&w.inverse());
        assert_relative_eq!(*composed.as_matrix(), Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn warp_image_identity_is_a_copy() {
        let img = DMatrix::from_fn(10, 10, |r, c| (r * 10 + c) as f32);
        let warped = warp_image(&img, &Warp::identity());
        assert_relative_eq!(warped, img, epsilon = 1e-6);
    }

    #[test]
    fn warp_image_translation_shifts_pixels() {
        let img = DMatrix::from_fn(20, 20, |r, c| (r + c) as f32);
        // Translate by +2 in x: the warp maps source->dest, so the output
        // pixel at x should read the source pixel at x - 2.
        let p = Vector6::new(0.0, 0.0, 0.0, 0.0, 2.0, 0.0);
        let w = Warp::from_params(&p);
        let warped = warp_image(&img, &w);
        for row in 5..15 {
            for col in 5..15 {
                assert_relative_eq!(warped[(row, col)], img[(row, col - 2)], epsilon = 1e-4);
            }
        }
    }
}

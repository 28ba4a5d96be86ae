// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The tracker facade and the IC iteration driver: hold BBOX and image
//! state, and advance the warp estimate by one frame per call to
//! [`Tracker::track`].

use crate::bbox::{propagate, BBox};
use crate::error::{Error, Result};
use crate::gradients::sobel;
use crate::jacobian::{flatten_row_major, Jacobian};
use crate::sampling::rect_sample;
use crate::warp::{warp_image, Warp};
use nalgebra::{DMatrix, DVector, Vector6};

/// Tunable parameters of the IC iteration driver. Defaults match the
/// inverse-compositional formulation's usual defaults for `track`.
#[derive(Debug, Clone, Copy)]
pub struct TrackConfig {
    pub threshold: f64,
    pub max_iterations: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        TrackConfig {
            threshold: 0.01875,
            max_iterations: 100,
        }
    }
}

/// Observable state of a [`Tracker`]. A transient `Tracking` state has no
/// runtime representation here: Rust's `&mut self` borrow on `track`
/// already makes a reentrant call to the same tracker a compile error,
/// so there is nothing left to check at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Uninitialized,
    Ready,
}

/// A per-pixel diagonal weight callback for the Gauss-Newton normal
/// equations. The default (no callback set) is the identity weighting
/// `D = I`.
pub type WeightFn = dyn Fn(&DVector<f64>) -> DVector<f64>;

/// Single-object affine tracker holding the bounding box and the two
/// most recent frames.
pub struct Tracker {
    bbox: Option<BBox>,
    template_image: Option<DMatrix<f32>>,
    current_image: Option<DMatrix<f32>>,
    weight_fn: Option<Box<WeightFn>>,
}

impl Default for Tracker {
    fn default() -> Self {
        Tracker::new()
    }
}

impl Tracker {
    /// An uninitialized tracker: neither bbox nor images set.
    pub fn new() -> Self {
        Tracker {
            bbox: None,
            template_image: None,
            current_image: None,
            weight_fn: None,
        }
    }

    /// Construct a tracker already in the `Ready` state.
    pub fn with_image_and_bbox(image: DMatrix<f32>, bbox: BBox) -> Result<Self> {
        bbox.validate()?;
        if image.is_empty() {
            return Err(Error::EmptyImage);
        }
        Ok(Tracker {
            bbox: Some(bbox),
            template_image: None,
            current_image: Some(image),
            weight_fn: None,
        })
    }

    pub fn state(&self) -> TrackerState {
        if self.bbox.is_some() && self.current_image.is_some() {
            TrackerState::Ready
        } else {
            TrackerState::Uninitialized
        }
    }

    pub fn set_bbox(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> Result<()> {
        let bbox = BBox::validated(x0, y0, x1, y1)?;
        self.bbox = Some(bbox);
        Ok(())
    }

    pub fn get_bbox(&self) -> Option<BBox> {
        self.bbox
    }

    pub fn set_current_image(&mut self, image: DMatrix<f32>) {
        self.current_image = Some(image);
    }

    pub fn get_current_image(&self) -> Option<&DMatrix<f32>> {
        self.current_image.as_ref()
    }

    pub fn set_template_image(&mut self, image: DMatrix<f32>) {
        self.template_image = Some(image);
    }

    pub fn get_template_image(&self) -> Option<&DMatrix<f32>> {
        self.template_image.as_ref()
    }

    /// Install the per-pixel diagonal weight hook (for M-estimator-style
    /// robust weighting). Pass `None` to revert to the baseline identity
    /// weighting.
    pub fn set_weight_fn(&mut self, weight_fn: Option<Box<WeightFn>>) {
        self.weight_fn = weight_fn;
    }

    fn require_bbox(&self) -> Result<BBox> {
        self.bbox
            .ok_or(Error::BadBBox(BBox::new(0.0, 0.0, 0.0, 0.0), "no bounding box has been set"))
    }

    /// Advance the tracker by one frame.
    ///
    /// `EmptyImage`/`BadBBox` are reported before any iteration begins.
    /// On success, `template_image` becomes the previous `current_image`,
    /// `current_image` becomes `new_frame`, and `bbox` is updated by
    /// propagating the recovered warp through its corners.
    pub fn track(&mut self, new_frame: DMatrix<f32>, config: &TrackConfig) -> Result<()> {
        let bbox = self.require_bbox()?;
        bbox.validate()?;
        if new_frame.is_empty() {
            return Err(Error::EmptyImage);
        }
        let template = self.current_image.take().ok_or(Error::EmptyImage)?;
        if template.is_empty() {
            self.current_image = Some(template);
            return Err(Error::EmptyImage);
        }

        // Precompute the template patch and the cached Jacobian: both
        // depend only on the template and the bbox, never on the warped
        // current frame, so they are built once per call.
        let t_patch = rect_sample(&template, &bbox);
        let t_flat = flatten_row_major(&t_patch);
        let (gx, gy) = sobel(&template);
        let jacobian = Jacobian::build(&gx, &gy, &bbox);
        self.template_image = Some(template);

        let mut warp = Warp::identity();
        let mut last_delta_norm = f64::INFINITY;
        let mut iterations_run = 0usize;

        for n in 0..config.max_iterations {
            iterations_run = n + 1;
            let warped = warp_image(&new_frame, &warp);
            let c_patch = rect_sample(&warped, &bbox);
            let c_flat = flatten_row_major(&c_patch);
            let residual = c_flat - &t_flat;

            let (hessian, b) = match &self.weight_fn {
                Some(weights) => {
                    let d = weights(&residual);
                    let weighted_j = scale_rows(&jacobian.j, &d);
                    let weighted_residual = d.component_mul(&residual);
                    (&jacobian.jt * &weighted_j, &jacobian.jt * weighted_residual)
                }
                None => (&jacobian.jt * &jacobian.j, &jacobian.jt * &residual),
            };

            let delta_p = match hessian.cholesky() {
                Some(chol) => chol.solve(&b),
                None => {
                    log::warn!(
                        "track: Gauss-Newton Hessian singular at iteration {}; keeping current warp",
                        n
                    );
                    break;
                }
            };
            let delta_p = Vector6::from_column_slice(delta_p.as_slice());
            last_delta_norm = delta_p.norm();

            let increment = Warp::from_params(&delta_p);
            warp = warp.compose(&increment.inverse());

            log::trace!("track: iteration {} |delta_p| = {:.6}", n, last_delta_norm);

            if last_delta_norm < config.threshold {
                break;
            }
        }

        log::debug!(
            "track: ran {} iteration(s), final |delta_p| = {:.6}",
            iterations_run,
            last_delta_norm
        );

        self.bbox = Some(propagate(&bbox, &warp));
        self.current_image = Some(new_frame);
        Ok(())
    }
}

/// Scale each row `k` of `m` by `d[k]`, i.e. compute `D · m` for diagonal
/// `D = diag(d)`.
fn scale_rows(m: &DMatrix<f64>, d: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |r, c| m[(r, c)] * d[r])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_image(size: usize) -> DMatrix<f32> {
        DMatrix::from_fn(size, size, |row, col| ((col + 2 * row) % 17) as f32)
    }

    #[test]
    fn uninitialized_tracker_reports_bad_bbox() {
        let mut tracker = Tracker::new();
        let frame = ramp_image(10);
        let err = tracker.track(frame, &TrackConfig::default()).unwrap_err();
        assert!(matches!(err, Error::BadBBox(_, _)));
    }

    #[test]
    fn degenerate_bbox_is_rejected_without_mutating_state() {
        let mut tracker = Tracker::with_image_and_bbox(ramp_image(100), BBox::new(20.0, 20.0, 80.0, 80.0))
            .unwrap();
        let bad = tracker.set_bbox(50.0, 50.0, 50.0, 70.0);
        assert!(bad.is_err());
        // The bbox from construction must be untouched.
        assert_eq!(tracker.get_bbox(), Some(BBox::new(20.0, 20.0, 80.0, 80.0)));
    }

    #[test]
    fn zero_motion_is_a_fixed_point() {
        let image = ramp_image(100);
        let bbox = BBox::new(20.0, 20.0, 80.0, 80.0);
        let mut tracker = Tracker::with_image_and_bbox(image.clone(), bbox).unwrap();
        let config = TrackConfig {
            threshold: 0.01,
            max_iterations: 50,
        };
        tracker.track(image, &config).unwrap();
        let result = tracker.get_bbox().unwrap();
        let dx0 = (result.x0 - bbox.x0) as f64;
        let dy0 = (result.y0 - bbox.y0) as f64;
        let dx1 = (result.x1 - bbox.x1) as f64;
        let dy1 = (result.y1 - bbox.y1) as f64;
        assert_relative_eq!(dx0, 0.0, epsilon = 0.05);
        assert_relative_eq!(dy0, 0.0, epsilon = 0.05);
        assert_relative_eq!(dx1, 0.0, epsilon = 0.05);
        assert_relative_eq!(dy1, 0.0, epsilon = 0.05);
    }

    #[test]
    fn setters_are_idempotent() {
        let mut tracker = Tracker::new();
        tracker.set_bbox(1.0, 2.0, 10.0, 12.0).unwrap();
        assert_eq!(tracker.get_bbox(), Some(BBox::new(1.0, 2.0, 10.0, 12.0)));
    }

    #[test]
    fn single_iteration_budget_is_honored() {
        let image = ramp_image(100);
        let bbox = BBox::new(20.0, 20.0, 80.0, 80.0);
        let mut tracker = Tracker::with_image_and_bbox(image.clone(), bbox).unwrap();
        let config = TrackConfig {
            threshold: 0.0,
            max_iterations: 1,
        };
        // Must return normally even though it cannot possibly converge
        // with threshold 0.0.
        assert!(tracker.track(image, &config).is_ok());
    }

    #[test]
    fn empty_new_frame_is_rejected() {
        let image = ramp_image(100);
        let bbox = BBox::new(20.0, 20.0, 80.0, 80.0);
        let mut tracker = Tracker::with_image_and_bbox(image, bbox).unwrap();
        let empty: DMatrix<f32> = DMatrix::zeros(0, 0);
        let err = tracker.track(empty, &TrackConfig::default()).unwrap_err();
        assert_eq!(err, Error::EmptyImage);
    }
}

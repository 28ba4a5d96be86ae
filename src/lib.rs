// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Inverse compositional affine tracker
//!
//! Single-object visual tracking across consecutive grayscale frames,
//! using the Baker-Matthews Inverse Compositional (IC) algorithm to
//! estimate the 2x3 affine warp that aligns a tracked bounding box
//! between frames. The Jacobian and Hessian are precomputed once per
//! frame from the template and stay constant across inner iterations.

pub mod bbox;
pub mod error;
pub mod gradients;
pub mod interop;
pub mod jacobian;
pub mod sampling;
pub mod tracker;
pub mod warp;

pub use bbox::BBox;
pub use error::Error;
pub use tracker::{TrackConfig, Tracker, TrackerState};
pub use warp::Warp;

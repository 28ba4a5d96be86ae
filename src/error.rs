// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for the tracker's preconditions and runtime edge cases.

use crate::bbox::BBox;

/// Errors reported by the tracker's public operations.
///
/// `EmptyImage`, `BadBBox` and `ChannelMismatch` are preconditions, checked
/// once before any iteration begins. `Singular` is never returned from
/// [`crate::tracker::Tracker::track`]: hitting a singular Hessian mid-loop
/// is logged and the current warp is kept, per the inverse compositional
/// driver's convergence rules.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("image is empty")]
    EmptyImage,

    #[error("bounding box {0:?} is invalid: {1}")]
    BadBBox(BBox, &'static str),

    #[error("expected a single-channel (grayscale) image, found {0:?}")]
    ChannelMismatch(image::ColorType),

    #[error("Gauss-Newton Hessian is singular; warp update skipped")]
    Singular,
}

pub type Result<T> = std::result::Result<T, Error>;

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding box and the sub-pixel sample grid it defines.

use crate::error::{Error, Result};
use crate::warp::Warp;
use nalgebra::Matrix3x2;

/// Axis-aligned rectangle `(x0, y0, x1, y1)` in image pixel coordinates,
/// with `x0 < x1` and `y0 < y1`. x increases rightward, y increases
/// downward, matching the image row/column convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Build a bbox from its four corners, without validating it.
    /// Use [`BBox::validated`] at API boundaries that must reject bad input.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    /// Build a bbox, rejecting non-finite, inverted, or too-small boxes.
    pub fn validated(x0: f32, y0: f32, x1: f32, y1: f32) -> Result<Self> {
        let bbox = BBox::new(x0, y0, x1, y1);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the bbox invariants: finite coordinates, `x0 < x1`, `y0 < y1`,
    /// and both dimensions strictly greater than 2 pixels (otherwise the
    /// sample grid below collapses).
    pub fn validate(&self) -> Result<()> {
        if !self.x0.is_finite() || !self.y0.is_finite() || !self.x1.is_finite() || !self.y1.is_finite()
        {
            return Err(Error::BadBBox(*self, "coordinates must be finite"));
        }
        if self.x1 <= self.x0 || self.y1 <= self.y0 {
            return Err(Error::BadBBox(*self, "x1 must exceed x0 and y1 must exceed y0"));
        }
        if self.width() <= 2.0 || self.height() <= 2.0 {
            return Err(Error::BadBBox(
                *self,
                "width and height must exceed 2 pixels",
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn to_tuple(&self) -> (f32, f32, f32, f32) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    /// The `nY × nX` sample grid spanning the box inclusively:
    /// `nX = floor(W)`, `nY = floor(H)`, `dx = W/(nX-1)`, `dy = H/(nY-1)`.
    pub fn sample_grid(&self) -> SampleGrid {
        let n_x = self.width().floor() as usize;
        let n_y = self.height().floor() as usize;
        let dx = self.width() as f64 / (n_x - 1) as f64;
        let dy = self.height() as f64 / (n_y - 1) as f64;
        SampleGrid {
            x0: self.x0 as f64,
            y0: self.y0 as f64,
            n_x,
            n_y,
            dx,
            dy,
        }
    }

    /// The 3×2 matrix whose columns are the two homogeneous corner points
    /// `(x0, y0, 1)` and `(x1, y1, 1)`, used by the bbox propagator below.
    /// `Matrix3x2::new` fills in row-major reading order, so the rows here
    /// are `[x0, x1]`, `[y0, y1]`, `[1, 1]` to produce those columns.
    fn corners(&self) -> Matrix3x2<f64> {
        Matrix3x2::new(
            self.x0 as f64,
            self.x1 as f64,
            self.y0 as f64,
            self.y1 as f64,
            1.0,
            1.0,
        )
    }
}

/// The regular sub-pixel grid derived from a [`BBox`].
#[derive(Debug, Clone, Copy)]
pub struct SampleGrid {
    pub x0: f64,
    pub y0: f64,
    pub n_x: usize,
    pub n_y: usize,
    pub dx: f64,
    pub dy: f64,
}

impl SampleGrid {
    /// Total number of observations `N = nX · nY`.
    pub fn len(&self) -> usize {
        self.n_x * self.n_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate `(x, y)` sample coordinates in row-major order
    /// (`0 <= i < nY`, `0 <= j < nX`).
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..self.n_y).flat_map(move |i| {
            (0..self.n_x).map(move |j| (self.x0 + j as f64 * self.dx, self.y0 + i as f64 * self.dy))
        })
    }
}

/// BBOX propagator: map the original box's two corners through the
/// final warp to obtain the next bbox.
pub fn propagate(original: &BBox, warp: &Warp) -> BBox {
    let corners = original.corners();
    let mat = warp.as_matrix();
    let new_corners = mat * corners;
    BBox::new(
        new_corners[(0, 0)] as f32,
        new_corners[(1, 0)] as f32,
        new_corners[(0, 1)] as f32,
        new_corners[(1, 1)] as f32,
    )
}

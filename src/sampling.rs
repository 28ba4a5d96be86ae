// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bilinear sub-pixel sampling with symmetric (reflect-101) border
//! extension, and the rectangle sampler built on top of it.

use crate::bbox::BBox;
use nalgebra::DMatrix;

/// Reflects an out-of-range index back into `[0, len)` without repeating
/// the edge sample: `…, 2, 1, 0, 1, 2, …`.
///
/// This is the classic "reflect-101" border used by mirrored convolution:
/// period `2·(len-1)`, folded back whenever it overshoots `len`.
pub fn reflect101(i: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut m = i % period;
    if m < 0 {
        m += period;
    }
    if m >= len as isize {
        m = period - m;
    }
    m as usize
}

/// Bilinearly-interpolated intensity of `image` at real coordinates
/// `(x, y)`, with symmetric border reflection for out-of-range samples.
///
/// `image` must be non-empty; this is a programming error trapped by
/// `debug_assert!` rather than a `Result`, since `sample` runs in the
/// innermost per-pixel loop of the tracker and the public precondition
/// (`EmptyImage`) is already checked once at `track` entry.
pub fn sample<T>(image: &DMatrix<T>, x: f64, y: f64) -> f64
where
    T: Copy,
    f64: From<T>,
{
    debug_assert!(!image.is_empty(), "sample: image must not be empty");
    let (height, width) = image.shape();

    let i = x.floor() as isize;
    let j = y.floor() as isize;
    let dx = x - i as f64;
    let dy = y - j as f64;
    let dx1 = 1.0 - dx;
    let dy1 = 1.0 - dy;

    let col0 = reflect101(i, width);
    let col1 = reflect101(i + 1, width);
    let row0 = reflect101(j, height);
    let row1 = reflect101(j + 1, height);

    let p00 = f64::from(image[(row0, col0)]);
    let p10 = f64::from(image[(row0, col1)]);
    let p01 = f64::from(image[(row1, col0)]);
    let p11 = f64::from(image[(row1, col1)]);

    dx1 * dy1 * p00 + dx * dy1 * p10 + dx1 * dy * p01 + dx * dy * p11
}

/// Rectangle sampler: extract the `nY × nX` patch described by
/// `bbox`'s sample grid, each entry obtained via [`sample`].
pub fn rect_sample(image: &DMatrix<f32>, bbox: &BBox) -> DMatrix<f64> {
    let grid = bbox.sample_grid();
    DMatrix::from_iterator(grid.n_y, grid.n_x, column_major_sampled(image, &grid))
}

/// `DMatrix::from_iterator` fills column-major, so sample with `x` (the
/// column index) in the outer loop and `y` in the inner loop; the
/// resulting matrix still indexes as `patch[(i, j)]`.
fn column_major_sampled<'a>(
    image: &'a DMatrix<f32>,
    grid: &'a crate::bbox::SampleGrid,
) -> impl Iterator<Item = f64> + 'a {
    (0..grid.n_x).flat_map(move |j| {
        (0..grid.n_y).map(move |i| {
            let x = grid.x0 + j as f64 * grid.dx;
            let y = grid.y0 + i as f64 * grid.dy;
            sample(image, x, y)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> DMatrix<f32> {
        DMatrix::from_fn(10, 10, |row, col| (col as f32 + 2.0 * row as f32) % 17.0)
    }

    #[test]
    fn exact_at_integer_coordinates() {
        let img = ramp();
        for row in 1..9 {
            for col in 1..9 {
                let v = sample(&img, col as f64, row as f64);
                assert_relative_eq!(v, img[(row, col)] as f64, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn reflects_symmetrically_at_borders() {
        let img = ramp();
        for k in 1..5isize {
            let left = sample(&img, -(k as f64), 0.0);
            let right = sample(&img, k as f64, 0.0);
            assert_relative_eq!(left, right, epsilon = 1e-12);
        }
    }

    #[test]
    fn reflect101_matches_mirror_sequence() {
        // For a length-5 axis, indices …,-2,-1,0,1,2,3,4,5,6,… reflect to
        // …,2,1,0,1,2,3,4,3,2,…
        let expected = [2, 1, 0, 1, 2, 3, 4, 3, 2];
        for (offset, &exp) in expected.iter().enumerate() {
            let i = offset as isize - 2;
            assert_eq!(reflect101(i, 5), exp, "index {}", i);
        }
    }

    #[test]
    fn rect_sample_matches_manual_grid() {
        let img = ramp();
        let bbox = BBox::new(1.0, 1.0, 8.0, 8.0);
        let patch = rect_sample(&img, &bbox);
        let grid = bbox.sample_grid();
        assert_eq!(patch.shape(), (grid.n_y, grid.n_x));
        assert_relative_eq!(patch[(0, 0)], sample(&img, 1.0, 1.0), epsilon = 1e-12);
    }
}

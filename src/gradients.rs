// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gradient producer: a 3×3 Sobel-like kernel with symmetric border
//! reflection, producing `Gx`/`Gy` at the same resolution and element
//! type as the input.

use crate::sampling::reflect101;
use nalgebra::DMatrix;

#[rustfmt::skip]
const SOBEL_X: [[f32; 3]; 3] = [
    [-1.0, 0.0, 1.0],
    [-2.0, 0.0, 2.0],
    [-1.0, 0.0, 1.0],
];

#[rustfmt::skip]
const SOBEL_Y: [[f32; 3]; 3] = [
    [-1.0, -2.0, -1.0],
    [ 0.0,  0.0,  0.0],
    [ 1.0,  2.0,  1.0],
];

/// Compute the horizontal and vertical Sobel gradients of `image`, with
/// reflect-101 border extension so the output has the same shape as the
/// input.
pub fn sobel(image: &DMatrix<f32>) -> (DMatrix<f32>, DMatrix<f32>) {
    let (height, width) = image.shape();
    let gx = convolve3x3(image, height, width, &SOBEL_X);
    let gy = convolve3x3(image, height, width, &SOBEL_Y);
    (gx, gy)
}

fn convolve3x3(
    image: &DMatrix<f32>,
    height: usize,
    width: usize,
    kernel: &[[f32; 3]; 3],
) -> DMatrix<f32> {
    DMatrix::from_fn(height, width, |row, col| {
        let mut acc = 0.0f32;
        for (kr, krow) in kernel.iter().enumerate() {
            let r = reflect101(row as isize + kr as isize - 1, height);
            for (kc, &weight) in krow.iter().enumerate() {
                let c = reflect101(col as isize + kc as isize - 1, width);
                acc += weight * image[(r, c)];
            }
        }
        acc
    })
}

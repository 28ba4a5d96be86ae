// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversions between `image` crate buffers and the tracker's internal
//! `DMatrix<f32>` representation. Decoding and color conversion proper
//! are out of scope; this module only bridges an already-decoded
//! grayscale image into the tracker's data model.

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use nalgebra::DMatrix;

/// Convert a decoded 8-bit grayscale image into the tracker's image
/// representation, promoting each sample to `f32` (images are converted
/// to single-precision float internally). Inverse of [`to_gray_image`].
pub fn from_gray_image(img: &GrayImage) -> DMatrix<f32> {
    let (width, height) = img.dimensions();
    let floats: Vec<f32> = img.as_raw().iter().map(|&v| v as f32).collect();
    DMatrix::from_row_slice(height as usize, width as usize, &floats)
}

/// Convert a `DynamicImage` into the tracker's representation, rejecting
/// anything that is not single-channel (`ChannelMismatch`).
pub fn from_dynamic_image(img: &DynamicImage) -> Result<DMatrix<f32>> {
    match img {
        DynamicImage::ImageLuma8(gray) => Ok(from_gray_image(gray)),
        DynamicImage::ImageLuma16(gray16) => {
            let (width, height) = gray16.dimensions();
            let floats: Vec<f32> = gray16.as_raw().iter().map(|&v| v as f32).collect();
            Ok(DMatrix::from_row_slice(height as usize, width as usize, &floats))
        }
        other => Err(Error::ChannelMismatch(other.color())),
    }
}

/// Convert a tracker image back into a displayable 8-bit grayscale image,
/// clamping to `[0, 255]`. Useful for tests and visual debugging; not
/// part of the core tracking contract.
pub fn to_gray_image(mat: &DMatrix<f32>) -> GrayImage {
    let (nb_rows, nb_cols) = mat.shape();
    let mut img_buf: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::new(nb_cols as u32, nb_rows as u32);
    for (x, y, pixel) in img_buf.enumerate_pixels_mut() {
        let v = mat[(y as usize, x as usize)].clamp(0.0, 255.0) as u8;
        *pixel = Luma([v]);
    }
    img_buf
}

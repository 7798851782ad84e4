//! Intensity conversion for detector input.
//!
//! Both detectors work on a single 8-bit intensity channel. Color images
//! are reduced with the `image` crate's luminance weights; 16-bit and
//! floating point samples are rescaled to 0-255 on the way.

use image::{DynamicImage, GrayImage};

/// Reduce any supported image to one 8-bit intensity channel.
///
/// 8-bit grayscale input is copied unchanged. The caller's image is never
/// modified.
#[must_use = "returns the intensity image"]
pub fn to_intensity(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

//! Gaussian smoothing ahead of hysteresis edge detection.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. The hysteresis detector
//! always uses [`HYSTERESIS_SIGMA`], the standard deviation a 5x5 Gaussian
//! kernel gets when the sigma is derived from the kernel size
//! (`0.3 * ((5 - 1) * 0.5 - 1) + 0.8`).

use image::GrayImage;

/// Fixed blur applied by the hysteresis detector.
pub const HYSTERESIS_SIGMA: f32 = 1.1;

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn non_positive_sigma_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(gaussian_blur(&img, 0.0), img);
        assert_eq!(gaussian_blur(&img, -1.0), img);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let blurred = gaussian_blur(&img, HYSTERESIS_SIGMA);
        assert_eq!(blurred.width(), 17);
        assert_eq!(blurred.height(), 31);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur(&sharp_edge_image(), HYSTERESIS_SIGMA);
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(left_of_edge > 0, "got {left_of_edge}");
        assert!(right_of_edge < 255, "got {right_of_edge}");
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let img = GrayImage::from_fn(10, 10, |_, _| image::Luma([128]));
        let blurred = gaussian_blur(&img, HYSTERESIS_SIGMA);
        for pixel in blurred.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(diff.abs() <= 1, "got {}", pixel.0[0]);
        }
    }
}

//! Gradient-magnitude threshold ("sobel-style") edge detection.
//!
//! Horizontal and vertical first derivatives come from separable Sobel
//! kernels of any odd aperture up to [`MAX_KERNEL_SIZE`]: a binomial
//! smoothing kernel across the derivative direction and a central
//! difference convolved with a shorter binomial along it. Aperture 1 is
//! the bare `[-1, 0, 1]` difference without smoothing. Borders reflect
//! without repeating the edge pixel (`dcb|abcd|cba`).
//!
//! The magnitude `sqrt(gx^2 + gy^2)` is scaled so the image's strongest
//! gradient maps to 255, truncated to an integer, and compared against
//! the threshold. An image with no gradient at all (constant intensity)
//! yields an empty mask.

use image::{GrayImage, Luma};

use crate::types::{EDGE, EdgeError, MAX_KERNEL_SIZE};

/// Separable Sobel kernel pair for one derivative direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SobelKernels {
    /// Applied along the derivative axis.
    pub derivative: Vec<f64>,
    /// Applied across the derivative axis.
    pub smoothing: Vec<f64>,
}

impl SobelKernels {
    /// Kernels for an odd aperture in `1..=31`.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::InvalidKernelSize`] for zero, even, or
    /// oversized apertures.
    pub fn new(kernel_size: u32) -> Result<Self, EdgeError> {
        if kernel_size == 0 || kernel_size % 2 == 0 || kernel_size > MAX_KERNEL_SIZE {
            return Err(EdgeError::InvalidKernelSize(kernel_size));
        }
        if kernel_size == 1 {
            return Ok(Self {
                derivative: vec![-1.0, 0.0, 1.0],
                smoothing: vec![1.0],
            });
        }
        let size = kernel_size as usize;
        Ok(Self {
            derivative: convolve(&[-1.0, 0.0, 1.0], &binomial(size - 2)),
            smoothing: binomial(size),
        })
    }
}

/// Row `len - 1` of Pascal's triangle.
fn binomial(len: usize) -> Vec<f64> {
    let mut row = vec![1.0];
    for _ in 1..len {
        let mut next = vec![1.0; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    row
}

/// Full 1D convolution.
fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &av) in a.iter().enumerate() {
        for (j, &bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

/// Map an out-of-range index back into `0..len` by mirroring about the
/// first and last elements without repeating them.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
const fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let wrapped = index.rem_euclid(period);
    if wrapped >= len as isize {
        (period - wrapped) as usize
    } else {
        wrapped as usize
    }
}

/// A row-major `f64` plane.
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data: image.as_raw().iter().map(|&v| f64::from(v)).collect(),
        }
    }

    /// Correlate every row with `kernel` (centered).
    #[allow(clippy::cast_possible_wrap)]
    fn filter_rows(&self, kernel: &[f64]) -> Self {
        let half = (kernel.len() / 2) as isize;
        let mut data = vec![0.0; self.data.len()];
        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            for x in 0..self.width {
                let mut acc = 0.0;
                for (k, &weight) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - half, self.width);
                    acc += weight * row[sx];
                }
                data[y * self.width + x] = acc;
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Correlate every column with `kernel` (centered).
    #[allow(clippy::cast_possible_wrap)]
    fn filter_cols(&self, kernel: &[f64]) -> Self {
        let half = (kernel.len() / 2) as isize;
        let mut data = vec![0.0; self.data.len()];
        for y in 0..self.height {
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - half, self.height);
                let src = &self.data[sy * self.width..(sy + 1) * self.width];
                let dst = &mut data[y * self.width..(y + 1) * self.width];
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d += weight * s;
                }
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Per-pixel gradient magnitude using Sobel kernels of `kernel_size`.
///
/// # Errors
///
/// Returns [`EdgeError::InvalidKernelSize`] for an unusable aperture.
pub fn gradient_magnitude(image: &GrayImage, kernel_size: u32) -> Result<Vec<f64>, EdgeError> {
    let kernels = SobelKernels::new(kernel_size)?;
    let plane = Plane::from_gray(image);
    if plane.data.is_empty() {
        return Ok(Vec::new());
    }
    let gx = plane
        .filter_rows(&kernels.derivative)
        .filter_cols(&kernels.smoothing);
    let gy = plane
        .filter_rows(&kernels.smoothing)
        .filter_cols(&kernels.derivative);
    Ok(gx
        .data
        .iter()
        .zip(&gy.data)
        .map(|(h, v)| h.hypot(*v))
        .collect())
}

/// Threshold the normalized gradient magnitude of an intensity image.
///
/// Returns a 0/255 raster where the magnitude, rescaled so the maximum is
/// 255 and truncated, is strictly greater than `threshold`.
///
/// # Errors
///
/// Returns [`EdgeError::InvalidKernelSize`] for an unusable aperture.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn gradient_edges(
    image: &GrayImage,
    kernel_size: u32,
    threshold: u8,
) -> Result<GrayImage, EdgeError> {
    let magnitude = gradient_magnitude(image, kernel_size)?;
    let max = magnitude.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Ok(GrayImage::new(image.width(), image.height()));
    }

    let width = image.width() as usize;
    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let m = magnitude[y as usize * width + x as usize];
        let normalized = (m / max * 255.0) as u8;
        Luma([if normalized > threshold { EDGE } else { 0 }])
    }))
}

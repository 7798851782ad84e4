//! Content-addressed cache keys for edge masks.
//!
//! A [`Fingerprint`] digests an image's shape, sample type, and a sparse
//! grid of its pixels together with the detection parameters. The grid
//! stride along each axis is `max(1, dimension / 100)`, so a 1000x1000
//! image contributes roughly 100x100 pixels regardless of its size.
//!
//! Sparse sampling is an approximation: two images that agree on shape,
//! sample type, and every sampled pixel get the same fingerprint even if
//! they differ elsewhere, and the cache will return the first image's mask
//! for the second.
//!
//! The digest is 128-bit SipHash-1-3 with fixed keys. It depends only on
//! the bytes fed to it, so fingerprints are stable across runs and
//! processes.

use std::fmt;
use std::hash::Hasher;

use image::{ColorType, DynamicImage};
use serde::{Serialize, Serializer};
use siphasher::sip128::{Hasher128, SipHasher13};

use crate::types::DetectionParams;

/// Number of samples taken along each axis (approximately).
pub const SAMPLES_PER_AXIS: u32 = 100;

/// Opaque 128-bit cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Raw digest value.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Grid stride for one axis: `max(1, dimension / 100)`.
#[must_use]
pub const fn sample_stride(dimension: u32) -> u32 {
    let stride = dimension / SAMPLES_PER_AXIS;
    if stride == 0 { 1 } else { stride }
}

/// Array shape of an image: `[height, width]` for single-channel images,
/// `[height, width, channels]` otherwise.
#[must_use]
pub fn image_shape(image: &DynamicImage) -> Vec<u64> {
    let channels = image.color().channel_count();
    let mut shape = vec![u64::from(image.height()), u64::from(image.width())];
    if channels > 1 {
        shape.push(u64::from(channels));
    }
    shape
}

/// Name of the per-channel sample type.
#[must_use]
pub const fn element_type(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => "u8",
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => "u16",
        ColorType::Rgb32F | ColorType::Rgba32F => "f32",
        _ => "unknown",
    }
}

/// Compute the cache key for detecting edges in `image` with `params`.
///
/// Callers must not pass an empty image; the detectors reject those before
/// fingerprinting.
#[must_use]
pub fn fingerprint(image: &DynamicImage, params: &DetectionParams) -> Fingerprint {
    let mut hasher = SipHasher13::new();

    let shape = image_shape(image);
    write_len(&mut hasher, shape.len());
    for dim in shape {
        hasher.write(&dim.to_le_bytes());
    }

    write_field(&mut hasher, element_type(image.color()).as_bytes());

    write_samples(&mut hasher, image);

    write_field(&mut hasher, params.method().name().as_bytes());
    match *params {
        DetectionParams::Hysteresis {
            low_threshold,
            high_threshold,
        } => {
            hasher.write(&low_threshold.to_bits().to_le_bytes());
            hasher.write(&high_threshold.to_bits().to_le_bytes());
        }
        DetectionParams::Gradient {
            kernel_size,
            threshold,
        } => {
            hasher.write(&kernel_size.to_le_bytes());
            hasher.write(&[threshold]);
        }
    }

    Fingerprint(hasher.finish128().as_u128())
}

/// Feed every channel byte of each pixel on the sampling grid, row-major.
fn write_samples(hasher: &mut SipHasher13, image: &DynamicImage) {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let bytes_per_pixel = usize::from(image.color().bytes_per_pixel());
    let row_stride = sample_stride(image.height()) as usize;
    let col_stride = sample_stride(image.width()) as usize;
    let raw = image.as_bytes();

    let sample_count = height.div_ceil(row_stride) * width.div_ceil(col_stride);
    write_len(hasher, sample_count * bytes_per_pixel);

    for row in (0..height).step_by(row_stride) {
        for col in (0..width).step_by(col_stride) {
            let start = (row * width + col) * bytes_per_pixel;
            if let Some(pixel) = raw.get(start..start + bytes_per_pixel) {
                hasher.write(pixel);
            }
        }
    }
}

fn write_len(hasher: &mut SipHasher13, len: usize) {
    hasher.write(&(len as u64).to_le_bytes());
}

fn write_field(hasher: &mut SipHasher13, bytes: &[u8]) {
    write_len(hasher, bytes.len());
    hasher.write(bytes);
}

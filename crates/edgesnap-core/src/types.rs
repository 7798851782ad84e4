//! Shared types for the edgesnap edge-detection core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Re-export `DynamicImage` so downstream crates can hand images to the
/// detectors without depending on `image` directly.
pub use image::DynamicImage;

/// Re-export `GrayImage` so downstream crates can read edge masks as
/// raster data without depending on `image` directly.
pub use image::GrayImage;

/// Default number of edge masks kept in an [`EdgeMaskCache`](crate::EdgeMaskCache).
pub const DEFAULT_CACHE_SIZE: usize = 10;

/// Largest Sobel aperture accepted by the gradient detector.
pub const MAX_KERNEL_SIZE: u32 = 31;

/// Pixel value marking an edge in an [`EdgeMask`].
pub const EDGE: u8 = 255;

/// Edge detection algorithm.
///
/// Parsed case-insensitively from strings. The historical names `canny`
/// and `sobel` are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMethod {
    /// Blur, Sobel gradients, non-maximum suppression, two-threshold
    /// hysteresis ("canny-style").
    Hysteresis,
    /// Normalized gradient magnitude compared against a single threshold
    /// ("sobel-style").
    Gradient,
}

impl EdgeMethod {
    /// All methods, in a stable order.
    pub const ALL: [Self; 2] = [Self::Hysteresis, Self::Gradient];

    /// Canonical lowercase name, also used when fingerprinting.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hysteresis => "hysteresis",
            Self::Gradient => "gradient",
        }
    }

    /// Parameters used when the caller does not supply any.
    #[must_use]
    pub const fn default_params(self) -> DetectionParams {
        match self {
            Self::Hysteresis => DetectionParams::Hysteresis {
                low_threshold: DetectionParams::DEFAULT_LOW_THRESHOLD,
                high_threshold: DetectionParams::DEFAULT_HIGH_THRESHOLD,
            },
            Self::Gradient => DetectionParams::Gradient {
                kernel_size: DetectionParams::DEFAULT_KERNEL_SIZE,
                threshold: DetectionParams::DEFAULT_GRADIENT_THRESHOLD,
            },
        }
    }
}

impl fmt::Display for EdgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EdgeMethod {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hysteresis" | "canny" => Ok(Self::Hysteresis),
            "gradient" | "sobel" => Ok(Self::Gradient),
            _ => Err(EdgeError::UnknownMethod(s.to_owned())),
        }
    }
}

/// Algorithm choice plus its numeric parameters.
///
/// Two values compare equal only if every parameter is exactly equal; the
/// fingerprint hashes the exact bit patterns, so `50.0` and `50.000_004`
/// address different cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DetectionParams {
    /// Parameters for the hysteresis detector.
    ///
    /// `low_threshold <= high_threshold` is a precondition. A low
    /// threshold above the high one is clamped down to it.
    Hysteresis {
        /// Gradient magnitude above which a pixel is an edge only if it is
        /// connected to a definite edge.
        low_threshold: f32,
        /// Gradient magnitude above which a pixel is a definite edge.
        high_threshold: f32,
    },
    /// Parameters for the gradient-threshold detector.
    Gradient {
        /// Odd Sobel aperture in `1..=31`.
        kernel_size: u32,
        /// Pixels whose normalized magnitude (0-255) exceeds this value
        /// are edges.
        threshold: u8,
    },
}

impl DetectionParams {
    /// Default hysteresis low threshold.
    pub const DEFAULT_LOW_THRESHOLD: f32 = 50.0;
    /// Default hysteresis high threshold.
    pub const DEFAULT_HIGH_THRESHOLD: f32 = 150.0;
    /// Default Sobel aperture for the gradient detector.
    pub const DEFAULT_KERNEL_SIZE: u32 = 3;
    /// Default normalized-magnitude threshold for the gradient detector.
    pub const DEFAULT_GRADIENT_THRESHOLD: u8 = 100;

    /// Hysteresis parameters.
    #[must_use]
    pub const fn hysteresis(low_threshold: f32, high_threshold: f32) -> Self {
        Self::Hysteresis {
            low_threshold,
            high_threshold,
        }
    }

    /// Gradient-threshold parameters.
    #[must_use]
    pub const fn gradient(kernel_size: u32, threshold: u8) -> Self {
        Self::Gradient {
            kernel_size,
            threshold,
        }
    }

    /// The algorithm these parameters belong to.
    #[must_use]
    pub const fn method(&self) -> EdgeMethod {
        match self {
            Self::Hysteresis { .. } => EdgeMethod::Hysteresis,
            Self::Gradient { .. } => EdgeMethod::Gradient,
        }
    }

    /// Check argument constraints that the detectors cannot recover from.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::InvalidKernelSize`] if a gradient kernel size is
    /// zero, even, or larger than [`MAX_KERNEL_SIZE`].
    pub fn validate(&self) -> Result<(), EdgeError> {
        match *self {
            Self::Hysteresis { .. } => Ok(()),
            Self::Gradient { kernel_size, .. } => {
                if kernel_size == 0 || kernel_size % 2 == 0 || kernel_size > MAX_KERNEL_SIZE {
                    Err(EdgeError::InvalidKernelSize(kernel_size))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A binary edge map with the same width and height as its source image.
///
/// Edge pixels hold [`EDGE`] (255); everything else is 0. Masks are
/// immutable once produced and are shared as `Arc<EdgeMask>` between the
/// cache and its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMask(GrayImage);

impl EdgeMask {
    /// Wrap a raster as a mask, treating every nonzero pixel as an edge.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            image::Luma([if image.get_pixel(x, y).0[0] > 0 { EDGE } else { 0 }])
        }))
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            image::Luma([if f(x, y) { EDGE } else { 0 }])
        }))
    }

    /// An all-background mask.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Whether `(x, y)` is an edge pixel. Out-of-bounds coordinates are not.
    #[must_use]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.0.get_pixel(x, y).0[0] > 0
    }

    /// Number of edge pixels.
    #[must_use]
    pub fn edge_pixel_count(&self) -> u64 {
        self.0.pixels().map(|p| u64::from(p.0[0] > 0)).sum()
    }

    /// Borrow the underlying 0/255 raster.
    #[must_use]
    pub const fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// Consume the mask and return the underlying raster.
    #[must_use]
    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

/// Coordinates of an edge pixel: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgePoint {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl EdgePoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Exact squared Euclidean distance to a (possibly out-of-bounds) query.
    #[must_use]
    pub fn distance_squared_to(self, query: (i64, i64)) -> i64 {
        let dx = i64::from(self.x) - query.0;
        let dy = i64::from(self.y) - query.1;
        dx * dx + dy * dy
    }

    /// Euclidean distance to a query coordinate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance_to(self, query: (i64, i64)) -> f64 {
        (self.distance_squared_to(query) as f64).sqrt()
    }
}

/// Errors reported by the edge detection core.
///
/// All of these are caller errors. They are raised before any cache
/// state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeError {
    /// The method name is not one of the supported detectors.
    #[error("unsupported edge detection method: {0:?}")]
    UnknownMethod(String),

    /// Explicit parameters were given for a different method than requested.
    #[error("parameters for {params} cannot be used with method {requested}")]
    MethodMismatch {
        /// Method named by the caller.
        requested: EdgeMethod,
        /// Method the supplied parameters belong to.
        params: EdgeMethod,
    },

    /// Gradient kernel size is zero, even, or too large.
    #[error("kernel size must be odd and in 1..={MAX_KERNEL_SIZE}, got {0}")]
    InvalidKernelSize(u32),

    /// The image has zero width or height.
    #[error("input image is empty")]
    EmptyImage,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("Hysteresis".parse::<EdgeMethod>(), Ok(EdgeMethod::Hysteresis));
        assert_eq!("GRADIENT".parse::<EdgeMethod>(), Ok(EdgeMethod::Gradient));
        assert_eq!("Canny".parse::<EdgeMethod>(), Ok(EdgeMethod::Hysteresis));
        assert_eq!(" sobel ".parse::<EdgeMethod>(), Ok(EdgeMethod::Gradient));
    }

    #[test]
    fn method_parse_rejects_unknown_names() {
        assert_eq!(
            "laplacian".parse::<EdgeMethod>(),
            Err(EdgeError::UnknownMethod("laplacian".to_string())),
        );
        assert!("".parse::<EdgeMethod>().is_err());
    }

    #[test]
    fn method_display_round_trips_through_parse() {
        for method in EdgeMethod::ALL {
            assert_eq!(method.to_string().parse::<EdgeMethod>(), Ok(method));
        }
    }

    #[test]
    fn default_params_match_method() {
        for method in EdgeMethod::ALL {
            assert_eq!(method.default_params().method(), method);
        }
        assert_eq!(
            EdgeMethod::Hysteresis.default_params(),
            DetectionParams::hysteresis(50.0, 150.0),
        );
        assert_eq!(
            EdgeMethod::Gradient.default_params(),
            DetectionParams::gradient(3, 100),
        );
    }

    #[test]
    fn kernel_size_validation() {
        for k in [1, 3, 5, 7, 31] {
            assert_eq!(DetectionParams::gradient(k, 100).validate(), Ok(()));
        }
        for k in [0, 2, 4, 33] {
            assert_eq!(
                DetectionParams::gradient(k, 100).validate(),
                Err(EdgeError::InvalidKernelSize(k)),
            );
        }
        assert_eq!(DetectionParams::hysteresis(200.0, 100.0).validate(), Ok(()));
    }

    #[test]
    fn params_serde_round_trip_is_tagged() {
        let params = DetectionParams::gradient(5, 42);
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"method\":\"gradient\""), "got {json}");
        let back: DetectionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn mask_from_gray_binarizes() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(1, 0, image::Luma([7]));
        img.put_pixel(2, 1, image::Luma([255]));
        let mask = EdgeMask::from_gray(&img);
        assert!(mask.is_edge(1, 0));
        assert!(mask.is_edge(2, 1));
        assert!(!mask.is_edge(0, 0));
        assert_eq!(mask.as_gray().get_pixel(1, 0).0[0], EDGE);
        assert_eq!(mask.edge_pixel_count(), 2);
    }

    #[test]
    fn mask_is_edge_out_of_bounds_is_false() {
        let mask = EdgeMask::from_fn(4, 4, |_, _| true);
        assert!(!mask.is_edge(4, 0));
        assert!(!mask.is_edge(0, 4));
        assert_eq!(mask.edge_pixel_count(), 16);
    }

    #[test]
    fn point_distances() {
        let p = EdgePoint::new(5, 5);
        assert_eq!(p.distance_squared_to((8, 5)), 9);
        assert_eq!(p.distance_squared_to((-1, 5)), 36);
        assert!((p.distance_to((8, 9)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn error_display() {
        let err = EdgeError::MethodMismatch {
            requested: EdgeMethod::Gradient,
            params: EdgeMethod::Hysteresis,
        };
        assert_eq!(
            err.to_string(),
            "parameters for hysteresis cannot be used with method gradient",
        );
        assert_eq!(
            EdgeError::InvalidKernelSize(4).to_string(),
            "kernel size must be odd and in 1..=31, got 4",
        );
    }
}

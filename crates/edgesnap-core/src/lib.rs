//! edgesnap-core: cached edge detection and nearest-edge queries (sans-IO).
//!
//! An annotation tool asks for the edges of the image being labelled,
//! then snaps each click to the closest edge pixel. Recomputing edges on
//! every click is too slow, so masks are cached by a fingerprint of the
//! image and the detection parameters:
//!
//! ```text
//! detect(image, params)
//!   -> fingerprint(image, params)
//!   -> cache hit?  return shared mask
//!   -> cache miss: grayscale -> detector -> store (evicting LRU) -> return
//! nearest_point(mask, click, radius) -> Option<EdgePoint>
//! ```
//!
//! This crate has **no I/O dependencies**. It works on in-memory
//! [`DynamicImage`]s and returns structured data. Persisted preferences live
//! in `edgesnap-settings`.

pub mod blur;
pub mod cache;
pub mod detector;
pub mod fingerprint;
pub mod gradient;
pub mod grayscale;
pub mod hysteresis;
pub mod points;
pub mod shared;
pub mod types;

pub use cache::{CacheStats, EdgeMaskCache};
pub use detector::{EdgeDetector, resolve_params};
pub use fingerprint::{Fingerprint, fingerprint};
pub use points::{extract_points, nearest_point};
pub use shared::SharedEdgeDetector;
pub use types::{
    DEFAULT_CACHE_SIZE, DetectionParams, DynamicImage, EdgeError, EdgeMask, EdgeMethod, EdgePoint,
    GrayImage,
};

use std::sync::Arc;

/// Detect edges with the process-wide detector.
///
/// Convenience for application entry points; see [`shared::global`].
/// `method` is matched case-insensitively; `None` parameters select the
/// method's defaults.
///
/// # Errors
///
/// Returns [`EdgeError::UnknownMethod`] for an unrecognized method name,
/// plus the errors of [`EdgeDetector::detect`].
pub fn detect_edges(
    image: &DynamicImage,
    method: &str,
    params: Option<DetectionParams>,
) -> Result<Arc<EdgeMask>, EdgeError> {
    shared::global().detect_edges(image, method, params)
}

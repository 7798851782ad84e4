//! Cache-aware edge detectors.
//!
//! [`EdgeDetector`] owns an [`EdgeMaskCache`] and runs one of the two
//! detection algorithms on request:
//!
//! - **Hysteresis**: intensity -> fixed Gaussian blur -> Sobel gradients ->
//!   non-maximum suppression -> two-threshold hysteresis.
//! - **Gradient**: intensity -> Sobel gradients of the requested aperture ->
//!   normalized magnitude -> single threshold.
//!
//! With `use_cache` set, the image and parameters are fingerprinted first
//! and a cached mask is returned on a hit. On a miss the computed mask is
//! stored before it is returned. Argument errors are reported before the
//! cache is touched.

use std::sync::Arc;

use image::DynamicImage;

use crate::blur::{HYSTERESIS_SIGMA, gaussian_blur};
use crate::cache::{CacheStats, EdgeMaskCache};
use crate::fingerprint::fingerprint;
use crate::gradient::gradient_edges;
use crate::grayscale::to_intensity;
use crate::hysteresis::hysteresis_edges;
use crate::types::{DEFAULT_CACHE_SIZE, DetectionParams, EdgeError, EdgeMask, EdgeMethod};

/// Edge detection with a private, bounded result cache.
///
/// Construct one per consumer and pass it where it is needed; tests get
/// an isolated cache by building their own.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    cache: EdgeMaskCache,
}

impl EdgeDetector {
    /// Detector with a cache of [`DEFAULT_CACHE_SIZE`] masks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_SIZE)
    }

    /// Detector whose cache holds at most `max_size` masks.
    #[must_use]
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            cache: EdgeMaskCache::new(max_size),
        }
    }

    /// Read-only access to the cache.
    #[must_use]
    pub const fn cache(&self) -> &EdgeMaskCache {
        &self.cache
    }

    /// Snapshot of cache occupancy.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached mask.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Detect edges with the algorithm selected by `params`.
    ///
    /// The returned mask may be shared with the cache and with earlier
    /// callers.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::EmptyImage`] for an image with no pixels and
    /// [`EdgeError::InvalidKernelSize`] for an unusable gradient aperture.
    pub fn detect(
        &mut self,
        image: &DynamicImage,
        params: &DetectionParams,
        use_cache: bool,
    ) -> Result<Arc<EdgeMask>, EdgeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EdgeError::EmptyImage);
        }
        params.validate()?;

        let key = use_cache.then(|| fingerprint(image, params));
        if let Some(key) = key {
            if let Some(mask) = self.cache.get(&key) {
                tracing::debug!(%key, method = %params.method(), "edge mask cache hit");
                return Ok(mask);
            }
            tracing::debug!(%key, method = %params.method(), "edge mask cache miss");
        }

        let mask = Arc::new(compute(image, params)?);

        if let Some(key) = key {
            let evicted = self.cache.put(key, Arc::clone(&mask));
            tracing::debug!(
                %key,
                cached = self.cache.len(),
                evicted = evicted.len(),
                "stored edge mask",
            );
        }
        Ok(mask)
    }

    /// Hysteresis detection with explicit thresholds.
    ///
    /// `low_threshold` should not exceed `high_threshold`; if it does, it is
    /// clamped down to `high_threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::EmptyImage`] for an image with no pixels.
    pub fn detect_hysteresis(
        &mut self,
        image: &DynamicImage,
        low_threshold: f32,
        high_threshold: f32,
        use_cache: bool,
    ) -> Result<Arc<EdgeMask>, EdgeError> {
        self.detect(
            image,
            &DetectionParams::hysteresis(low_threshold, high_threshold),
            use_cache,
        )
    }

    /// Gradient-threshold detection with an explicit aperture and threshold.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::EmptyImage`] for an image with no pixels and
    /// [`EdgeError::InvalidKernelSize`] for an unusable aperture.
    pub fn detect_gradient(
        &mut self,
        image: &DynamicImage,
        kernel_size: u32,
        threshold: u8,
        use_cache: bool,
    ) -> Result<Arc<EdgeMask>, EdgeError> {
        self.detect(
            image,
            &DetectionParams::gradient(kernel_size, threshold),
            use_cache,
        )
    }

    /// Detect edges using a method name, as user-facing settings store it.
    ///
    /// The name is matched case-insensitively (see [`EdgeMethod`]). `None`
    /// parameters select the method's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::UnknownMethod`] for an unrecognized name and
    /// [`EdgeError::MethodMismatch`] when `params` belong to a different
    /// method, in addition to the errors of [`detect`](Self::detect).
    pub fn detect_by_name(
        &mut self,
        image: &DynamicImage,
        method: &str,
        params: Option<DetectionParams>,
    ) -> Result<Arc<EdgeMask>, EdgeError> {
        let params = resolve_params(method, params)?;
        self.detect(image, &params, true)
    }
}

/// Parse `method` and pair it with `params` or its defaults.
///
/// # Errors
///
/// Returns [`EdgeError::UnknownMethod`] or [`EdgeError::MethodMismatch`].
pub fn resolve_params(
    method: &str,
    params: Option<DetectionParams>,
) -> Result<DetectionParams, EdgeError> {
    let requested: EdgeMethod = method.parse()?;
    match params {
        None => Ok(requested.default_params()),
        Some(params) if params.method() == requested => Ok(params),
        Some(params) => Err(EdgeError::MethodMismatch {
            requested,
            params: params.method(),
        }),
    }
}

/// Run the selected algorithm without consulting any cache.
fn compute(image: &DynamicImage, params: &DetectionParams) -> Result<EdgeMask, EdgeError> {
    let gray = to_intensity(image);
    let edges = match *params {
        DetectionParams::Hysteresis {
            low_threshold,
            high_threshold,
        } => {
            let blurred = gaussian_blur(&gray, HYSTERESIS_SIGMA);
            hysteresis_edges(&blurred, low_threshold, high_threshold)
        }
        DetectionParams::Gradient {
            kernel_size,
            threshold,
        } => gradient_edges(&gray, kernel_size, threshold)?,
    };
    Ok(EdgeMask::from_gray(&edges))
}

//! Thread-safe wrapper for hosts that share one detector.
//!
//! Each method takes the lock once and holds it for the whole
//! fingerprint/lookup/compute/store sequence, so concurrent callers can
//! never push the cache over its capacity. Detection runs under the lock;
//! callers that need bounded latency must bound image size themselves.
//!
//! [`global`] offers a lazily created process-wide instance for the
//! application boundary. Library code should take an [`EdgeDetector`] or
//! [`SharedEdgeDetector`] as a parameter instead.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use image::DynamicImage;

use crate::cache::CacheStats;
use crate::detector::EdgeDetector;
use crate::points;
use crate::types::{DetectionParams, EdgeError, EdgeMask, EdgePoint};

/// An [`EdgeDetector`] behind a mutex.
#[derive(Debug, Default)]
pub struct SharedEdgeDetector {
    inner: Mutex<EdgeDetector>,
}

impl SharedEdgeDetector {
    /// Wrap an existing detector.
    #[must_use]
    pub const fn new(detector: EdgeDetector) -> Self {
        Self {
            inner: Mutex::new(detector),
        }
    }

    /// Detect edges by method name (case-insensitive), with the method's
    /// default parameters when `params` is `None`.
    ///
    /// # Errors
    ///
    /// See [`EdgeDetector::detect_by_name`].
    pub fn detect_edges(
        &self,
        image: &DynamicImage,
        method: &str,
        params: Option<DetectionParams>,
    ) -> Result<Arc<EdgeMask>, EdgeError> {
        self.lock().detect_by_name(image, method, params)
    }

    /// Detect edges with explicit parameters.
    ///
    /// # Errors
    ///
    /// See [`EdgeDetector::detect`].
    pub fn detect(
        &self,
        image: &DynamicImage,
        params: &DetectionParams,
        use_cache: bool,
    ) -> Result<Arc<EdgeMask>, EdgeError> {
        self.lock().detect(image, params, use_cache)
    }

    /// Detect edges (through the cache) and snap `query` to the nearest
    /// edge pixel within `max_distance`.
    ///
    /// # Errors
    ///
    /// See [`EdgeDetector::detect`].
    pub fn snap(
        &self,
        image: &DynamicImage,
        params: &DetectionParams,
        query: (i64, i64),
        max_distance: u32,
    ) -> Result<Option<EdgePoint>, EdgeError> {
        let mask = self.detect(image, params, true)?;
        Ok(points::nearest_point(&mask, query, max_distance))
    }

    /// Snapshot of cache occupancy.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.lock().cache_stats()
    }

    /// Drop every cached mask.
    pub fn clear_cache(&self) {
        self.lock().clear_cache();
    }

    /// A panic while the lock was held cannot leave the cache above its
    /// capacity, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, EdgeDetector> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<EdgeDetector> for SharedEdgeDetector {
    fn from(detector: EdgeDetector) -> Self {
        Self::new(detector)
    }
}

/// The process-wide detector, created on first use with the default
/// cache capacity.
pub fn global() -> &'static SharedEdgeDetector {
    static GLOBAL: OnceLock<SharedEdgeDetector> = OnceLock::new();
    GLOBAL.get_or_init(SharedEdgeDetector::default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::thread;

    fn step_image() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(30, 30, |x, _| {
            if x < 15 { Luma([0]) } else { Luma([255]) }
        }))
    }

    #[test]
    fn detect_edges_by_name() {
        let shared = SharedEdgeDetector::default();
        let mask = shared.detect_edges(&step_image(), "Hysteresis", None).unwrap();
        assert!(mask.edge_pixel_count() > 0);
        assert_eq!(shared.cache_stats().count, 1);
        assert!(matches!(
            shared.detect_edges(&step_image(), "roberts", None),
            Err(EdgeError::UnknownMethod(_)),
        ));
    }

    #[test]
    fn snap_finds_the_step() {
        let shared = SharedEdgeDetector::new(EdgeDetector::with_capacity(4));
        let params = DetectionParams::gradient(3, 100);
        let snapped = shared.snap(&step_image(), &params, (10, 12), 10).unwrap();
        let point = snapped.unwrap();
        assert!(point.x == 14 || point.x == 15, "snapped to {point:?}");
        assert_eq!(point.y, 12);
        assert_eq!(shared.snap(&step_image(), &params, (0, 0), 3).unwrap(), None);
    }

    #[test]
    fn concurrent_callers_respect_capacity() {
        let shared = Arc::new(SharedEdgeDetector::new(EdgeDetector::with_capacity(3)));
        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let img = step_image();
                    for threshold in 0..5u8 {
                        let params = DetectionParams::gradient(3, t * 10 + threshold);
                        shared.detect(&img, &params, true).unwrap();
                        assert!(shared.cache_stats().count <= 3);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.cache_stats().count, 3);
    }

    #[test]
    fn global_is_a_single_instance() {
        assert!(std::ptr::eq(global(), global()));
    }
}

//! Integration test: an annotation session that clicks repeatedly on one image.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use edgesnap_core::{
    DetectionParams, DynamicImage, EdgeDetector, EdgeMethod, EdgePoint, extract_points,
    nearest_point,
};
use image::{Rgb, RgbImage};

/// A bright disc of radius 12 centred at (32, 24) on a dark background.
fn disc_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
        let dx = f64::from(x) - 32.0;
        let dy = f64::from(y) - 24.0;
        if dx.hypot(dy) <= 12.0 {
            Rgb([230, 230, 230])
        } else {
            Rgb([20, 20, 20])
        }
    }))
}

#[test]
fn clicks_snap_to_the_disc_boundary() {
    let mut detector = EdgeDetector::new();
    let image = disc_image();

    for method in EdgeMethod::ALL {
        let params = method.default_params();
        let mask = detector.detect(&image, &params, true).expect("detection should succeed");
        let points = extract_points(&mask);
        assert!(!points.is_empty(), "{method} found no edges");

        // Every edge pixel should lie near the disc boundary.
        for p in &points {
            let r = p.distance_to((32, 24));
            assert!((9.0..=15.0).contains(&r), "{method}: edge at {p:?} has radius {r}");
        }

        // A click just outside the disc on its right snaps onto the rim.
        let snapped = nearest_point(&mask, (47, 24), 6).expect("click should snap");
        assert!((42..=46).contains(&snapped.x), "{method}: snapped to {snapped:?}");
        assert!((21..=27).contains(&snapped.y), "{method}: snapped to {snapped:?}");

        // The disc centre is far from any edge.
        assert_eq!(nearest_point(&mask, (32, 24), 4), None);
    }
}

#[test]
fn repeated_clicks_reuse_the_cached_mask() {
    let mut detector = EdgeDetector::with_capacity(4);
    let image = disc_image();
    let params = DetectionParams::hysteresis(50.0, 150.0);

    let first = detector.detect(&image, &params, true).unwrap();
    let count = detector.cache_stats().count;
    let mut snaps = Vec::new();
    for click in [(20, 24), (32, 11), (44, 24), (32, 37)] {
        let mask = detector.detect(&image, &params, true).unwrap();
        assert!(Arc::ptr_eq(&first, &mask));
        snaps.push(nearest_point(&mask, click, 5));
    }
    assert_eq!(detector.cache_stats().count, count);
    assert!(snaps.iter().all(Option::is_some), "got {snaps:?}");
}

#[test]
fn switching_images_evicts_the_oldest() {
    let mut detector = EdgeDetector::with_capacity(2);
    let params = DetectionParams::gradient(3, 100);
    let images: Vec<DynamicImage> = (0..3u8)
        .map(|shade| {
            DynamicImage::ImageRgb8(RgbImage::from_fn(20, 20, |x, _| {
                if x < 10 { Rgb([shade, 0, 0]) } else { Rgb([255, 255, 255]) }
            }))
        })
        .collect();

    let first_key = edgesnap_core::fingerprint(&images[0], &params);
    for image in &images {
        detector.detect(image, &params, true).unwrap();
    }
    let stats = detector.cache_stats();
    assert_eq!(stats.count, 2);
    assert!(!stats.keys.contains(&first_key));

    let expected = extract_points(&detector.detect(&images[2], &params, false).unwrap());
    let cached = extract_points(&detector.detect(&images[2], &params, true).unwrap());
    assert_eq!(expected, cached);
    assert!(expected.contains(&EdgePoint::new(9, 10)));
}

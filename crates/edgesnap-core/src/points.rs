//! Edge-pixel extraction and bounded nearest-edge queries.
//!
//! [`extract_points`] lists every edge pixel of a mask in row-major order.
//! [`nearest_point`] finds the edge pixel closest to a click within a
//! maximum radius, which is how annotation clicks snap to boundaries.

use crate::types::{EdgeMask, EdgePoint};

/// Every edge pixel of `mask` as `(column, row)` points, row by row and
/// left to right within a row.
///
/// The result is a snapshot; it does not borrow the mask.
#[must_use]
pub fn extract_points(mask: &EdgeMask) -> Vec<EdgePoint> {
    mask.as_gray()
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| EdgePoint::new(x, y))
        .collect()
}

/// Closest edge pixel to `query` within Euclidean `max_distance`.
///
/// Only the square window `[x - d, x + d] x [y - d, y + d]` around the
/// query, clipped to the mask, is scanned; it contains every pixel within
/// distance `d`. The query itself may lie outside the mask. Distances are
/// compared exactly as integer squares. Among equally close pixels the
/// first in row-major window order wins.
///
/// Returns `None` when the window holds no edge pixel or the closest one
/// is farther than `max_distance` (a window corner can be up to
/// `d * sqrt(2)` away).
#[must_use]
pub fn nearest_point(mask: &EdgeMask, query: (i64, i64), max_distance: u32) -> Option<EdgePoint> {
    let radius = i64::from(max_distance);
    let (qx, qy) = query;

    let x_min = qx.saturating_sub(radius).max(0);
    let x_max = qx.saturating_add(radius + 1).min(i64::from(mask.width()));
    let y_min = qy.saturating_sub(radius).max(0);
    let y_max = qy.saturating_add(radius + 1).min(i64::from(mask.height()));
    if x_min >= x_max || y_min >= y_max {
        return None;
    }

    let mut best: Option<(i64, EdgePoint)> = None;
    for y in y_min..y_max {
        for x in x_min..x_max {
            // Window bounds were clipped to the mask, so these fit in u32.
            let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) else {
                continue;
            };
            if !mask.is_edge(px, py) {
                continue;
            }
            let point = EdgePoint::new(px, py);
            let dist_sq = point.distance_squared_to(query);
            if best.is_none_or(|(best_sq, _)| dist_sq < best_sq) {
                best = Some((dist_sq, point));
            }
        }
    }

    let (dist_sq, point) = best?;
    (dist_sq <= radius * radius).then_some(point)
}

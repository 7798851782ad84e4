//! Two-threshold ("canny-style") edge detection on a pre-blurred image.
//!
//! Steps:
//!
//! 1. 3x3 Sobel gradients and their Euclidean magnitude.
//! 2. Non-maximum suppression along the quantized gradient direction,
//!    thinning ridges to one pixel.
//! 3. Hysteresis: magnitudes strictly above `high` seed edges; magnitudes
//!    strictly above `low` join an edge only when 8-connected to a seed.
//!
//! Smoothing is the caller's job (see [`crate::blur`]); this module does
//! not blur again. The one-pixel image border is never marked as an edge
//! seed, though hysteresis may grow into it.
//!
//! The hysteresis walk bounds-checks every neighbor and visits all eight
//! of them, unlike `imageproc 0.26`'s version (imageproc#705).

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

use crate::types::EDGE;

/// Detect edges in an already-smoothed intensity image.
///
/// Returns a 0/255 raster with the input's dimensions. `low` above `high`
/// is clamped down to `high`.
#[must_use = "returns the binary edge map"]
pub fn hysteresis_edges(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let low = low.min(high);
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude = Image::from_fn(width, height, |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.hypot(v)])
    });

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    hysteresis(&thinned, low, high)
}

/// Neighbor offsets perpendicular to an edge, by gradient direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal,
    Vertical,
    AntiDiagonal,
}

impl Direction {
    fn from_gradient(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if (22.5..67.5).contains(&angle) {
            Self::Diagonal
        } else if (67.5..112.5).contains(&angle) {
            Self::Vertical
        } else if (112.5..157.5).contains(&angle) {
            Self::AntiDiagonal
        } else {
            Self::Horizontal
        }
    }

    /// The two neighbors of interior pixel `(x, y)` to compare against.
    const fn neighbors(self, x: u32, y: u32) -> [(u32, u32); 2] {
        match self {
            Self::Horizontal => [(x - 1, y), (x + 1, y)],
            Self::Diagonal => [(x + 1, y + 1), (x - 1, y - 1)],
            Self::Vertical => [(x, y - 1), (x, y + 1)],
            Self::AntiDiagonal => [(x - 1, y + 1), (x + 1, y - 1)],
        }
    }
}

/// Zero every interior pixel that is not a local maximum across the edge.
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let (width, height) = g.dimensions();
    let mut out = Image::from_pixel(width, height, Luma([0.0]));
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let direction = Direction::from_gradient(
                f32::from(gx.get_pixel(x, y).0[0]),
                f32::from(gy.get_pixel(x, y).0[0]),
            );
            let [(ax, ay), (bx, by)] = direction.neighbors(x, y);
            let value = g.get_pixel(x, y).0[0];
            if value >= g.get_pixel(ax, ay).0[0] && value >= g.get_pixel(bx, by).0[0] {
                out.put_pixel(x, y, Luma([value]));
            }
        }
    }
    out
}

/// Keep strong edges and the weak edges connected to them.
///
/// Non-recursive depth-first flood from every strong interior pixel.
fn hysteresis(input: &Image<Luma<f32>>, low: f32, high: f32) -> GrayImage {
    let (width, height) = input.dimensions();
    let mut out = GrayImage::new(width, height);
    let mut stack = Vec::new();

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            if input.get_pixel(x, y).0[0] <= high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([EDGE]));
            stack.push((x, y));

            while let Some((nx, ny)) = stack.pop() {
                let neighbors = [
                    (nx.checked_add(1), Some(ny)),
                    (nx.checked_add(1), ny.checked_add(1)),
                    (Some(nx), ny.checked_add(1)),
                    (nx.checked_sub(1), ny.checked_sub(1)),
                    (nx.checked_sub(1), Some(ny)),
                    (nx.checked_sub(1), ny.checked_add(1)),
                    (Some(nx), ny.checked_sub(1)),
                    (nx.checked_add(1), ny.checked_sub(1)),
                ];
                for (cx, cy) in neighbors {
                    let (Some(cx), Some(cy)) = (cx, cy) else {
                        continue;
                    };
                    if cx >= width || cy >= height {
                        continue;
                    }
                    if input.get_pixel(cx, cy).0[0] > low && out.get_pixel(cx, cy).0[0] == 0 {
                        out.put_pixel(cx, cy, Luma([EDGE]));
                        stack.push((cx, cy));
                    }
                }
            }
        }
    }
    out
}

// SPDX-License-Identifier: GPL-3.0-only

//! Per-pixel classification against the surface model and reference frame
//!
//! Every classifier takes a smoothing radius `delta`; the underlying reads
//! go through [`DepthFrame::pixel_depth`], so a pixel is always judged on
//! its neighborhood mean.
//!
//! [`DepthFrame::pixel_depth`]: crate::frame::DepthFrame::pixel_depth

use crate::constants::{is_depth_valid, surface};
use crate::frame::DepthFrame;
use crate::surface::SurfaceModel;

/// Row used for the slope test: the row above, except at the top edge
fn slope_row(y: i32) -> i32 {
    if y == 0 { y + 1 } else { y - 1 }
}

/// Depth similarity + slope similarity against the modelled surface
pub fn is_pixel_on_surface(
    frame: &DepthFrame,
    model: &SurfaceModel,
    x: i32,
    y: i32,
    delta: i32,
) -> bool {
    let d = frame.pixel_depth(x, y, delta);
    if !is_depth_valid(d) {
        return false;
    }

    let y2 = slope_row(y);
    let d2 = frame.pixel_depth(x, y2, delta);
    let s = model.expected_depth(y);
    let s2 = model.expected_depth(y2);

    (d - s).abs() < surface::DEPTH_TOLERANCE_MM
        && ((d - d2) - (s - s2)).abs() < surface::SLOPE_TOLERANCE_MM
}

/// Depth similarity + slope similarity against the quiet reference frame,
/// with much tighter tolerances than the analytic surface test
pub fn is_pixel_on_reference(
    frame: &DepthFrame,
    reference: &DepthFrame,
    x: i32,
    y: i32,
    delta: i32,
) -> bool {
    let d = frame.pixel_depth(x, y, delta);
    if !is_depth_valid(d) {
        return false;
    }

    let y2 = slope_row(y);
    let d2 = frame.pixel_depth(x, y2, delta);
    let r = reference.pixel_depth(x, y, delta);
    let r2 = reference.pixel_depth(x, y2, delta);

    (d - r).abs() < surface::REFERENCE_DEPTH_TOLERANCE_MM
        && ((d - d2) - (r - r2)).abs() < surface::REFERENCE_SLOPE_TOLERANCE_MM
}

/// Whether the pixel borders the visible edge of the surface: the frame
/// boundary, or any of rows y-1, y, y+1 whose bounds do not strictly
/// contain x. Foreground objects naturally cross this edge, so it must not
/// count as anomalous.
pub fn is_pixel_on_surface_edge(model: &SurfaceModel, x: i32, y: i32) -> bool {
    if y <= 0 || y as usize >= model.height() - 1 {
        return true;
    }
    !model.strictly_inside_bounds(x, y - 1)
        || !model.strictly_inside_bounds(x, y)
        || !model.strictly_inside_bounds(x, y + 1)
}

/// A pixel that matches neither the modelled surface nor the quiet
/// reference, and is not merely the surface's own edge.
/// `reference` is `None` when the frame under test is the reference itself.
pub fn is_pixel_anomaly(
    frame: &DepthFrame,
    model: &SurfaceModel,
    reference: Option<&DepthFrame>,
    x: i32,
    y: i32,
    delta: i32,
) -> bool {
    if is_pixel_on_surface(frame, model, x, y, delta) {
        return false;
    }
    if is_pixel_on_surface_edge(model, x, y) {
        return false;
    }
    match reference {
        Some(reference) => !is_pixel_on_reference(frame, reference, x, y, delta),
        None => true,
    }
}

/// An anomaly with at least one non-anomalous 8-neighbor: the transition
/// boundary where a finger meets the surface
pub fn is_pixel_anomaly_edge(
    frame: &DepthFrame,
    model: &SurfaceModel,
    reference: Option<&DepthFrame>,
    x: i32,
    y: i32,
    delta: i32,
) -> bool {
    if !is_pixel_anomaly(frame, model, reference, x, y, delta) {
        return false;
    }
    for ny in (y - 1)..=(y + 1) {
        for nx in (x - 1)..=(x + 1) {
            if nx == x && ny == y {
                continue;
            }
            if !frame.contains(nx, ny)
                || !is_pixel_anomaly(frame, model, reference, nx, ny, delta)
            {
                return true;
            }
        }
    }
    false
}

/// E[d²] − E[d]² over the side×side window around (x, y). Cells outside the
/// frame or outside the row's surface bounds contribute a reading of 0,
/// deliberately inflating the variance when the window strays off-surface.
pub fn depth_variance(
    frame: &DepthFrame,
    model: &SurfaceModel,
    x: i32,
    y: i32,
    side: i32,
) -> f32 {
    let half = side / 2;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u32;

    for wy in (y - half)..(y - half + side) {
        for wx in (x - half)..(x - half + side) {
            let d = if frame.contains(wx, wy) && model.inside_bounds(wx, wy) {
                frame.depth_at(wx as usize, wy as usize) as f64
            } else {
                0.0
            };
            sum += d;
            sum_sq += d * d;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    ((sum_sq / n) - mean * mean) as f32
}

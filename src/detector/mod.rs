// SPDX-License-Identifier: GPL-3.0-only

//! Interaction detector
//!
//! Scans a live frame bottom-up for the first pixel that survives the full
//! anomaly cascade: foreign to the surface and reference, on the boundary of
//! the foreign object, part of a region big enough to be a hand rather than
//! sensor noise, and sitting in a window quiet enough to be touching the
//! surface rather than hovering above it.

pub mod classify;

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::constants::detector;
use crate::diagnostics::{PixelTag, TagGrid};
use crate::frame::DepthFrame;
use crate::interaction::{Interaction, InteractionKind, SensorPoint};
use crate::surface::SurfaceModel;

/// Find the touch pixel on a live frame, if any.
///
/// `reference` is `None` when `frame` itself is the reference (during a
/// re-capture the quiet-baseline test is meaningless). When `tags` is
/// supplied the scan keeps classifying the remaining pixels for diagnostic
/// output, but only the first qualifying pixel becomes the interaction.
pub fn detect_interaction(
    frame: &DepthFrame,
    model: &SurfaceModel,
    reference: Option<&DepthFrame>,
    mut tags: Option<&mut TagGrid>,
) -> Option<Interaction> {
    let width = frame.width() as i32;
    let height = frame.height() as i32;
    let delta = detector::SCAN_DELTA;

    let mut found: Option<(i32, i32)> = None;

    for y in (0..height).rev() {
        if !model.row_has_surface(y) {
            continue;
        }
        let left = model.left_x(y).max(0);
        let right = model.right_x(y).min(width - 1);

        for x in left..=right {
            let anomaly = classify::is_pixel_anomaly(frame, model, reference, x, y, delta);

            if let Some(tags) = tags.as_deref_mut() {
                let tag = if anomaly {
                    PixelTag::Anomaly
                } else if classify::is_pixel_on_surface(frame, model, x, y, delta) {
                    PixelTag::Surface
                } else {
                    PixelTag::Default
                };
                tags.set(x as usize, y as usize, tag);
            }

            if found.is_some() || !anomaly {
                continue;
            }

            if !classify::is_pixel_anomaly_edge(frame, model, reference, x, y, delta) {
                continue;
            }
            if !anomaly_region_at_least(
                frame,
                model,
                reference,
                x,
                y,
                detector::MIN_ANOMALY_CELLS,
                delta,
            ) {
                trace!(x, y, "Anomaly region below size threshold");
                continue;
            }
            let variance =
                classify::depth_variance(frame, model, x, y, detector::VARIANCE_WINDOW_SIDE);
            if variance > detector::MAX_CONTACT_VARIANCE_MM2 {
                trace!(x, y, variance, "Contact window too noisy, likely hovering");
                continue;
            }

            found = Some((x, y));
            if tags.is_none() {
                return Some(make_interaction(frame, model, x, y));
            }
        }
    }

    let (x, y) = found?;
    if let Some(tags) = tags.as_deref_mut() {
        tags.set(x as usize, y as usize, PixelTag::Interaction);
    }
    Some(make_interaction(frame, model, x, y))
}

fn make_interaction(frame: &DepthFrame, model: &SurfaceModel, x: i32, y: i32) -> Interaction {
    Interaction {
        kind: InteractionKind::Tap,
        timestamp: frame.timestamp(),
        physical: SensorPoint {
            x,
            y,
            z: frame.pixel_depth(x, y, 0),
        },
        display: None,
        surface_a: model.a(),
        surface_b: model.b(),
    }
}

/// Breadth-first flood over 8-connected anomaly pixels, bounded to the
/// frame, with early exit once the region is big enough
fn anomaly_region_at_least(
    frame: &DepthFrame,
    model: &SurfaceModel,
    reference: Option<&DepthFrame>,
    x: i32,
    y: i32,
    min_cells: usize,
    delta: i32,
) -> bool {
    let width = frame.width() as i32;
    let index = |x: i32, y: i32| (y * width + x) as usize;

    let mut visited: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<(i32, i32)> = VecDeque::new();
    visited.insert(index(x, y));
    queue.push_back((x, y));

    while let Some((cx, cy)) = queue.pop_front() {
        if visited.len() >= min_cells {
            return true;
        }
        for ny in (cy - 1)..=(cy + 1) {
            for nx in (cx - 1)..=(cx + 1) {
                if (nx == cx && ny == cy) || !frame.contains(nx, ny) {
                    continue;
                }
                if visited.contains(&index(nx, ny)) {
                    continue;
                }
                if classify::is_pixel_anomaly(frame, model, reference, nx, ny, delta) {
                    visited.insert(index(nx, ny));
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    visited.len() >= min_cells
}

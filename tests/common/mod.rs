// SPDX-License-Identifier: GPL-3.0-only

//! Shared synthetic-scene helpers for the integration suites

// Not every suite uses every helper
#![allow(dead_code)]

use depthtouch::DepthFrame;
use depthtouch::constants::{FRAME_HEIGHT, FRAME_WIDTH};
use depthtouch::interaction::DisplayPoint;
use depthtouch::mapper::{CalibrationGrid, CalibrationSample};

/// Coefficients of the reference surface used across the scenarios. The
/// shallow exponent keeps the depth ramp gentle, like a sensor looking far
/// across a table.
pub const REF_A: f64 = 30.0;
pub const REF_B: f64 = 0.7;

/// A quiet reference frame whose depths follow `a·y^b` on every column
pub fn power_frame(a: f64, b: f64) -> DepthFrame {
    let mut frame = DepthFrame::filled(FRAME_WIDTH, FRAME_HEIGHT, 0.0, 0);
    for y in 0..FRAME_HEIGHT {
        let depth = (a * (y as f64).powf(b)) as f32;
        for x in 0..FRAME_WIDTH {
            frame.set_depth(x, y, depth);
        }
    }
    frame
}

pub fn reference_frame() -> DepthFrame {
    power_frame(REF_A, REF_B)
}

/// Raise a rectangular region above the surface by a constant offset
pub fn add_flat_blob(frame: &mut DepthFrame, x0: usize, y0: usize, w: usize, h: usize, offset: f32) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let depth = frame.depth_at(x, y) + offset;
            frame.set_depth(x, y, depth);
        }
    }
}

/// Raise a region with an offset ramping from `offset_bottom` at the lowest
/// row to `offset_top` at the highest, like a finger leading up into an arm
pub fn add_ramp_blob(
    frame: &mut DepthFrame,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    offset_top: f32,
    offset_bottom: f32,
) {
    for y in y0..y0 + h {
        let t = (y - y0) as f32 / (h - 1) as f32;
        let offset = offset_top + t * (offset_bottom - offset_top);
        for x in x0..x0 + w {
            let depth = frame.depth_at(x, y) + offset;
            frame.set_depth(x, y, depth);
        }
    }
}

/// A live frame carrying a touching finger: the tip sits 40 mm proud of the
/// surface at the bottom and the press ramps up well past the surface
/// tolerance toward the top, so the whole region reads as foreign
pub fn touching_finger_frame(reference: &DepthFrame) -> DepthFrame {
    let mut frame = reference.clone();
    add_ramp_blob(&mut frame, 288, 351, 28, 30, -290.0, -40.0);
    frame
}

/// A regular mirrored calibration grid covering the centre of the sensor
/// image: sensor x falls as display x climbs
pub fn test_grid(screen_w: u32, screen_h: u32) -> CalibrationGrid {
    let mut physical = Vec::new();
    let mut display = Vec::new();
    for r in 0..3u32 {
        for c in 0..3u32 {
            physical.push(CalibrationSample {
                x: 450.0 - 175.0 * c as f64,
                y: 120.0 + 130.0 * r as f64,
                z: 1200.0 + 300.0 * r as f64,
            });
            display.push(DisplayPoint {
                x: screen_w / 10 + (screen_w * 4 / 10) * c,
                y: screen_h / 10 + (screen_h * 4 / 10) * r,
            });
        }
    }
    CalibrationGrid::new(3, 3, physical, display).unwrap()
}

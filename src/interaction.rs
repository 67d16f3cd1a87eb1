// SPDX-License-Identifier: GPL-3.0-only

//! Interaction data structures
//!
//! An [`Interaction`] is one detected touch on one frame: where it happened
//! in sensor space, when, and (once mapped) where on the display. The
//! surface fit coefficients ride along so a consumer can notice when the
//! reference was re-captured between reports.

use serde::{Deserialize, Serialize};

/// Gesture class of an interaction. Only `Tap` is produced by the detector;
/// the remaining variants exist for downstream recognizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    Tap,
    Pinch,
    Rotation,
    Swipe,
    Pan,
    EdgePan,
    LongPress,
}

/// A point in sensor image space, with the depth reading at that pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPoint {
    /// Column in the depth image
    pub x: i32,
    /// Row in the depth image
    pub y: i32,
    /// Depth at the pixel, millimetres
    pub z: f32,
}

/// A point in display space, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: u32,
    pub y: u32,
}

/// One detected touch
#[derive(Debug, Clone)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// Timestamp of the frame the touch was detected on
    pub timestamp: u32,
    /// Contact pixel in sensor space
    pub physical: SensorPoint,
    /// Contact point in display space; `None` until mapped, and while
    /// calibrating
    pub display: Option<DisplayPoint>,
    /// Power-fit coefficient A of the surface model in effect
    pub surface_a: f64,
    /// Power-fit coefficient B of the surface model in effect
    pub surface_b: f64,
}

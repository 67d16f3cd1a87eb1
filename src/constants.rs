// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! Thresholds are tuned for a time-of-flight sensor mounted obliquely above
//! a projected surface, roughly one to four metres away.

/// Depth frame width in pixels
pub const FRAME_WIDTH: usize = 512;

/// Depth frame height in pixels
pub const FRAME_HEIGHT: usize = 424;

/// Bytes per depth pixel (IEEE-754 f32 millimetres)
pub const FRAME_BYTES_PER_PIXEL: usize = 4;

/// Minimum depth reading considered valid, in millimetres
pub const DEPTH_MIN_MM: f32 = 500.0;

/// Maximum depth reading considered valid, in millimetres
pub const DEPTH_MAX_MM: f32 = 9000.0;

/// Default timeout for a single blocking sensor read, in milliseconds
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 10_000;

/// Check whether a depth reading lies inside the sensor's usable range
pub fn is_depth_valid(depth_mm: f32) -> bool {
    (DEPTH_MIN_MM..=DEPTH_MAX_MM).contains(&depth_mm)
}

/// Surface model fitting parameters
pub mod surface {
    /// Rows skipped above the lowest valid reading before sampling the fit
    pub const FIT_BOTTOM_MARGIN: i32 = 20;

    /// Number of rows sampled along the centre column for the power fit
    pub const FIT_SAMPLE_COUNT: usize = 100;

    /// Fewer surviving samples than this fails the fit
    pub const FIT_MIN_SAMPLES: usize = 3;

    /// Maximum |depth - modelled depth| for a pixel to sit on the surface, mm
    pub const DEPTH_TOLERANCE_MM: f32 = 200.0;

    /// Maximum row-to-row slope disagreement with the model, mm
    pub const SLOPE_TOLERANCE_MM: f32 = 5.0;

    /// Maximum |depth - reference depth| for a pixel to match the reference, mm
    pub const REFERENCE_DEPTH_TOLERANCE_MM: f32 = 10.0;

    /// Maximum row-to-row slope disagreement with the reference, mm
    pub const REFERENCE_SLOPE_TOLERANCE_MM: f32 = 5.0;

    /// Smoothing radius used while building the per-row bounds map
    pub const BOUNDS_DELTA: i32 = 2;
}

/// Interaction detector parameters
pub mod detector {
    /// Smoothing radius for the anomaly / anomaly-edge cascade
    pub const SCAN_DELTA: i32 = 2;

    /// Minimum connected anomaly region, in cells, to rule out sensor specks
    pub const MIN_ANOMALY_CELLS: usize = 700;

    /// Side length of the depth variance window, in pixels
    pub const VARIANCE_WINDOW_SIDE: i32 = 20;

    /// Maximum depth variance around a contact pixel, in mm².
    /// A hovering finger sees mostly empty window cells and blows past this.
    pub const MAX_CONTACT_VARIANCE_MM2: f32 = 3000.0;
}

/// Event recognizer hysteresis thresholds
pub mod recognizer {
    /// Consecutive positive frames required to start an interaction
    pub const ENGAGE_TICKS: u32 = 2;

    /// Consecutive negative frames required to end an interaction.
    /// Lifts are noisier than landings, so releasing takes longer.
    pub const RELEASE_TICKS: u32 = 10;
}

/// Tap-versus-drag classification defaults
pub mod tap {
    /// A press no longer than this can still be a tap, in milliseconds
    pub const MAX_DURATION_MS: u32 = 300;

    /// A press that travelled farther than this is a drag, in display pixels
    pub const MAX_TRAVEL_PX: u32 = 12;
}

/// Calibration grid parameters
pub mod calibration {
    /// Fraction of the screen left as a margin around the dot grid
    pub const SCREEN_MARGIN_FRACTION: f64 = 0.1;

    /// Per-row variance of sampled sensor y above which the row is suspect,
    /// in pixels²
    pub const ROW_Y_VARIANCE_WARN: f64 = 9.0;
}

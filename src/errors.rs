// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the touch pipeline
//!
//! All error conditions are explicit return values; nothing on the detection
//! path panics. Per-frame faults (a slow sensor, a malformed frame) are
//! distinguished from session faults (no sensor, unusable reference) so the
//! worker loop can keep running through the former.

use std::fmt;

/// Result type alias using MonitorError
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Top-level error for monitor operations
#[derive(Debug, Clone)]
pub enum MonitorError {
    /// Sensor-related errors
    Sensor(SensorError),
    /// Surface model errors
    Surface(SurfaceError),
    /// Calibration errors
    Calibration(CalibrationError),
    /// Depth frame errors
    Frame(FrameError),
    /// Filesystem errors (diagnostics, calibration persistence)
    Storage(String),
    /// Detection requested before `start()` captured a reference
    NotStarted,
    /// The operation was cancelled from outside
    Cancelled,
}

impl MonitorError {
    /// Whether the fault is confined to the current frame.
    /// The worker loop drops the frame and continues; anything else tears
    /// the session down.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            MonitorError::Sensor(SensorError::Timeout)
                | MonitorError::Frame(FrameError::DimensionMismatch { .. })
        )
    }
}

/// Sensor acquisition errors
#[derive(Debug, Clone)]
pub enum SensorError {
    /// No depth sensor could be enumerated at startup
    Unavailable(String),
    /// No frame arrived within the read timeout
    Timeout,
    /// Sensor disconnected or failed mid-stream
    Disconnected(String),
    /// I/O failure while reading stored frames
    Io(String),
}

/// Surface model construction errors
#[derive(Debug, Clone)]
pub enum SurfaceError {
    /// The reference frame has too few usable depths in the centre column
    InsufficientData { usable: usize },
}

/// Calibration grid errors
#[derive(Debug, Clone)]
pub enum CalibrationError {
    /// Detection requested display coordinates without a calibration grid
    Missing,
    /// The persisted calibration file failed to parse
    Malformed { line: usize, reason: String },
    /// The grid violates its ordering invariants
    Invalid(String),
}

/// Depth frame validation errors
#[derive(Debug, Clone)]
pub enum FrameError {
    /// A live frame does not match the expected sensor geometry
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// Stored frame data has the wrong byte length
    ByteLength { expected: usize, actual: usize },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Sensor(e) => write!(f, "Sensor error: {}", e),
            MonitorError::Surface(e) => write!(f, "Surface model error: {}", e),
            MonitorError::Calibration(e) => write!(f, "Calibration error: {}", e),
            MonitorError::Frame(e) => write!(f, "Frame error: {}", e),
            MonitorError::Storage(msg) => write!(f, "Storage error: {}", msg),
            MonitorError::NotStarted => write!(f, "Monitor has not been started"),
            MonitorError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Unavailable(msg) => write!(f, "No depth sensor available: {}", msg),
            SensorError::Timeout => write!(f, "Timed out waiting for a frame"),
            SensorError::Disconnected(msg) => write!(f, "Sensor disconnected: {}", msg),
            SensorError::Io(msg) => write!(f, "Sensor I/O error: {}", msg),
        }
    }
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::InsufficientData { usable } => write!(
                f,
                "Not enough usable depth samples to fit the surface ({} found)",
                usable
            ),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::Missing => write!(f, "No calibration grid is set"),
            CalibrationError::Malformed { line, reason } => {
                write!(f, "Calibration file malformed at line {}: {}", line, reason)
            }
            CalibrationError::Invalid(msg) => write!(f, "Calibration grid invalid: {}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::DimensionMismatch { expected, actual } => write!(
                f,
                "Frame is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            FrameError::ByteLength { expected, actual } => write!(
                f,
                "Frame data is {} bytes, expected {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for MonitorError {}
impl std::error::Error for SensorError {}
impl std::error::Error for SurfaceError {}
impl std::error::Error for CalibrationError {}
impl std::error::Error for FrameError {}

impl From<SensorError> for MonitorError {
    fn from(err: SensorError) -> Self {
        MonitorError::Sensor(err)
    }
}

impl From<SurfaceError> for MonitorError {
    fn from(err: SurfaceError) -> Self {
        MonitorError::Surface(err)
    }
}

impl From<CalibrationError> for MonitorError {
    fn from(err: CalibrationError) -> Self {
        MonitorError::Calibration(err)
    }
}

impl From<FrameError> for MonitorError {
    fn from(err: FrameError) -> Self {
        MonitorError::Frame(err)
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::Io(err.to_string())
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! depthtouch - turns a projected display surface into a touchscreen
//!
//! A depth sensor mounted at an oblique angle watches the projection
//! surface. The pipeline fits the surface's shape from a quiet reference
//! frame, scans each live frame for the contact point of a finger or
//! stylus, maps it into display coordinates through a user-captured
//! calibration grid, and debounces the per-frame detections into
//! Start / Move / End pointer events.
//!
//! # Architecture
//!
//! - [`frame`]: depth frame container and windowed pixel access
//! - [`surface`]: power-law surface fit and per-row visibility bounds
//! - [`detector`]: per-pixel classifiers and the touch-candidate scan
//! - [`mapper`]: calibration grid and bilinear sensor-to-display mapping
//! - [`recognizer`]: hysteresis debouncing into pointer events
//! - [`monitor`]: the orchestrator owning sensor, reference and calibration
//! - [`sensor`], [`effector`]: the seams to the hardware driver and the OS
//!   pointer facility
//! - [`diagnostics`]: PPM raster dumps for offline inspection

pub mod config;
pub mod constants;
pub mod detector;
pub mod diagnostics;
pub mod effector;
pub mod errors;
pub mod frame;
pub mod interaction;
pub mod mapper;
pub mod monitor;
pub mod recognizer;
pub mod sensor;
pub mod surface;
pub mod worker;

// Re-export commonly used types
pub use frame::DepthFrame;
pub use interaction::{DisplayPoint, Interaction, InteractionKind, SensorPoint};
pub use monitor::Monitor;
pub use recognizer::{EventRecognizer, PointerEvent};
pub use surface::SurfaceModel;

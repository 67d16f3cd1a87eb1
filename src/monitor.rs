// SPDX-License-Identifier: GPL-3.0-only

//! Orchestrator tying the pipeline together
//!
//! The [`Monitor`] owns the sensor handle, the deep-copied reference frame,
//! the fitted surface model and the calibration mapper. It exposes one
//! detection step (`detect_once`) plus the detection and calibration loops
//! that run on a worker thread.
//!
//! Ownership is strict: sensor frames are consumed within one detection
//! step; only the reference frame is retained, as an independent copy.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::constants::{DEFAULT_FRAME_TIMEOUT_MS, calibration, tap};
use crate::diagnostics::{self, TagGrid};
use crate::detector;
use crate::effector::{PointerDriver, PointerEffector};
use crate::errors::{CalibrationError, MonitorError, MonitorResult};
use crate::frame::DepthFrame;
use crate::interaction::{DisplayPoint, Interaction};
use crate::mapper::{CalibrationGrid, CalibrationSample, VirtualMapper};
use crate::recognizer::{EventRecognizer, HysteresisCounter, Transition};
use crate::sensor::DepthSensor;
use crate::surface::SurfaceModel;
use crate::worker::{LoopAction, WorkerHandle};

/// Behaviour switches for the detection loop
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    /// Run a single detection cycle, then stop
    pub single_snapshot: bool,
    /// Tap window duration; defaults from [`crate::constants::tap`]
    pub tap_max_duration_ms: Option<u32>,
    /// Tap travel radius; defaults from [`crate::constants::tap`]
    pub tap_max_travel_px: Option<u32>,
}

/// Owns the reference frame, surface model, calibration and sensor handle
pub struct Monitor {
    sensor: Box<dyn DepthSensor>,
    reference: Option<DepthFrame>,
    surface: Option<SurfaceModel>,
    mapper: Option<VirtualMapper>,
    screen: Option<(u32, u32)>,
    frame_timeout: Duration,
    /// When set, every detection step writes the diagnostic rasters here
    dump_dir: Option<PathBuf>,
    started: bool,
}

impl Monitor {
    pub fn new(sensor: Box<dyn DepthSensor>) -> Self {
        Self {
            sensor,
            reference: None,
            surface: None,
            mapper: None,
            screen: None,
            frame_timeout: Duration::from_millis(DEFAULT_FRAME_TIMEOUT_MS),
            dump_dir: None,
            started: false,
        }
    }

    /// Total display dimensions that mapped coordinates are expressed in
    pub fn set_screen_virtual(&mut self, width: u32, height: u32) {
        self.screen = Some((width, height));
        if let Some(mapper) = self.mapper.take() {
            self.mapper = Some(VirtualMapper::new(mapper.grid().clone(), width, height));
        }
    }

    pub fn set_frame_timeout(&mut self, timeout: Duration) {
        self.frame_timeout = timeout;
    }

    pub fn set_dump_dir(&mut self, dir: Option<PathBuf>) {
        self.dump_dir = dir;
    }

    pub fn surface(&self) -> Option<&SurfaceModel> {
        self.surface.as_ref()
    }

    pub fn reference(&self) -> Option<&DepthFrame> {
        self.reference.as_ref()
    }

    pub fn calibration(&self) -> Option<&CalibrationGrid> {
        self.mapper.as_ref().map(|m| m.grid())
    }

    /// Acquire the sensor, capture the reference frame and fit the surface
    pub fn start(&mut self) -> MonitorResult<()> {
        self.sensor.start().map_err(MonitorError::Sensor)?;
        info!(sensor = %self.sensor.describe(), "Sensor started");

        let frame = self
            .sensor
            .read_frame(self.frame_timeout)
            .map_err(MonitorError::Sensor)?;
        frame.check_dimensions().map_err(MonitorError::Frame)?;

        let surface = SurfaceModel::fit(&frame)?;
        info!(
            a = surface.a(),
            b = surface.b(),
            "Reference captured, surface model fitted"
        );
        self.reference = Some(frame);
        self.surface = Some(surface);
        self.started = true;
        Ok(())
    }

    /// Replace the calibration grid; display coordinates come out of the
    /// new grid from the next detection on. Requires screen dimensions.
    pub fn set_calibration(&mut self, grid: CalibrationGrid) -> MonitorResult<()> {
        let (width, height) = self.screen.ok_or_else(|| {
            MonitorError::Calibration(CalibrationError::Invalid(
                "screen dimensions must be set before calibration".to_string(),
            ))
        })?;
        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            "Calibration grid installed"
        );
        self.mapper = Some(VirtualMapper::new(grid, width, height));
        Ok(())
    }

    /// Drop the reference; the next detection re-captures it from the live
    /// frame and re-fits the surface
    pub fn invalidate_reference(&mut self) {
        info!("Reference frame invalidated");
        self.reference = None;
        self.surface = None;
    }

    /// Pull one frame and run the full pipeline on it.
    ///
    /// While `calibrating`, mapping to display space is skipped and the
    /// interaction carries only its sensor coordinate.
    pub fn detect_once(&mut self, calibrating: bool) -> MonitorResult<Option<Interaction>> {
        if !self.started {
            return Err(MonitorError::NotStarted);
        }
        if !calibrating && self.mapper.is_none() {
            return Err(MonitorError::Calibration(CalibrationError::Missing));
        }

        let frame = self
            .sensor
            .read_frame(self.frame_timeout)
            .map_err(MonitorError::Sensor)?;
        frame.check_dimensions().map_err(MonitorError::Frame)?;

        // A dropped reference means this frame becomes the new baseline
        let frame_is_reference = self.reference.is_none();
        if frame_is_reference {
            let surface = SurfaceModel::fit(&frame)?;
            info!(
                a = surface.a(),
                b = surface.b(),
                "Reference re-captured from live frame"
            );
            self.reference = Some(frame.clone());
            self.surface = Some(surface);
        }

        let (Some(reference), Some(surface)) = (self.reference.as_ref(), self.surface.as_ref())
        else {
            return Err(MonitorError::NotStarted);
        };
        let reference = (!frame_is_reference).then_some(reference);

        let mut tags = self
            .dump_dir
            .is_some()
            .then(|| TagGrid::new(frame.width(), frame.height()));

        let mut interaction =
            detector::detect_interaction(&frame, surface, reference, tags.as_mut());

        if let Some(interaction) = interaction.as_mut() {
            debug!(
                x = interaction.physical.x,
                y = interaction.physical.y,
                z = interaction.physical.z,
                "Touch candidate"
            );
            if !calibrating {
                if let Some(mapper) = &self.mapper {
                    mapper.set_display_coord(interaction);
                }
            }
        }

        if let Some(tags) = &tags {
            self.write_dumps(&frame, tags);
        }

        Ok(interaction)
    }

    /// Release the sensor and drop the captured state
    pub fn stop(&mut self) {
        if self.started {
            self.sensor.stop();
            self.started = false;
        }
        self.reference = None;
        self.surface = None;
    }

    fn write_dumps(&self, frame: &DepthFrame, tags: &TagGrid) {
        let Some(dir) = &self.dump_dir else {
            return;
        };
        let Some(surface) = &self.surface else {
            return;
        };
        let result = std::fs::create_dir_all(dir)
            .and_then(|_| diagnostics::write_depth_ppm(frame, &dir.join("depth.ppm")))
            .and_then(|_| {
                diagnostics::write_surface_depth_ppm(frame, surface, &dir.join("surface-depth.ppm"))
            })
            .and_then(|_| {
                diagnostics::write_surface_slope_ppm(frame, surface, &dir.join("surface-slope.ppm"))
            })
            .and_then(|_| diagnostics::write_interaction_ppm(tags, &dir.join("interaction.ppm")));
        if let Err(e) = result {
            warn!(error = %e, dir = %dir.display(), "Failed to write diagnostic rasters");
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run the detection loop on a worker thread.
///
/// The monitor must be started and calibrated. Recognized events drive the
/// effector through the tap/drag pointer driver. Frame-local faults are
/// logged and skipped; anything else stops the worker.
pub fn spawn_detection<E>(mut monitor: Monitor, effector: E, options: DetectOptions) -> WorkerHandle
where
    E: PointerEffector + 'static,
{
    let mut recognizer = EventRecognizer::new();
    let mut driver = PointerDriver::new(
        effector,
        options.tap_max_duration_ms.unwrap_or(tap::MAX_DURATION_MS),
        options.tap_max_travel_px.unwrap_or(tap::MAX_TRAVEL_PX),
    );
    let single_snapshot = options.single_snapshot;

    WorkerHandle::spawn("detect", move || {
        match monitor.detect_once(false) {
            Ok(detection) => {
                let tick = detection
                    .as_ref()
                    .and_then(|i| i.display.map(|p| (p, i.timestamp)));
                if let Some(event) = recognizer.update(tick) {
                    debug!(?event, "Pointer event");
                    driver.handle(event);
                }
                if single_snapshot {
                    return LoopAction::Stop;
                }
                LoopAction::Continue
            }
            Err(e) if e.is_frame_local() => {
                warn!(error = %e, "Dropping frame");
                LoopAction::Continue
            }
            Err(e) => {
                error!(error = %e, "Detection worker stopping");
                LoopAction::Stop
            }
        }
    })
}

/// Display positions of the calibration dots: an R×C grid inset from the
/// screen edges by a fixed margin
pub fn calibration_targets(rows: usize, cols: usize, width: u32, height: u32) -> Vec<DisplayPoint> {
    let margin_x = width as f64 * calibration::SCREEN_MARGIN_FRACTION;
    let margin_y = height as f64 * calibration::SCREEN_MARGIN_FRACTION;
    let step_x = (width as f64 - 2.0 * margin_x) / (cols - 1) as f64;
    let step_y = (height as f64 - 2.0 * margin_y) / (rows - 1) as f64;

    let mut targets = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            targets.push(DisplayPoint {
                x: (margin_x + step_x * c as f64).round() as u32,
                y: (margin_y + step_y * r as f64).round() as u32,
            });
        }
    }
    targets
}

/// Collect one physical sample per calibration dot, blocking until every
/// dot has been touched and released or `cancel` is raised.
///
/// The caller (typically the calibration UI) highlights each target as this
/// loop reports it; here the prompt goes to the log.
pub fn run_calibration(
    monitor: &mut Monitor,
    rows: usize,
    cols: usize,
    cancel: &Arc<AtomicBool>,
) -> MonitorResult<CalibrationGrid> {
    let (width, height) = monitor.screen.ok_or_else(|| {
        MonitorError::Calibration(CalibrationError::Invalid(
            "screen dimensions must be set before calibrating".to_string(),
        ))
    })?;
    let targets = calibration_targets(rows, cols, width, height);
    let mut samples: Vec<CalibrationSample> = Vec::with_capacity(targets.len());

    for (index, target) in targets.iter().enumerate() {
        info!(
            point = index,
            x = target.x,
            y = target.y,
            "Waiting for touch on calibration dot"
        );

        let mut counter = HysteresisCounter::default();
        let mut captured: Option<CalibrationSample> = None;

        // Engage on the dot, then wait for the finger to lift before moving
        // on, so one long press cannot claim two dots
        loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(MonitorError::Cancelled);
            }
            let detection = match monitor.detect_once(true) {
                Ok(d) => d,
                Err(e) if e.is_frame_local() => {
                    warn!(error = %e, "Dropping frame during calibration");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match counter.step(detection.is_some()) {
                Some(Transition::Engaged) => {
                    if let Some(interaction) = &detection {
                        captured = Some(CalibrationSample {
                            x: interaction.physical.x as f64,
                            y: interaction.physical.y as f64,
                            z: interaction.physical.z as f64,
                        });
                    }
                }
                Some(Transition::Released) if captured.is_some() => break,
                _ => {}
            }
        }

        // The engage tick always carries a detection
        if let Some(sample) = captured {
            info!(point = index, sx = sample.x, sy = sample.y, "Dot recorded");
            samples.push(sample);
        }
    }

    CalibrationGrid::new(rows, cols, samples, targets).map_err(MonitorError::Calibration)
}

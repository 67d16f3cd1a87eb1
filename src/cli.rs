// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the detection loop against a live or file-backed sensor
//! - Collecting a calibration grid
//! - Dumping raw depth frames and diagnostic rasters

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tracing::info;

use depthtouch::config::Config;
use depthtouch::effector::LogEffector;
use depthtouch::errors::{MonitorError, MonitorResult, SensorError};
use depthtouch::mapper::CalibrationGrid;
use depthtouch::monitor::{self, DetectOptions, Monitor};
use depthtouch::sensor::{DepthSensor, FileSensor};

/// Open the depth sensor: stored frames when requested, hardware otherwise.
///
/// Hardware drivers register through the [`DepthSensor`] seam; none is
/// bundled with this crate, so without test inputs startup reports the
/// sensor as unavailable.
fn open_sensor(test_inputs: Option<&PathBuf>) -> MonitorResult<Box<dyn DepthSensor>> {
    match test_inputs {
        Some(dir) => {
            info!(dir = %dir.display(), "Using stored depth frames");
            Ok(Box::new(FileSensor::from_dir(dir).map_err(MonitorError::Sensor)?))
        }
        None => Err(MonitorError::Sensor(SensorError::Unavailable(
            "no depth sensor driver is linked; pass --test-inputs <DIR>".to_string(),
        ))),
    }
}

/// Install a Ctrl-C handler that raises the worker cancel flag
fn cancel_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
    }
    flag
}

/// Run the detection loop until interrupted
pub fn run_detect(
    test_inputs: Option<PathBuf>,
    single_snapshot: bool,
    dump_ppm: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    let mut monitor = Monitor::new(open_sensor(test_inputs.as_ref())?);
    monitor.set_screen_virtual(config.screen_width, config.screen_height);
    monitor.set_frame_timeout(config.frame_timeout());
    monitor.set_dump_dir(dump_ppm);

    let calibration_file = config
        .calibration_file()
        .ok_or("no calibration file location; set calibration_path in the config")?;
    let grid = CalibrationGrid::load(
        &calibration_file,
        config.calibration_rows,
        config.calibration_cols,
    )?;
    monitor.set_calibration(grid)?;

    monitor.start()?;

    let options = DetectOptions {
        single_snapshot,
        tap_max_duration_ms: Some(config.tap_max_duration_ms),
        tap_max_travel_px: Some(config.tap_max_travel_px),
    };
    let mut worker = monitor::spawn_detection(monitor, LogEffector, options);

    let cancel = cancel_flag();
    while worker.is_running() {
        if cancel.load(Ordering::SeqCst) {
            info!("Interrupt received, stopping detection");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    worker.stop();
    Ok(())
}

/// Collect a calibration grid and persist it
pub fn run_calibrate(
    test_inputs: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    let mut monitor = Monitor::new(open_sensor(test_inputs.as_ref())?);
    monitor.set_screen_virtual(config.screen_width, config.screen_height);
    monitor.set_frame_timeout(config.frame_timeout());
    monitor.start()?;

    let cancel = cancel_flag();
    let grid = monitor::run_calibration(
        &mut monitor,
        config.calibration_rows,
        config.calibration_cols,
        &cancel,
    )?;

    let path = output
        .or_else(|| config.calibration_file())
        .ok_or("no calibration file location; pass --output")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    grid.save(&path)?;
    info!(path = %path.display(), "Calibration saved");
    println!("Calibration written to {}", path.display());
    Ok(())
}

/// Capture one frame and write it as a raw dump plus diagnostic rasters
pub fn run_dump(
    test_inputs: Option<PathBuf>,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    let mut sensor = open_sensor(test_inputs.as_ref())?;
    sensor.start().map_err(MonitorError::Sensor)?;
    let frame = sensor
        .read_frame(config.frame_timeout())
        .map_err(MonitorError::Sensor)?;
    sensor.stop();

    std::fs::create_dir_all(&output_dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let frame_path = output_dir.join(format!("frame_{}.bin", stamp));
    frame.write_to_file(&frame_path)?;
    println!("Depth frame written to {}", frame_path.display());

    // A surface fit makes the classified views possible; skip them when the
    // frame cannot carry one
    match depthtouch::surface::SurfaceModel::fit(&frame) {
        Ok(surface) => {
            let depth_path = output_dir.join(format!("depth_{}.ppm", stamp));
            depthtouch::diagnostics::write_depth_ppm(&frame, &depth_path)?;
            depthtouch::diagnostics::write_surface_depth_ppm(
                &frame,
                &surface,
                &output_dir.join(format!("surface-depth_{}.ppm", stamp)),
            )?;
            depthtouch::diagnostics::write_surface_slope_ppm(
                &frame,
                &surface,
                &output_dir.join(format!("surface-slope_{}.ppm", stamp)),
            )?;
            println!("Diagnostic rasters written to {}", output_dir.display());
        }
        Err(e) => {
            println!("Skipping classified views: {}", e);
        }
    }
    Ok(())
}

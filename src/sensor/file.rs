// SPDX-License-Identifier: GPL-3.0-only

//! File-backed depth sensor
//!
//! Replays stored depth frames in a loop with synthetic 30 fps timestamps.
//! Useful for driving the pipeline without hardware: point it at a directory
//! of `.bin` dumps (the format written by the `dump` command) and the first
//! frame makes a natural reference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::SensorError;
use crate::frame::DepthFrame;
use crate::sensor::DepthSensor;

/// Synthetic inter-frame interval, matching the sensor's 30 fps cadence
const FRAME_INTERVAL_MS: u32 = 33;

/// Replays stored frames as if they came from hardware
pub struct FileSensor {
    paths: Vec<PathBuf>,
    frames: Vec<DepthFrame>,
    cursor: usize,
    clock_ms: u32,
    started: bool,
}

impl FileSensor {
    /// Replay the given frame dumps, in order, wrapping around at the end
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            frames: Vec::new(),
            cursor: 0,
            clock_ms: 0,
            started: false,
        }
    }

    /// Replay every `.bin` file in a directory, in name order
    pub fn from_dir(dir: &Path) -> Result<Self, SensorError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| SensorError::Unavailable(format!("{}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "bin"))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(SensorError::Unavailable(format!(
                "no .bin frames in {}",
                dir.display()
            )));
        }
        Ok(Self::new(paths))
    }

    /// Replay frames already in memory; handy in tests
    pub fn from_frames(frames: Vec<DepthFrame>) -> Self {
        Self {
            paths: Vec::new(),
            frames,
            cursor: 0,
            clock_ms: 0,
            started: false,
        }
    }
}

impl DepthSensor for FileSensor {
    fn start(&mut self) -> Result<(), SensorError> {
        if self.frames.is_empty() {
            if self.paths.is_empty() {
                return Err(SensorError::Unavailable(
                    "file sensor has no frames to replay".to_string(),
                ));
            }
            for path in &self.paths {
                debug!(path = %path.display(), "Loading stored depth frame");
                self.frames.push(DepthFrame::read_from_file(path, 0)?);
            }
        }
        self.cursor = 0;
        self.clock_ms = 0;
        self.started = true;
        info!(frames = self.frames.len(), "File sensor started");
        Ok(())
    }

    fn read_frame(&mut self, _timeout: Duration) -> Result<DepthFrame, SensorError> {
        if !self.started {
            return Err(SensorError::Disconnected(
                "file sensor not started".to_string(),
            ));
        }
        let mut frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        self.clock_ms = self.clock_ms.wrapping_add(FRAME_INTERVAL_MS);
        frame.set_timestamp(self.clock_ms);
        Ok(frame)
    }

    fn stop(&mut self) {
        self.started = false;
        info!("File sensor stopped");
    }

    fn describe(&self) -> String {
        if self.paths.is_empty() {
            format!("in-memory replay ({} frames)", self.frames.len())
        } else {
            format!("file replay ({} frames)", self.paths.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FRAME_HEIGHT, FRAME_WIDTH};

    #[test]
    fn test_replay_wraps_and_timestamps_advance() {
        let frames = vec![
            DepthFrame::filled(FRAME_WIDTH, FRAME_HEIGHT, 1000.0, 0),
            DepthFrame::filled(FRAME_WIDTH, FRAME_HEIGHT, 2000.0, 0),
        ];
        let mut sensor = FileSensor::from_frames(frames);
        sensor.start().unwrap();

        let a = sensor.read_frame(Duration::from_secs(1)).unwrap();
        let b = sensor.read_frame(Duration::from_secs(1)).unwrap();
        let c = sensor.read_frame(Duration::from_secs(1)).unwrap();
        assert_eq!(a.depth_at(0, 0), 1000.0);
        assert_eq!(b.depth_at(0, 0), 2000.0);
        assert_eq!(c.depth_at(0, 0), 1000.0);
        assert!(a.timestamp() < b.timestamp());
        assert!(b.timestamp() < c.timestamp());
    }

    #[test]
    fn test_read_before_start_fails() {
        let mut sensor =
            FileSensor::from_frames(vec![DepthFrame::filled(FRAME_WIDTH, FRAME_HEIGHT, 1.0, 0)]);
        assert!(sensor.read_frame(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_empty_sensor_is_unavailable() {
        let mut sensor = FileSensor::new(Vec::new());
        assert!(matches!(
            sensor.start(),
            Err(SensorError::Unavailable(_))
        ));
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end scenarios through the monitor, recognizer and worker

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use depthtouch::DepthFrame;
use depthtouch::effector::PointerEffector;
use depthtouch::errors::{CalibrationError, MonitorError};
use depthtouch::monitor::{self, DetectOptions, Monitor};
use depthtouch::recognizer::{EventRecognizer, PointerEvent};
use depthtouch::sensor::FileSensor;

fn monitor_with_frames(frames: Vec<DepthFrame>) -> Monitor {
    let mut monitor = Monitor::new(Box::new(FileSensor::from_frames(frames)));
    monitor.set_screen_virtual(1920, 1080);
    monitor.set_frame_timeout(Duration::from_secs(1));
    monitor
}

#[test]
fn test_no_touch_produces_no_events() {
    let reference = reference_frame();
    let mut frames = vec![reference.clone()];
    frames.extend(std::iter::repeat_n(reference, 15));

    let mut monitor = monitor_with_frames(frames);
    monitor.set_calibration(test_grid(1920, 1080)).unwrap();
    monitor.start().unwrap();

    let mut recognizer = EventRecognizer::new();
    for _ in 0..15 {
        let detection = monitor.detect_once(false).unwrap();
        let tick = detection
            .as_ref()
            .and_then(|i| i.display.map(|p| (p, i.timestamp)));
        assert_eq!(recognizer.update(tick), None);
    }
}

#[test]
fn test_single_tap_event_sequence() {
    let reference = reference_frame();
    let touch = touching_finger_frame(&reference);

    // One reference capture, twelve touch frames, twelve quiet frames
    let mut frames = vec![reference.clone()];
    frames.extend(std::iter::repeat_n(touch, 12));
    frames.extend(std::iter::repeat_n(reference, 12));

    let mut monitor = monitor_with_frames(frames);
    monitor.set_calibration(test_grid(1920, 1080)).unwrap();
    monitor.start().unwrap();

    let mut recognizer = EventRecognizer::new();
    let mut events = Vec::new();
    for _ in 0..24 {
        let detection = monitor.detect_once(false).unwrap();
        let tick = detection
            .as_ref()
            .and_then(|i| i.display.map(|p| (p, i.timestamp)));
        if let Some(event) = recognizer.update(tick) {
            events.push(event);
        }
    }

    // The press engages on its second frame, moves while held, and releases
    // within ten quiet frames of the lift
    assert_eq!(events.len(), 12, "events: {:?}", events);
    assert!(matches!(events[0], PointerEvent::Start { .. }));
    for event in &events[1..11] {
        assert!(matches!(event, PointerEvent::Move { .. }));
    }
    assert!(matches!(events[11], PointerEvent::End { .. }));

    // Every event lands on the same mapped point for a steady press
    let PointerEvent::Start { position, .. } = events[0] else {
        unreachable!()
    };
    let PointerEvent::End { position: end, .. } = events[11] else {
        unreachable!()
    };
    assert_eq!(position, end);
    assert!(position.x <= 1920 && position.y <= 1080);
}

#[test]
fn test_detect_without_calibration_is_refused() {
    let reference = reference_frame();
    let mut monitor = monitor_with_frames(vec![reference.clone(), reference]);
    monitor.start().unwrap();

    match monitor.detect_once(false) {
        Err(MonitorError::Calibration(CalibrationError::Missing)) => {}
        other => panic!("expected CalibrationMissing, got {:?}", other.map(|_| ())),
    }

    // The same call in calibration mode runs fine without a grid
    assert!(monitor.detect_once(true).unwrap().is_none());
}

#[test]
fn test_detect_before_start_is_refused() {
    let mut monitor = monitor_with_frames(vec![reference_frame()]);
    assert!(matches!(
        monitor.detect_once(true),
        Err(MonitorError::NotStarted)
    ));
}

#[test]
fn test_invalidated_reference_is_rebuilt_from_live_frame() {
    let first = reference_frame();
    // A noticeably different tilt for the second capture
    let second = power_frame(2.0, 1.2);

    let mut monitor = monitor_with_frames(vec![first, second.clone(), second]);
    monitor.start().unwrap();

    let (a1, b1) = {
        let surface = monitor.surface().unwrap();
        (surface.a(), surface.b())
    };

    monitor.invalidate_reference();
    assert!(monitor.surface().is_none());

    // The next detection adopts the live frame as the new reference; the
    // frame under test is the reference itself, so nothing is detected
    assert!(monitor.detect_once(true).unwrap().is_none());

    let surface = monitor.surface().expect("surface must be rebuilt");
    assert!((surface.a() - a1).abs() > 0.01 * a1.abs());
    assert!((surface.b() - b1).abs() > 0.01 * b1.abs());
    assert!((surface.a() - 2.0).abs() < 1e-3);
    assert!((surface.b() - 1.2).abs() < 1e-3);
}

#[derive(Default)]
struct RecordingEffector {
    actions: Arc<Mutex<Vec<String>>>,
}

impl PointerEffector for RecordingEffector {
    fn pointer_move(&mut self, x: u32, y: u32) {
        self.actions.lock().unwrap().push(format!("move {} {}", x, y));
    }
    fn left_down(&mut self, x: u32, y: u32) {
        self.actions.lock().unwrap().push(format!("down {} {}", x, y));
    }
    fn left_up(&mut self, x: u32, y: u32) {
        self.actions.lock().unwrap().push(format!("up {} {}", x, y));
    }
    fn click(&mut self, x: u32, y: u32) {
        self.actions.lock().unwrap().push(format!("click {} {}", x, y));
    }
}

#[test]
fn test_detection_worker_drives_effector() {
    let reference = reference_frame();
    let touch = touching_finger_frame(&reference);

    // Enough touch frames to engage, then quiet frames to release
    let mut frames = vec![reference.clone()];
    frames.extend(std::iter::repeat_n(touch, 6));
    frames.extend(std::iter::repeat_n(reference, 12));

    let mut monitor = monitor_with_frames(frames);
    monitor.set_calibration(test_grid(1920, 1080)).unwrap();
    monitor.start().unwrap();

    let effector = RecordingEffector::default();
    let actions = Arc::clone(&effector.actions);

    let mut worker = monitor::spawn_detection(monitor, effector, DetectOptions::default());

    // The sensor wraps around after 19 frames; a full press cycle fits well
    // within the deadline
    let deadline = std::time::Instant::now() + Duration::from_secs(60);
    loop {
        {
            let seen = actions.lock().unwrap();
            if seen.iter().any(|a| a.starts_with("click")) {
                break;
            }
        }
        assert!(
            std::time::Instant::now() < deadline,
            "worker never produced a click; actions: {:?}",
            actions.lock().unwrap()
        );
        std::thread::sleep(Duration::from_millis(20));
    }
    worker.stop();

    let seen = actions.lock().unwrap();
    assert!(seen[0].starts_with("move"), "actions: {:?}", seen);
    // A six-frame press at 33 ms a frame stays inside the tap window
    assert!(seen.iter().any(|a| a.starts_with("click")));
    assert!(!seen.iter().any(|a| a.starts_with("down")), "actions: {:?}", seen);
}

#[test]
fn test_calibration_targets_cover_screen_with_margin() {
    let targets = monitor::calibration_targets(3, 3, 1920, 1080);
    assert_eq!(targets.len(), 9);
    assert_eq!(targets[0].x, 192);
    assert_eq!(targets[0].y, 108);
    assert_eq!(targets[8].x, 1920 - 192);
    assert_eq!(targets[8].y, 1080 - 108);
    // Row-major, x fastest
    assert!(targets[1].x > targets[0].x);
    assert_eq!(targets[1].y, targets[0].y);
}

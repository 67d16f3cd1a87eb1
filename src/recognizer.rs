// SPDX-License-Identifier: GPL-3.0-only

//! Pointer event recognition
//!
//! A per-frame stream of "touch present / absent" observations is debounced
//! by an asymmetric hysteresis counter and turned into discrete Start /
//! Move / End events. Landings are crisp, so two agreeing frames engage;
//! lifts are noisy (the sensor loses a moving finger for a frame or two),
//! so ten disagreeing frames are needed to release.

use crate::constants::recognizer;
use crate::interaction::DisplayPoint;

/// Transition reported by the hysteresis counter when it flips state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle → engaged
    Engaged,
    /// Engaged → idle
    Released,
}

/// Two-state saturating counter with asymmetric thresholds.
///
/// The running count is the number of consecutive contrary inputs still
/// needed to flip: while idle it saturates at `engage_ticks`, while engaged
/// at `release_ticks`. Agreeing inputs grow it back toward the cap,
/// disagreeing inputs drain it, and hitting zero flips the state and
/// re-arms the count for the new state.
#[derive(Debug, Clone)]
pub struct HysteresisCounter {
    engage_ticks: u32,
    release_ticks: u32,
    engaged: bool,
    count: u32,
}

impl HysteresisCounter {
    pub fn new(engage_ticks: u32, release_ticks: u32) -> Self {
        Self {
            engage_ticks,
            release_ticks,
            engaged: false,
            count: engage_ticks,
        }
    }

    pub fn reset(&mut self) {
        self.engaged = false;
        self.count = self.engage_ticks;
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Feed one observation; returns the transition if the state flipped
    pub fn step(&mut self, pressed: bool) -> Option<Transition> {
        let cap = if self.engaged {
            self.release_ticks
        } else {
            self.engage_ticks
        };

        if pressed == self.engaged {
            self.count = (self.count + 1).min(cap);
            return None;
        }

        self.count = self.count.saturating_sub(1);
        if self.count > 0 {
            return None;
        }

        self.engaged = !self.engaged;
        self.count = if self.engaged {
            self.release_ticks
        } else {
            self.engage_ticks
        };
        Some(if self.engaged {
            Transition::Engaged
        } else {
            Transition::Released
        })
    }
}

impl Default for HysteresisCounter {
    fn default() -> Self {
        Self::new(recognizer::ENGAGE_TICKS, recognizer::RELEASE_TICKS)
    }
}

/// A recognized pointer event in display space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Start {
        position: DisplayPoint,
        timestamp: u32,
    },
    Move {
        position: DisplayPoint,
        timestamp: u32,
    },
    End {
        position: DisplayPoint,
        timestamp: u32,
    },
}

/// Turns per-frame detections into Start / Move / End events.
///
/// The first and last locations of the running press are retained so a
/// consumer can classify a tap against a drag from duration and travel.
#[derive(Debug, Clone, Default)]
pub struct EventRecognizer {
    counter: HysteresisCounter,
    first: Option<(DisplayPoint, u32)>,
    last: Option<(DisplayPoint, u32)>,
}

impl EventRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location and timestamp of the press start, while one is running
    pub fn first(&self) -> Option<(DisplayPoint, u32)> {
        self.first
    }

    /// Most recently seen location and timestamp
    pub fn last(&self) -> Option<(DisplayPoint, u32)> {
        self.last
    }

    /// Feed one frame's outcome. `detection` carries the mapped display
    /// position when a touch was found on this frame.
    pub fn update(&mut self, detection: Option<(DisplayPoint, u32)>) -> Option<PointerEvent> {
        if let Some(seen) = detection {
            self.last = Some(seen);
        }

        match self.counter.step(detection.is_some()) {
            Some(Transition::Engaged) => {
                // The engaging tick necessarily carried a detection
                let (position, timestamp) = detection?;
                self.first = Some((position, timestamp));
                Some(PointerEvent::Start {
                    position,
                    timestamp,
                })
            }
            Some(Transition::Released) => {
                let (position, timestamp) = self.last.take()?;
                self.first = None;
                Some(PointerEvent::End {
                    position,
                    timestamp,
                })
            }
            None => {
                if self.counter.is_engaged() {
                    let (position, timestamp) = detection?;
                    return Some(PointerEvent::Move {
                        position,
                        timestamp,
                    });
                }
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.counter.reset();
        self.first = None;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: u32, y: u32) -> DisplayPoint {
        DisplayPoint { x, y }
    }

    #[test]
    fn test_engages_on_threshold() {
        let mut counter = HysteresisCounter::new(2, 10);
        assert_eq!(counter.step(true), None);
        assert_eq!(counter.step(true), Some(Transition::Engaged));
        assert!(counter.is_engaged());
    }

    #[test]
    fn test_releases_on_threshold() {
        let mut counter = HysteresisCounter::new(2, 10);
        counter.step(true);
        counter.step(true);
        for _ in 0..9 {
            assert_eq!(counter.step(false), None);
        }
        assert_eq!(counter.step(false), Some(Transition::Released));
        assert!(!counter.is_engaged());
    }

    #[test]
    fn test_brief_dropout_does_not_release() {
        let mut counter = HysteresisCounter::new(2, 10);
        counter.step(true);
        counter.step(true);
        // Three missed frames, then the finger is seen again
        for _ in 0..3 {
            assert_eq!(counter.step(false), None);
        }
        for _ in 0..20 {
            assert_eq!(counter.step(true), None);
        }
        assert!(counter.is_engaged());
        // A full release still takes the complete run of negatives
        for _ in 0..9 {
            assert_eq!(counter.step(false), None);
        }
        assert_eq!(counter.step(false), Some(Transition::Released));
    }

    #[test]
    fn test_idle_stays_idle() {
        let mut counter = HysteresisCounter::new(2, 10);
        for _ in 0..50 {
            assert_eq!(counter.step(false), None);
        }
        assert!(!counter.is_engaged());
    }

    #[test]
    fn test_event_sequence_for_steady_press() {
        let mut recognizer = EventRecognizer::new();
        let mut events = Vec::new();
        for i in 0..12u32 {
            if let Some(event) = recognizer.update(Some((at(100 + i, 200), i * 33))) {
                events.push(event);
            }
        }
        // Lift: ten empty frames then the release fires
        for i in 12..22u32 {
            if let Some(event) = recognizer.update(None) {
                events.push(event);
            }
            let _ = i;
        }

        assert_eq!(events.len(), 12);
        assert!(matches!(events[0], PointerEvent::Start { position, .. } if position == at(101, 200)));
        for event in &events[1..11] {
            assert!(matches!(event, PointerEvent::Move { .. }));
        }
        assert!(matches!(events[11], PointerEvent::End { position, .. } if position == at(111, 200)));
    }

    #[test]
    fn test_single_frame_blip_emits_nothing() {
        let mut recognizer = EventRecognizer::new();
        assert_eq!(recognizer.update(Some((at(5, 5), 0))), None);
        for _ in 0..30 {
            assert_eq!(recognizer.update(None), None);
        }
    }

    #[test]
    fn test_first_and_last_track_press() {
        let mut recognizer = EventRecognizer::new();
        recognizer.update(Some((at(10, 10), 0)));
        recognizer.update(Some((at(11, 10), 33)));
        recognizer.update(Some((at(40, 12), 66)));
        assert_eq!(recognizer.first(), Some((at(11, 10), 33)));
        assert_eq!(recognizer.last(), Some((at(40, 12), 66)));
    }
}

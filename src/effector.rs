// SPDX-License-Identifier: GPL-3.0-only

//! Pointer effector seam and tap/drag driving
//!
//! The recognizer produces a plain stream of Start / Move / End values; what
//! they mean for the host is the consumer's call. [`PointerDriver`] is the
//! bundled consumer: it holds the button back until a press outgrows the tap
//! window, so a quick touch becomes a clean click while a sustained one
//! becomes a drag. OS injection itself lives behind [`PointerEffector`];
//! the default implementation only logs.

use tracing::info;

use crate::interaction::DisplayPoint;
use crate::recognizer::PointerEvent;

/// Sink for synthesized pointer actions, typically backed by the OS input
/// facility
pub trait PointerEffector: Send {
    fn pointer_move(&mut self, x: u32, y: u32);
    fn left_down(&mut self, x: u32, y: u32);
    fn left_up(&mut self, x: u32, y: u32);
    fn click(&mut self, x: u32, y: u32);
}

/// Effector that narrates actions to the log instead of injecting them
#[derive(Debug, Default)]
pub struct LogEffector;

impl PointerEffector for LogEffector {
    fn pointer_move(&mut self, x: u32, y: u32) {
        info!(x, y, "pointer move");
    }

    fn left_down(&mut self, x: u32, y: u32) {
        info!(x, y, "left button down");
    }

    fn left_up(&mut self, x: u32, y: u32) {
        info!(x, y, "left button up");
    }

    fn click(&mut self, x: u32, y: u32) {
        info!(x, y, "click");
    }
}

#[derive(Debug, Clone, Copy)]
enum PressPhase {
    Idle,
    /// Touch seen, button not yet committed
    Pending { origin: DisplayPoint, since: u32 },
    /// Press outgrew the tap window, button is down
    Dragging,
}

/// Translates pointer events into effector calls with tap/drag separation
pub struct PointerDriver<E: PointerEffector> {
    effector: E,
    phase: PressPhase,
    tap_max_duration_ms: u32,
    tap_max_travel_px: u32,
}

impl<E: PointerEffector> PointerDriver<E> {
    pub fn new(effector: E, tap_max_duration_ms: u32, tap_max_travel_px: u32) -> Self {
        Self {
            effector,
            phase: PressPhase::Idle,
            tap_max_duration_ms,
            tap_max_travel_px,
        }
    }

    pub fn effector_mut(&mut self) -> &mut E {
        &mut self.effector
    }

    /// Apply one recognized event to the effector
    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Start {
                position,
                timestamp,
            } => {
                self.effector.pointer_move(position.x, position.y);
                self.phase = PressPhase::Pending {
                    origin: position,
                    since: timestamp,
                };
            }
            PointerEvent::Move {
                position,
                timestamp,
            } => {
                if let PressPhase::Pending { origin, since } = self.phase {
                    if self.outgrew_tap(origin, since, position, timestamp) {
                        self.effector.left_down(origin.x, origin.y);
                        self.phase = PressPhase::Dragging;
                    }
                }
                self.effector.pointer_move(position.x, position.y);
            }
            PointerEvent::End { position, .. } => {
                match self.phase {
                    PressPhase::Pending { .. } => self.effector.click(position.x, position.y),
                    PressPhase::Dragging => self.effector.left_up(position.x, position.y),
                    PressPhase::Idle => {}
                }
                self.phase = PressPhase::Idle;
            }
        }
    }

    fn outgrew_tap(
        &self,
        origin: DisplayPoint,
        since: u32,
        position: DisplayPoint,
        timestamp: u32,
    ) -> bool {
        if timestamp.wrapping_sub(since) > self.tap_max_duration_ms {
            return true;
        }
        let dx = position.x as i64 - origin.x as i64;
        let dy = position.y as i64 - origin.y as i64;
        let travel = self.tap_max_travel_px as i64;
        dx * dx + dy * dy > travel * travel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::tap;

    #[derive(Default)]
    struct RecordingEffector {
        actions: Vec<String>,
    }

    impl PointerEffector for RecordingEffector {
        fn pointer_move(&mut self, x: u32, y: u32) {
            self.actions.push(format!("move {} {}", x, y));
        }
        fn left_down(&mut self, x: u32, y: u32) {
            self.actions.push(format!("down {} {}", x, y));
        }
        fn left_up(&mut self, x: u32, y: u32) {
            self.actions.push(format!("up {} {}", x, y));
        }
        fn click(&mut self, x: u32, y: u32) {
            self.actions.push(format!("click {} {}", x, y));
        }
    }

    fn at(x: u32, y: u32) -> DisplayPoint {
        DisplayPoint { x, y }
    }

    #[test]
    fn test_quick_touch_is_a_click() {
        let mut driver =
            PointerDriver::new(RecordingEffector::default(), tap::MAX_DURATION_MS, tap::MAX_TRAVEL_PX);
        driver.handle(PointerEvent::Start {
            position: at(50, 60),
            timestamp: 0,
        });
        driver.handle(PointerEvent::Move {
            position: at(51, 60),
            timestamp: 66,
        });
        driver.handle(PointerEvent::End {
            position: at(51, 60),
            timestamp: 132,
        });

        let actions = driver.effector_mut().actions.clone();
        assert_eq!(actions, vec!["move 50 60", "move 51 60", "click 51 60"]);
    }

    #[test]
    fn test_long_press_becomes_drag() {
        let mut driver =
            PointerDriver::new(RecordingEffector::default(), tap::MAX_DURATION_MS, tap::MAX_TRAVEL_PX);
        driver.handle(PointerEvent::Start {
            position: at(100, 100),
            timestamp: 0,
        });
        // Still within the tap window
        driver.handle(PointerEvent::Move {
            position: at(102, 100),
            timestamp: 100,
        });
        // Travel blows past the tap radius: the button commits
        driver.handle(PointerEvent::Move {
            position: at(200, 150),
            timestamp: 200,
        });
        driver.handle(PointerEvent::End {
            position: at(220, 160),
            timestamp: 400,
        });

        let actions = driver.effector_mut().actions.clone();
        assert_eq!(
            actions,
            vec![
                "move 100 100",
                "move 102 100",
                "down 100 100",
                "move 200 150",
                "up 220 160"
            ]
        );
    }

    #[test]
    fn test_slow_press_commits_on_time() {
        let mut driver = PointerDriver::new(RecordingEffector::default(), 300, 12);
        driver.handle(PointerEvent::Start {
            position: at(10, 10),
            timestamp: 0,
        });
        driver.handle(PointerEvent::Move {
            position: at(10, 11),
            timestamp: 500,
        });
        let actions = driver.effector_mut().actions.clone();
        assert!(actions.contains(&"down 10 10".to_string()));
    }
}

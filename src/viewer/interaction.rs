use eframe::egui;

use crate::model::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    DepthUp,
    DepthDown,
}

impl KeyCommand {
    pub const fn delta(self) -> i64 {
        match self {
            Self::DepthUp => 1,
            Self::DepthDown => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    #[default]
    Idle,
    BoxSelecting(Axis),
    Panning(Axis),
    Scrubbing,
}

/// What a pointer event asks the viewer to do. The machine only tracks the
/// gesture; applying an intent to the viewer state happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    CancelEdit,
    StartBox { axis: Axis, at: egui::Pos2 },
    ExtendBox { axis: Axis, to: egui::Pos2 },
    FinishBox { axis: Axis },
    AbortBox { axis: Axis },
    Pan { axis: Axis, delta: egui::Vec2 },
    Scrub { steps: i64, pointer: egui::Pos2 },
}

/// Pointer gesture state shared by all canvases. Only one gesture is live at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMachine {
    phase: PointerPhase,
    gesture_axis: Option<Axis>,
    last: egui::Pos2,
    scrub_anchor_y: f32,
    scrub_sensitivity: f32,
}

impl Default for PointerMachine {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl PointerMachine {
    pub fn new(scrub_sensitivity: f32) -> Self {
        Self {
            phase: PointerPhase::Idle,
            gesture_axis: None,
            last: egui::Pos2::ZERO,
            scrub_anchor_y: 0.0,
            scrub_sensitivity,
        }
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn press(&mut self, axis: Axis, button: PointerButton, at: egui::Pos2) -> Vec<Intent> {
        if self.phase != PointerPhase::Idle {
            return Vec::new();
        }
        let intents = match button {
            PointerButton::Primary if axis.is_cross_section() => {
                self.phase = PointerPhase::BoxSelecting(axis);
                // A fresh box expresses a new range; the viewer drops any edit in progress.
                vec![Intent::CancelEdit, Intent::StartBox { axis, at }]
            }
            PointerButton::Primary => return Vec::new(),
            PointerButton::Middle => {
                self.phase = PointerPhase::Panning(axis);
                Vec::new()
            }
            PointerButton::Secondary => {
                self.phase = PointerPhase::Scrubbing;
                self.scrub_anchor_y = at.y;
                Vec::new()
            }
        };
        self.gesture_axis = Some(axis);
        self.last = at;
        log::debug!("pointer gesture {:?} started on axis {axis}", self.phase);
        intents
    }

    pub fn motion(&mut self, axis: Axis, at: egui::Pos2) -> Vec<Intent> {
        if self.gesture_axis != Some(axis) {
            return Vec::new();
        }
        match self.phase {
            PointerPhase::Idle => Vec::new(),
            PointerPhase::BoxSelecting(box_axis) => {
                self.last = at;
                vec![Intent::ExtendBox {
                    axis: box_axis,
                    to: at,
                }]
            }
            PointerPhase::Panning(pan_axis) => {
                let delta = at - self.last;
                self.last = at;
                if delta == egui::Vec2::ZERO {
                    return Vec::new();
                }
                vec![Intent::Pan {
                    axis: pan_axis,
                    delta,
                }]
            }
            PointerPhase::Scrubbing => {
                self.last = at;
                let steps = round_half_up(-(at.y - self.scrub_anchor_y) * self.scrub_sensitivity);
                if steps == 0 {
                    return Vec::new();
                }
                vec![Intent::Scrub { steps, pointer: at }]
            }
        }
    }

    /// Restarts scrub accumulation once a depth change has been committed.
    pub fn rebase_scrub(&mut self, pointer: egui::Pos2) {
        if self.phase == PointerPhase::Scrubbing {
            self.scrub_anchor_y = pointer.y;
        }
    }

    pub fn release(&mut self) -> Vec<Intent> {
        let intents = match self.phase {
            PointerPhase::BoxSelecting(axis) => vec![Intent::FinishBox { axis }],
            _ => Vec::new(),
        };
        self.reset();
        intents
    }

    /// The pointer left the window: the gesture ends without committing a box.
    pub fn leave(&mut self) -> Vec<Intent> {
        let intents = match self.phase {
            PointerPhase::BoxSelecting(axis) => vec![Intent::AbortBox { axis }],
            _ => Vec::new(),
        };
        self.reset();
        intents
    }

    fn reset(&mut self) {
        if self.phase != PointerPhase::Idle {
            log::debug!("pointer gesture {:?} ended", self.phase);
        }
        self.phase = PointerPhase::Idle;
        self.gesture_axis = None;
    }
}

fn round_half_up(value: f32) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use eframe::egui;

    use super::{Intent, PointerButton, PointerMachine, PointerPhase};
    use crate::model::Axis;

    #[test]
    fn button_selects_gesture() {
        let mut machine = PointerMachine::default();
        let intents = machine.press(Axis::X, PointerButton::Primary, egui::pos2(1.0, 2.0));
        assert_eq!(machine.phase(), PointerPhase::BoxSelecting(Axis::X));
        assert_eq!(
            intents,
            vec![
                Intent::CancelEdit,
                Intent::StartBox {
                    axis: Axis::X,
                    at: egui::pos2(1.0, 2.0)
                }
            ]
        );
        machine.release();

        machine.press(Axis::Z, PointerButton::Middle, egui::Pos2::ZERO);
        assert_eq!(machine.phase(), PointerPhase::Panning(Axis::Z));
        machine.release();

        machine.press(Axis::Y, PointerButton::Secondary, egui::Pos2::ZERO);
        assert_eq!(machine.phase(), PointerPhase::Scrubbing);
        machine.leave();
        assert_eq!(machine.phase(), PointerPhase::Idle);
    }

    #[test]
    fn primary_on_depth_view_stays_idle() {
        let mut machine = PointerMachine::default();
        assert!(
            machine
                .press(Axis::Z, PointerButton::Primary, egui::Pos2::ZERO)
                .is_empty()
        );
        assert_eq!(machine.phase(), PointerPhase::Idle);
    }

    #[test]
    fn second_press_does_not_replace_gesture() {
        let mut machine = PointerMachine::default();
        machine.press(Axis::X, PointerButton::Middle, egui::Pos2::ZERO);
        assert!(
            machine
                .press(Axis::Y, PointerButton::Primary, egui::Pos2::ZERO)
                .is_empty()
        );
        assert_eq!(machine.phase(), PointerPhase::Panning(Axis::X));
    }

    #[test]
    fn pan_reports_incremental_deltas() {
        let mut machine = PointerMachine::default();
        machine.press(Axis::Y, PointerButton::Middle, egui::pos2(10.0, 10.0));
        assert_eq!(
            machine.motion(Axis::Y, egui::pos2(15.0, 7.0)),
            vec![Intent::Pan {
                axis: Axis::Y,
                delta: egui::vec2(5.0, -3.0)
            }]
        );
        assert_eq!(
            machine.motion(Axis::Y, egui::pos2(16.0, 7.0)),
            vec![Intent::Pan {
                axis: Axis::Y,
                delta: egui::vec2(1.0, 0.0)
            }]
        );
        assert!(machine.motion(Axis::X, egui::pos2(99.0, 99.0)).is_empty());
    }

    #[test]
    fn scrub_accumulates_until_rebased() {
        let mut machine = PointerMachine::default();
        machine.press(Axis::X, PointerButton::Secondary, egui::pos2(0.0, 100.0));
        assert!(machine.motion(Axis::X, egui::pos2(0.0, 99.5)).is_empty());
        assert_eq!(
            machine.motion(Axis::X, egui::pos2(0.0, 96.0)),
            vec![Intent::Scrub {
                steps: 2,
                pointer: egui::pos2(0.0, 96.0)
            }]
        );
        machine.rebase_scrub(egui::pos2(0.0, 96.0));
        assert_eq!(
            machine.motion(Axis::X, egui::pos2(0.0, 102.0)),
            vec![Intent::Scrub {
                steps: -3,
                pointer: egui::pos2(0.0, 102.0)
            }]
        );
    }

    #[test]
    fn release_commits_and_leave_aborts_box() {
        let mut machine = PointerMachine::default();
        machine.press(Axis::Y, PointerButton::Primary, egui::Pos2::ZERO);
        assert_eq!(machine.release(), vec![Intent::FinishBox { axis: Axis::Y }]);

        machine.press(Axis::Y, PointerButton::Primary, egui::Pos2::ZERO);
        assert_eq!(machine.leave(), vec![Intent::AbortBox { axis: Axis::Y }]);
    }
}

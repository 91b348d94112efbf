use std::time::Instant;

use super::command::Command;
use super::throttle::{Channel, ThrottleGate};
use crate::init::config::Configuration;

/// Recognizer for the dedicated scrollbar strip. Much simpler than the
/// primary surface: two states (idle / dragging), one axis, and every
/// sample while dragging is a scroll delta.
///
/// `last_y` advances on every raw sample; motion suppressed by the gate
/// is carried in `pending_dy` and flushed with the next permitted
/// emission, so the emitted deltas always sum to the raw displacement.
pub struct ScrollbarMachine {
    drag: Option<Drag>,
    gate: ThrottleGate,
    sensitivity: f64,
}

struct Drag {
    last_y: f64,
    pending_dy: f64,
}

impl ScrollbarMachine {
    pub fn new(cfg: &Configuration) -> Self {
        ScrollbarMachine {
            drag: None,
            gate: ThrottleGate::new(cfg.throttle_ms),
            sensitivity: cfg.scrollbar_sensitivity,
        }
    }

    pub fn touch_down(&mut self, y: f64) {
        self.drag = Some(Drag {
            last_y: y,
            pending_dy: 0.0,
        });
    }

    pub fn touch_move(&mut self, y: f64, now: Instant) -> Option<Command> {
        let drag = self.drag.as_mut()?;

        let pending = drag.pending_dy + (y - drag.last_y);
        drag.last_y = y;

        if self.gate.permit(Channel::Scroll, now) {
            drag.pending_dy = 0.0;
            Some(Command::Scroll {
                dy: pending * self.sensitivity,
            })
        } else {
            drag.pending_dy = pending;
            None
        }
    }

    pub fn touch_up(&mut self) {
        self.drag = None;
    }

    /// Same as release; nothing to unwind, safe in any state.
    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

use std::mem;
use std::time::Instant;

use serde::Deserialize;
use tracing::trace;

use super::command::Command;
use super::throttle::{Channel, ThrottleGate};
use crate::init::config::Configuration;

/// One active contact as reported by the platform for the current frame.
/// Points arrive ordered oldest-contact-first, so `points[0]` is always
/// the primary contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

/// What to do with motion that crosses the movement threshold while the
/// long-press timer is still running.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePolicy {
    /// Cancel the timer and start moving the cursor right away.
    #[serde(rename = "immediate")]
    Immediate,
    /// Keep the timer running and ignore the motion; the contact is
    /// still marked as moved, so releasing it won't produce a tap.
    #[serde(rename = "afterHold")]
    AfterHold,
}

/// Instruction to the runtime about the long-press timer. Arming hands
/// out a generation number; a fire carrying any other generation is
/// stale and gets ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    None,
    Arm { generation: u64 },
    Disarm,
}

/// Result of feeding one event into a gesture machine: commands to put
/// on the wire, plus any timer change. Commands have remote side effects
/// and cannot be retracted once returned from here.
#[derive(Debug, PartialEq)]
pub struct Effects {
    pub commands: Vec<Command>,
    pub timer: TimerOp,
}

impl Effects {
    fn none() -> Self {
        Effects {
            commands: Vec::new(),
            timer: TimerOp::None,
        }
    }

    fn emit(cmd: Command) -> Self {
        Effects {
            commands: vec![cmd],
            timer: TimerOp::None,
        }
    }
}

/// Session state for the primary surface. Each variant carries exactly
/// the fields that are valid in it; there is no timer handle outside
/// `Pressing` and no anchor pair outside `TwoFingerCandidate`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PadState {
    Idle,
    /// Single contact down, long-press timer running.
    Pressing {
        start: (f64, f64),
        last: (f64, f64),
        moved: bool,
        generation: u64,
    },
    /// Tracking single-contact motion. `button_down` records whether a
    /// `down` was emitted (hold completed), which decides whether release
    /// owes the remote an `up`.
    Dragging {
        last: (f64, f64),
        button_down: bool,
        pending: (f64, f64),
    },
    /// Two contacts down, not yet classified as tap or scroll.
    TwoFingerCandidate { anchors: [(f64, f64); 2] },
    /// Two-contact scroll. `pending_dy` accumulates motion suppressed by
    /// the throttle gate so no displacement is lost.
    Scrolling { last_avg_y: f64, pending_dy: f64 },
}

/// The primary-surface classifier. Feed it `touch_down` / `touch_move` /
/// `touch_up` / `cancel` / `hold_expired` and apply the returned
/// `Effects`; it never blocks and never talks to the transport itself.
pub struct TouchpadMachine {
    state: PadState,
    gate: ThrottleGate,
    move_threshold: f64,
    scroll_sensitivity: f64,
    policy: MovePolicy,
    generation: u64,
}

impl TouchpadMachine {
    pub fn new(cfg: &Configuration) -> Self {
        TouchpadMachine {
            state: PadState::Idle,
            gate: ThrottleGate::new(cfg.throttle_ms),
            move_threshold: cfg.move_threshold,
            scroll_sensitivity: cfg.scroll_sensitivity,
            policy: cfg.move_policy,
            generation: 0,
        }
    }

    /// Contact count went up. `points` is every contact now down on the
    /// surface, oldest first.
    pub fn touch_down(&mut self, points: &[TouchPoint]) -> Effects {
        let Some(p0) = xy(points, 0) else {
            // an event that implies at least one contact but carries none
            return Effects::none();
        };

        match self.state {
            PadState::Idle => {
                if let Some(p1) = xy(points, 1) {
                    self.state = PadState::TwoFingerCandidate { anchors: [p0, p1] };
                    Effects::none()
                } else {
                    let generation = self.next_generation();
                    self.state = PadState::Pressing {
                        start: p0,
                        last: p0,
                        moved: false,
                        generation,
                    };
                    Effects {
                        commands: Vec::new(),
                        timer: TimerOp::Arm { generation },
                    }
                }
            }
            PadState::Pressing { .. } => {
                if let Some(p1) = xy(points, 1) {
                    // second finger landed before the hold completed
                    self.state = PadState::TwoFingerCandidate { anchors: [p0, p1] };
                    Effects {
                        commands: Vec::new(),
                        timer: TimerOp::Disarm,
                    }
                } else {
                    Effects::none()
                }
            }
            PadState::Dragging {
                button_down,
                pending,
                ..
            } => {
                if points.len() >= 2 && !button_down {
                    if let Some(p1) = xy(points, 1) {
                        self.state = PadState::TwoFingerCandidate { anchors: [p0, p1] };
                    }
                } else {
                    // an extra finger during a held drag is ignored;
                    // breaking the drag here would orphan the `down`
                    self.state = PadState::Dragging {
                        last: p0,
                        button_down,
                        pending,
                    };
                }
                Effects::none()
            }
            // three or more contacts are out of scope
            PadState::TwoFingerCandidate { .. } | PadState::Scrolling { .. } => Effects::none(),
        }
    }

    pub fn touch_move(&mut self, points: &[TouchPoint], now: Instant) -> Effects {
        let Some(p0) = xy(points, 0) else {
            return Effects::none();
        };

        match self.state {
            PadState::Idle => Effects::none(),

            PadState::Pressing {
                start,
                moved,
                generation,
                ..
            } => {
                if !exceeds_threshold(p0, start, self.move_threshold) {
                    self.state = PadState::Pressing {
                        start,
                        last: p0,
                        moved,
                        generation,
                    };
                    return Effects::none();
                }
                match self.policy {
                    MovePolicy::Immediate => {
                        trace!("movement threshold crossed, reclassifying as cursor move");
                        // seed the drag at the touch-down point so the
                        // jump past the threshold isn't swallowed
                        self.state = PadState::Dragging {
                            last: start,
                            button_down: false,
                            pending: (0.0, 0.0),
                        };
                        let mut fx = self.drag_move(p0, now);
                        fx.timer = TimerOp::Disarm;
                        fx
                    }
                    MovePolicy::AfterHold => {
                        self.state = PadState::Pressing {
                            start,
                            last: p0,
                            moved: true,
                            generation,
                        };
                        Effects::none()
                    }
                }
            }

            PadState::Dragging { .. } => self.drag_move(p0, now),

            PadState::TwoFingerCandidate { anchors } => {
                let Some(p1) = xy(points, 1) else {
                    return Effects::none();
                };
                // each contact is checked against its own anchor, so the
                // tap window closes as soon as either finger drifts
                if exceeds_threshold(p0, anchors[0], self.move_threshold)
                    || exceeds_threshold(p1, anchors[1], self.move_threshold)
                {
                    trace!("two-finger contact moved, now scrolling");
                    self.state = PadState::Scrolling {
                        last_avg_y: (p0.1 + p1.1) / 2.0,
                        pending_dy: 0.0,
                    };
                }
                Effects::none()
            }

            PadState::Scrolling {
                last_avg_y,
                pending_dy,
            } => {
                let Some(p1) = xy(points, 1) else {
                    return Effects::none();
                };
                let avg_y = (p0.1 + p1.1) / 2.0;
                let pending = pending_dy + (avg_y - last_avg_y);

                if self.gate.permit(Channel::Scroll, now) {
                    self.state = PadState::Scrolling {
                        last_avg_y: avg_y,
                        pending_dy: 0.0,
                    };
                    Effects::emit(Command::Scroll {
                        dy: pending * self.scroll_sensitivity,
                    })
                } else {
                    self.state = PadState::Scrolling {
                        last_avg_y: avg_y,
                        pending_dy: pending,
                    };
                    Effects::none()
                }
            }
        }
    }

    /// Contact count went down. `points` is what remains on the surface.
    pub fn touch_up(&mut self, points: &[TouchPoint]) -> Effects {
        match self.state {
            PadState::Idle => Effects::none(),

            PadState::Pressing { moved, .. } => {
                if !points.is_empty() {
                    return Effects::none();
                }
                self.state = PadState::Idle;
                let mut fx = Effects {
                    commands: Vec::new(),
                    timer: TimerOp::Disarm,
                };
                if !moved {
                    fx.commands.push(Command::Press);
                }
                fx
            }

            PadState::Dragging {
                button_down,
                pending,
                ..
            } => {
                if let Some(p0) = xy(points, 0) {
                    // a secondary contact lifted; keep following the rest
                    self.state = PadState::Dragging {
                        last: p0,
                        button_down,
                        pending,
                    };
                    return Effects::none();
                }
                self.state = PadState::Idle;
                if button_down {
                    Effects::emit(Command::Up)
                } else {
                    Effects::none()
                }
            }

            PadState::TwoFingerCandidate { .. } => match xy(points, 0) {
                None => {
                    self.state = PadState::Idle;
                    Effects::emit(Command::RightPress)
                }
                Some(p0) => {
                    // one finger left before either moved: fall through to
                    // plain cursor tracking without re-arming the hold
                    self.state = PadState::Dragging {
                        last: p0,
                        button_down: false,
                        pending: (0.0, 0.0),
                    };
                    Effects::none()
                }
            },

            PadState::Scrolling { .. } => match xy(points, 0) {
                None => {
                    self.state = PadState::Idle;
                    Effects::none()
                }
                Some(p0) => {
                    self.state = PadState::Dragging {
                        last: p0,
                        button_down: false,
                        pending: (0.0, 0.0),
                    };
                    Effects::none()
                }
            },
        }
    }

    /// Platform-level touch cancel. Safe to call in any state, any number
    /// of times.
    pub fn cancel(&mut self) -> Effects {
        let was = mem::replace(&mut self.state, PadState::Idle);
        let mut fx = Effects {
            commands: Vec::new(),
            timer: TimerOp::Disarm,
        };
        if let PadState::Dragging {
            button_down: true, ..
        } = was
        {
            fx.commands.push(Command::Up);
        }
        fx
    }

    /// The long-press timer fired. A generation that doesn't match the
    /// one armed by the current `Pressing` state means the session moved
    /// on while the fire was in flight; it is dropped.
    pub fn hold_expired(&mut self, generation: u64) -> Effects {
        match self.state {
            PadState::Pressing {
                last,
                generation: armed,
                ..
            } if armed == generation => {
                trace!("hold completed, starting drag");
                self.state = PadState::Dragging {
                    last,
                    button_down: true,
                    pending: (0.0, 0.0),
                };
                Effects::emit(Command::Down)
            }
            _ => {
                trace!(generation, "stale hold timer fire ignored");
                Effects::none()
            }
        }
    }

    fn drag_move(&mut self, p0: (f64, f64), now: Instant) -> Effects {
        let PadState::Dragging {
            last,
            button_down,
            pending,
        } = self.state
        else {
            return Effects::none();
        };

        let pending = (pending.0 + p0.0 - last.0, pending.1 + p0.1 - last.1);

        if self.gate.permit(Channel::Move, now) {
            self.state = PadState::Dragging {
                last: p0,
                button_down,
                pending: (0.0, 0.0),
            };
            Effects::emit(Command::Move {
                dx: pending.0,
                dy: pending.1,
            })
        } else {
            // suppressed sample: advance the raw position, carry the delta
            self.state = PadState::Dragging {
                last: p0,
                button_down,
                pending,
            };
            Effects::none()
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

fn xy(points: &[TouchPoint], i: usize) -> Option<(f64, f64)> {
    points.get(i).map(|p| (p.x, p.y))
}

fn exceeds_threshold(p: (f64, f64), from: (f64, f64), threshold: f64) -> bool {
    (p.0 - from.0).abs() > threshold || (p.1 - from.1).abs() > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn machine() -> TouchpadMachine {
        TouchpadMachine::new(&Configuration::default())
    }

    fn machine_with(f: impl FnOnce(&mut Configuration)) -> TouchpadMachine {
        let mut cfg = Configuration::default();
        f(&mut cfg);
        TouchpadMachine::new(&cfg)
    }

    fn pt(id: u32, x: f64, y: f64) -> TouchPoint {
        TouchPoint { id, x, y }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn armed_generation(fx: &Effects) -> u64 {
        match fx.timer {
            TimerOp::Arm { generation } => generation,
            other => panic!("expected an armed timer, got {:?}", other),
        }
    }

    #[test]
    fn quick_stationary_tap_emits_press_only() {
        let mut m = machine();
        let fx = m.touch_down(&[pt(1, 100.0, 100.0)]);
        assert!(matches!(fx.timer, TimerOp::Arm { .. }));
        assert!(fx.commands.is_empty());

        let fx = m.touch_up(&[]);
        assert_eq!(fx.commands, vec![Command::Press]);
        assert_eq!(fx.timer, TimerOp::Disarm);
    }

    #[test]
    fn tap_with_subthreshold_wiggle_still_presses() {
        let mut m = machine();
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 100.0, 100.0)]);
        let fx = m.touch_move(&[pt(1, 103.0, 102.0)], t0);
        assert!(fx.commands.is_empty());

        let fx = m.touch_up(&[]);
        assert_eq!(fx.commands, vec![Command::Press]);
    }

    #[test]
    fn completed_hold_emits_down_then_up_and_no_press() {
        let mut m = machine();
        let fx = m.touch_down(&[pt(1, 50.0, 50.0)]);
        let generation = armed_generation(&fx);

        let fx = m.hold_expired(generation);
        assert_eq!(fx.commands, vec![Command::Down]);

        let fx = m.touch_up(&[]);
        assert_eq!(fx.commands, vec![Command::Up]);
    }

    #[test]
    fn down_is_emitted_at_most_once_per_session() {
        let mut m = machine();
        let fx = m.touch_down(&[pt(1, 50.0, 50.0)]);
        let generation = armed_generation(&fx);

        assert_eq!(m.hold_expired(generation).commands, vec![Command::Down]);
        // a duplicate fire of the same generation must not double the down
        assert!(m.hold_expired(generation).commands.is_empty());
    }

    #[test]
    fn stale_timer_fire_after_release_is_ignored() {
        let mut m = machine();
        let fx = m.touch_down(&[pt(1, 50.0, 50.0)]);
        let generation = armed_generation(&fx);

        let fx = m.touch_up(&[]);
        assert_eq!(fx.commands, vec![Command::Press]);

        // the fire was already queued when the session reset
        let fx = m.hold_expired(generation);
        assert!(fx.commands.is_empty());
        assert_eq!(fx.timer, TimerOp::None);
    }

    #[test]
    fn stale_timer_fire_does_not_hijack_the_next_session() {
        let mut m = machine();
        let first = armed_generation(&m.touch_down(&[pt(1, 50.0, 50.0)]));
        m.touch_up(&[]);

        let second = armed_generation(&m.touch_down(&[pt(2, 60.0, 60.0)]));
        assert_ne!(first, second);

        assert!(m.hold_expired(first).commands.is_empty());
        assert_eq!(m.hold_expired(second).commands, vec![Command::Down]);
    }

    #[test]
    fn immediate_policy_reclassifies_movement_as_cursor_move() {
        let mut m = machine();
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 100.0, 100.0)]);

        let fx = m.touch_move(&[pt(1, 110.0, 100.0)], t0);
        assert_eq!(fx.timer, TimerOp::Disarm);
        assert_eq!(fx.commands, vec![Command::Move { dx: 10.0, dy: 0.0 }]);

        // release after movement: neither press nor up
        let fx = m.touch_up(&[]);
        assert!(fx.commands.is_empty());
    }

    #[test]
    fn after_hold_policy_ignores_movement_until_the_timer_fires() {
        let mut m = machine_with(|cfg| cfg.move_policy = MovePolicy::AfterHold);
        let t0 = Instant::now();
        let generation = armed_generation(&m.touch_down(&[pt(1, 100.0, 100.0)]));

        let fx = m.touch_move(&[pt(1, 140.0, 100.0)], t0);
        assert!(fx.commands.is_empty());
        assert_eq!(fx.timer, TimerOp::None);

        // moved contacts never tap, even though the hold never completed
        let fx = m.touch_up(&[]);
        assert!(fx.commands.is_empty());
        assert_eq!(fx.timer, TimerOp::Disarm);
        // and the timer generation is dead
        assert!(m.hold_expired(generation).commands.is_empty());
    }

    #[test]
    fn after_hold_policy_drags_from_the_fire_position() {
        let mut m = machine_with(|cfg| cfg.move_policy = MovePolicy::AfterHold);
        let t0 = Instant::now();
        let generation = armed_generation(&m.touch_down(&[pt(1, 100.0, 100.0)]));

        m.touch_move(&[pt(1, 140.0, 100.0)], t0);
        assert_eq!(m.hold_expired(generation).commands, vec![Command::Down]);

        let fx = m.touch_move(&[pt(1, 145.0, 100.0)], t0 + ms(200));
        assert_eq!(fx.commands, vec![Command::Move { dx: 5.0, dy: 0.0 }]);
    }

    #[test]
    fn throttled_drag_deltas_accumulate_instead_of_vanishing() {
        let mut m = machine_with(|cfg| cfg.throttle_ms = ms(50));
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 0.0, 0.0)]);

        // crossing the threshold consumes the first move permit
        let fx = m.touch_move(&[pt(1, 10.0, 0.0)], t0);
        assert_eq!(fx.commands, vec![Command::Move { dx: 10.0, dy: 0.0 }]);

        // these two land inside the interval and are suppressed
        assert!(m.touch_move(&[pt(1, 14.0, 0.0)], t0 + ms(10)).commands.is_empty());
        assert!(m.touch_move(&[pt(1, 18.0, 0.0)], t0 + ms(20)).commands.is_empty());

        // the next permitted emission carries everything since the last one
        let fx = m.touch_move(&[pt(1, 20.0, 0.0)], t0 + ms(60));
        assert_eq!(fx.commands, vec![Command::Move { dx: 10.0, dy: 0.0 }]);
    }

    #[test]
    fn two_finger_tap_emits_exactly_one_right_press() {
        let mut m = machine();
        let fx = m.touch_down(&[pt(1, 100.0, 100.0), pt(2, 150.0, 100.0)]);
        assert!(fx.commands.is_empty());

        let fx = m.touch_up(&[]);
        assert_eq!(fx.commands, vec![Command::RightPress]);

        // nothing further from an idle machine
        assert!(m.touch_up(&[]).commands.is_empty());
    }

    #[test]
    fn second_finger_during_pressing_disarms_and_becomes_a_candidate() {
        let mut m = machine();
        m.touch_down(&[pt(1, 100.0, 100.0)]);
        let fx = m.touch_down(&[pt(1, 100.0, 100.0), pt(2, 150.0, 100.0)]);
        assert_eq!(fx.timer, TimerOp::Disarm);

        let fx = m.touch_up(&[]);
        assert_eq!(fx.commands, vec![Command::RightPress]);
    }

    #[test]
    fn moved_two_finger_contact_scrolls_and_never_right_presses() {
        let mut m = machine();
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 100.0, 100.0), pt(2, 150.0, 100.0)]);

        // second finger drifts past threshold: reclassified, no command yet
        let fx = m.touch_move(&[pt(1, 100.0, 100.0), pt(2, 150.0, 110.0)], t0);
        assert!(fx.commands.is_empty());

        // both fingers slide down 10: average-Y delta is 10
        let fx = m.touch_move(&[pt(1, 100.0, 115.0), pt(2, 150.0, 115.0)], t0 + ms(100));
        assert_eq!(fx.commands, vec![Command::Scroll { dy: 10.0 }]);

        let fx = m.touch_up(&[]);
        assert!(fx.commands.is_empty(), "no right_press after scrolling");
    }

    #[test]
    fn scroll_applies_sensitivity() {
        let mut m = machine_with(|cfg| cfg.scroll_sensitivity = 2.0);
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 0.0, 100.0), pt(2, 50.0, 100.0)]);
        m.touch_move(&[pt(1, 0.0, 110.0), pt(2, 50.0, 110.0)], t0);

        let fx = m.touch_move(&[pt(1, 0.0, 115.0), pt(2, 50.0, 115.0)], t0 + ms(100));
        assert_eq!(fx.commands, vec![Command::Scroll { dy: 10.0 }]);
    }

    #[test]
    fn throttled_scroll_deltas_accumulate() {
        let mut m = machine_with(|cfg| cfg.throttle_ms = ms(50));
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 0.0, 100.0), pt(2, 50.0, 100.0)]);
        // classification move (both +20, past threshold)
        m.touch_move(&[pt(1, 0.0, 120.0), pt(2, 50.0, 120.0)], t0);

        let fx = m.touch_move(&[pt(1, 0.0, 125.0), pt(2, 50.0, 125.0)], t0 + ms(1));
        assert_eq!(fx.commands, vec![Command::Scroll { dy: 5.0 }]);

        assert!(m
            .touch_move(&[pt(1, 0.0, 130.0), pt(2, 50.0, 130.0)], t0 + ms(10))
            .commands
            .is_empty());

        let fx = m.touch_move(&[pt(1, 0.0, 140.0), pt(2, 50.0, 140.0)], t0 + ms(60));
        assert_eq!(fx.commands, vec![Command::Scroll { dy: 15.0 }]);
    }

    #[test]
    fn candidate_dropping_to_one_finger_resumes_plain_tracking() {
        let mut m = machine();
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 100.0, 100.0), pt(2, 150.0, 100.0)]);

        let fx = m.touch_up(&[pt(1, 100.0, 100.0)]);
        assert!(fx.commands.is_empty(), "no right_press with a finger down");
        assert_eq!(fx.timer, TimerOp::None, "hold timer is not re-armed");

        // the remaining finger moves the cursor, it does not drag
        let fx = m.touch_move(&[pt(1, 120.0, 100.0)], t0);
        assert_eq!(fx.commands, vec![Command::Move { dx: 20.0, dy: 0.0 }]);

        let fx = m.touch_up(&[]);
        assert!(fx.commands.is_empty(), "no up: no down was ever emitted");
    }

    #[test]
    fn scrolling_dropping_to_one_finger_resumes_plain_tracking() {
        let mut m = machine();
        let t0 = Instant::now();
        m.touch_down(&[pt(1, 0.0, 100.0), pt(2, 50.0, 100.0)]);
        m.touch_move(&[pt(1, 0.0, 120.0), pt(2, 50.0, 120.0)], t0);

        let fx = m.touch_up(&[pt(1, 0.0, 120.0)]);
        assert!(fx.commands.is_empty());

        let fx = m.touch_move(&[pt(1, 5.0, 120.0)], t0 + ms(100));
        assert_eq!(fx.commands, vec![Command::Move { dx: 5.0, dy: 0.0 }]);
    }

    #[test]
    fn cancel_during_held_drag_emits_exactly_one_up() {
        let mut m = machine();
        let generation = armed_generation(&m.touch_down(&[pt(1, 50.0, 50.0)]));
        m.hold_expired(generation);

        // no move was ever emitted, the up is still owed
        let fx = m.cancel();
        assert_eq!(fx.commands, vec![Command::Up]);
        assert_eq!(fx.timer, TimerOp::Disarm);

        // cancel is idempotent
        let fx = m.cancel();
        assert!(fx.commands.is_empty());
    }

    #[test]
    fn cancel_while_pressing_disarms_and_stays_silent() {
        let mut m = machine();
        m.touch_down(&[pt(1, 50.0, 50.0)]);
        let fx = m.cancel();
        assert!(fx.commands.is_empty());
        assert_eq!(fx.timer, TimerOp::Disarm);
    }

    #[test]
    fn cancel_on_idle_machine_is_a_no_op() {
        let mut m = machine();
        let fx = m.cancel();
        assert!(fx.commands.is_empty());
    }

    #[test]
    fn empty_point_list_on_down_or_move_changes_nothing() {
        let mut m = machine();
        assert!(m.touch_down(&[]).commands.is_empty());
        assert_eq!(m.touch_down(&[]).timer, TimerOp::None);
        assert!(m.touch_move(&[], Instant::now()).commands.is_empty());

        // machine is still idle and still taps normally
        m.touch_down(&[pt(1, 10.0, 10.0)]);
        assert_eq!(m.touch_up(&[]).commands, vec![Command::Press]);
    }

    #[test]
    fn every_down_is_followed_by_exactly_one_up() {
        // run a busy session and check the pairing invariant on the log
        let mut m = machine();
        let t0 = Instant::now();
        let mut log: Vec<Command> = Vec::new();
        let push = |fx: Effects, log: &mut Vec<Command>| log.extend(fx.commands);

        let generation = armed_generation(&m.touch_down(&[pt(1, 0.0, 0.0)]));
        push(m.hold_expired(generation), &mut log);
        push(m.touch_move(&[pt(1, 30.0, 0.0)], t0), &mut log);
        push(m.touch_up(&[]), &mut log);

        let generation = armed_generation(&m.touch_down(&[pt(1, 0.0, 0.0)]));
        push(m.hold_expired(generation), &mut log);
        push(m.cancel(), &mut log);

        let mut depth = 0i32;
        for cmd in &log {
            match cmd {
                Command::Down => {
                    depth += 1;
                    assert_eq!(depth, 1, "nested down");
                }
                Command::Up => {
                    depth -= 1;
                    assert_eq!(depth, 0, "up without down");
                }
                _ => {}
            }
        }
        assert_eq!(depth, 0);
        assert_eq!(log.iter().filter(|c| **c == Command::Down).count(), 2);
        assert_eq!(log.iter().filter(|c| **c == Command::Up).count(), 2);
    }
}

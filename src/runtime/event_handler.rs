use std::time::Instant;

use input::{
    event::{
        keyboard::{KeyState, KeyboardEvent, KeyboardEventTrait},
        touch::{TouchEvent, TouchEventPosition, TouchEventSlot},
    },
    Event,
};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::command::Command;
use super::contacts::{ContactTracker, FrameChange, Surface};
use super::emitter::{CommandEmitter, Transport};
use super::keys;
use super::scrollbar::ScrollbarMachine;
use super::touchpad::{Effects, TimerOp, TouchpadMachine};
use crate::init::config::Configuration;

/// Sent from the forked long-press timer task back into the main loop.
#[derive(Debug)]
pub enum ControlSignal {
    HoldExpired { generation: u64 },
}

// (T)ouch (R)elay error
#[derive(Debug)]
pub enum TrError {
    CommandWrite(std::io::Error),
    Connect(tungstenite::Error),
}

impl From<std::io::Error> for TrError {
    fn from(err: std::io::Error) -> Self {
        TrError::CommandWrite(err)
    }
}

impl From<tungstenite::Error> for TrError {
    fn from(err: tungstenite::Error) -> Self {
        TrError::Connect(err)
    }
}

/// Routes libinput events through the contact tracker into the two
/// gesture machines and pushes whatever they decide onto the wire.
/// Also owns the forked long-press timer task: arming spawns a sleep
/// that reports back through the control channel, disarming aborts it.
pub struct TouchTranslator<T: Transport> {
    pub cfg: Configuration,
    tracker: ContactTracker,
    pad: TouchpadMachine,
    scrollbar: ScrollbarMachine,
    emitter: CommandEmitter<T>,
    tx: Sender<ControlSignal>,
    hold_task: Option<JoinHandle<()>>,
}

impl<T: Transport> TouchTranslator<T> {
    pub fn new(cfg: Configuration, transport: T, tx: Sender<ControlSignal>) -> Self {
        TouchTranslator {
            tracker: ContactTracker::new(&cfg),
            pad: TouchpadMachine::new(&cfg),
            scrollbar: ScrollbarMachine::new(&cfg),
            emitter: CommandEmitter::new(transport),
            cfg,
            tx,
            hold_task: None,
        }
    }

    pub fn translate(&mut self, event: Event) -> Result<(), TrError> {
        trace!("Event received: {:?}", event);

        match event {
            Event::Touch(touch_ev) => self.handle_touch(touch_ev),
            Event::Keyboard(kb_ev) => self.handle_keyboard(kb_ev),
            _ => Ok(()),
        }
    }

    /// A timer task reported in through the control channel.
    pub fn handle_signal(&mut self, sig: ControlSignal) -> Result<(), TrError> {
        match sig {
            ControlSignal::HoldExpired { generation } => {
                debug!(generation, "long-press timer fired");
                let fx = self.pad.hold_expired(generation);
                self.apply(fx)
            }
        }
    }

    fn handle_touch(&mut self, ev: TouchEvent) -> Result<(), TrError> {
        let width = self.cfg.surface_width as u32;
        let height = self.cfg.surface_height as u32;

        match ev {
            TouchEvent::Down(down) => {
                self.touch_begin(
                    down.seat_slot() as u32,
                    down.x_transformed(width),
                    down.y_transformed(height),
                );
                Ok(())
            }
            TouchEvent::Motion(motion) => {
                self.touch_motion(
                    motion.seat_slot() as u32,
                    motion.x_transformed(width),
                    motion.y_transformed(height),
                );
                Ok(())
            }
            TouchEvent::Up(up) => {
                self.touch_end(up.seat_slot() as u32);
                Ok(())
            }
            TouchEvent::Cancel(_) => self.touch_cancelled(),
            TouchEvent::Frame(_) => self.touch_frame(),
            _ => Ok(()),
        }
    }

    fn handle_keyboard(&mut self, ev: KeyboardEvent) -> Result<(), TrError> {
        match ev {
            KeyboardEvent::Key(key_ev) => {
                if key_ev.key_state() != KeyState::Pressed {
                    return Ok(());
                }
                self.key_pressed(key_ev.key())
            }
            _ => Ok(()),
        }
    }

    // The methods below take plain values so the whole pipeline can be
    // driven without a device.

    fn touch_begin(&mut self, slot: u32, x: f64, y: f64) {
        self.tracker.begin(slot, x, y);
    }

    fn touch_motion(&mut self, slot: u32, x: f64, y: f64) {
        self.tracker.motion(slot, x, y);
    }

    fn touch_end(&mut self, slot: u32) {
        self.tracker.end(slot);
    }

    /// Frame boundary: flush tracker changes into the gesture machines.
    fn touch_frame(&mut self) -> Result<(), TrError> {
        let now = Instant::now();

        for update in self.tracker.frame() {
            match update.surface {
                Surface::Primary => {
                    let fx = match update.change {
                        FrameChange::Down => self.pad.touch_down(&update.points),
                        FrameChange::Move => self.pad.touch_move(&update.points, now),
                        FrameChange::Up => self.pad.touch_up(&update.points),
                    };
                    self.apply(fx)?;
                }
                Surface::Scrollbar => match update.change {
                    FrameChange::Down => {
                        if let Some(p) = update.points.first() {
                            self.scrollbar.touch_down(p.y);
                        }
                    }
                    FrameChange::Move => {
                        if let Some(p) = update.points.first() {
                            if let Some(cmd) = self.scrollbar.touch_move(p.y, now) {
                                self.emitter.emit(&cmd)?;
                            }
                        }
                    }
                    FrameChange::Up => match update.points.first() {
                        // re-anchor on the surviving contact
                        Some(p) => self.scrollbar.touch_down(p.y),
                        None => self.scrollbar.touch_up(),
                    },
                },
            }
        }
        Ok(())
    }

    fn touch_cancelled(&mut self) -> Result<(), TrError> {
        debug!("touch cancel, resetting all sessions");
        let fx = self.pad.cancel();
        self.scrollbar.cancel();
        self.tracker.clear();
        self.apply(fx)
    }

    fn key_pressed(&mut self, code: u32) -> Result<(), TrError> {
        match keys::key_name(code) {
            Some(name) => {
                let cmd = Command::Key {
                    key: name.to_string(),
                };
                self.emitter.emit(&cmd).map_err(TrError::from)
            }
            None => {
                trace!(code, "unmapped key ignored");
                Ok(())
            }
        }
    }

    fn apply(&mut self, fx: Effects) -> Result<(), TrError> {
        match fx.timer {
            TimerOp::Arm { generation } => self.arm_hold_timer(generation),
            TimerOp::Disarm => self.disarm_hold_timer(),
            TimerOp::None => {}
        }
        for cmd in &fx.commands {
            self.emitter.emit(cmd)?;
        }
        Ok(())
    }

    fn arm_hold_timer(&mut self, generation: u64) {
        // never two live timers; the machine re-arms per session anyway
        self.disarm_hold_timer();

        let tx = self.tx.clone();
        let delay = self.cfg.press_threshold_ms;

        self.hold_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // a closed channel means shutdown; nothing left to do
            let _ = tx.send(ControlSignal::HoldExpired { generation }).await;
        }));
    }

    /// Synchronous and idempotent. A fire that already made it into the
    /// channel before the abort is rejected by the machine's generation
    /// check instead.
    fn disarm_hold_timer(&mut self) {
        if let Some(task) = self.hold_task.take() {
            task.abort();
        }
    }
}

use std::time::{Duration, Instant};

/// Logical channels for continuous-signal commands. Move-throttling and
/// scroll-throttling must not interfere, so the gate keeps one timestamp
/// per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Move = 0,
    Scroll = 1,
}

/// Rate limiter for `move`/`scroll` emissions. Discrete one-shot commands
/// (press, down, up, right_press, key) never pass through here.
///
/// A permit is granted iff at least `interval` has elapsed since the last
/// permit on the same channel, and granting updates that timestamp. The
/// first request on a channel is always permitted.
#[derive(Debug, Clone)]
pub struct ThrottleGate {
    interval: Duration,
    last_emit: [Option<Instant>; 2],
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        ThrottleGate {
            interval,
            last_emit: [None, None],
        }
    }

    pub fn permit(&mut self, channel: Channel, now: Instant) -> bool {
        let slot = &mut self.last_emit[channel as usize];

        match *slot {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                *slot = Some(now);
                true
            }
        }
    }
}

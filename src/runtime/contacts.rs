use std::collections::BTreeMap;

use super::touchpad::TouchPoint;
use crate::init::config::Configuration;

/// The two logical touch regions. A contact is assigned a surface at
/// touch-down and keeps it until it lifts, even if it wanders across
/// the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Primary = 0,
    Scrollbar = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameChange {
    /// Contact count on the surface went up.
    Down,
    /// Contact count went down; points are what remains.
    Up,
    /// Same contacts, new positions.
    Move,
}

#[derive(Debug, PartialEq)]
pub struct FrameUpdate {
    pub surface: Surface,
    pub change: FrameChange,
    pub points: Vec<TouchPoint>,
}

struct Contact {
    surface: Surface,
    seq: u64,
    x: f64,
    y: f64,
}

/// Accumulates libinput's per-slot touch events and, at each frame
/// boundary, collapses them into per-surface snapshots the gesture
/// machines consume. Points are ordered oldest contact first, so a
/// machine's `points[0]` is stable across a gesture.
pub struct ContactTracker {
    slots: BTreeMap<u32, Contact>,
    seq: u64,
    scrollbar_min_x: f64,
    added: [bool; 2],
    removed: [bool; 2],
    moved: [bool; 2],
}

impl ContactTracker {
    pub fn new(cfg: &Configuration) -> Self {
        ContactTracker {
            slots: BTreeMap::new(),
            seq: 0,
            scrollbar_min_x: cfg.surface_width * (1.0 - cfg.scrollbar_width),
            added: [false; 2],
            removed: [false; 2],
            moved: [false; 2],
        }
    }

    pub fn begin(&mut self, slot: u32, x: f64, y: f64) {
        let surface = if x >= self.scrollbar_min_x {
            Surface::Scrollbar
        } else {
            Surface::Primary
        };
        self.seq += 1;
        self.slots.insert(
            slot,
            Contact {
                surface,
                seq: self.seq,
                x,
                y,
            },
        );
        self.added[surface as usize] = true;
    }

    pub fn motion(&mut self, slot: u32, x: f64, y: f64) {
        if let Some(contact) = self.slots.get_mut(&slot) {
            contact.x = x;
            contact.y = y;
            self.moved[contact.surface as usize] = true;
        }
    }

    pub fn end(&mut self, slot: u32) {
        if let Some(contact) = self.slots.remove(&slot) {
            self.removed[contact.surface as usize] = true;
        }
    }

    /// Drops all contacts and pending changes, for touch-cancel.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.added = [false; 2];
        self.removed = [false; 2];
        self.moved = [false; 2];
    }

    /// Frame boundary: turn everything since the last frame into
    /// surface updates. A count increase wins over motion in the same
    /// frame, since the down snapshot already carries fresh positions.
    pub fn frame(&mut self) -> Vec<FrameUpdate> {
        let mut updates = Vec::new();

        for surface in [Surface::Primary, Surface::Scrollbar] {
            let i = surface as usize;
            let change = if self.added[i] {
                Some(FrameChange::Down)
            } else if self.removed[i] {
                Some(FrameChange::Up)
            } else if self.moved[i] {
                Some(FrameChange::Move)
            } else {
                None
            };

            if let Some(change) = change {
                updates.push(FrameUpdate {
                    surface,
                    change,
                    points: self.points_on(surface),
                });
            }
        }

        self.added = [false; 2];
        self.removed = [false; 2];
        self.moved = [false; 2];
        updates
    }

    fn points_on(&self, surface: Surface) -> Vec<TouchPoint> {
        let mut contacts: Vec<_> = self
            .slots
            .iter()
            .filter(|(_, c)| c.surface == surface)
            .collect();
        contacts.sort_by_key(|(_, c)| c.seq);
        contacts
            .into_iter()
            .map(|(slot, c)| TouchPoint {
                id: *slot,
                x: c.x,
                y: c.y,
            })
            .collect()
    }
}

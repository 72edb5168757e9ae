//! Notification queues
//!
//! The state machines never call listeners directly; they push notifications
//! into queues that the presentation and audio layers drain once per tick.
//! This keeps emission order deterministic and rules out reentrant mutation
//! while a room is mid-update.

use crate::math::Vec2;

/// A queue for events of a single type.
/// Events are collected during the tick and drained between ticks.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Send an event (add to queue)
    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Which plane of a room moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAxis {
    Floor,
    Ceiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Start,
    Stop,
}

/// A room plane started or stopped moving.
///
/// `height` is the plane height at the moment of emission; on a `Stop` this
/// is the height just before snapping to the target.
#[derive(Debug, Clone, Copy)]
pub struct MotionEvent {
    pub room: usize,
    pub axis: MotionAxis,
    pub phase: MotionPhase,
    pub original: f32,
    pub height: f32,
    pub target: f32,
    /// Room center, for spatialization
    pub position: Vec2,
}

/// Discrete sound cues, each with a world position for panning/attenuation
#[derive(Debug, Clone, Copy)]
pub enum SoundEvent {
    DoorOpenBegin { room: usize, position: Vec2 },
    DoorCloseBegin { room: usize, position: Vec2 },
    MotionStart { room: usize, name: &'static str, position: Vec2 },
    MotionStop { room: usize, name: &'static str, position: Vec2 },
    SwitchOn { line: usize, position: Vec2 },
    SwitchOff { line: usize, position: Vec2 },
}

/// Container for all simulation notifications.
pub struct SimEvents {
    pub motion: EventQueue<MotionEvent>,
    pub sound: EventQueue<SoundEvent>,
}

impl SimEvents {
    pub fn new() -> Self {
        Self {
            motion: EventQueue::new(),
            sound: EventQueue::new(),
        }
    }

    /// Clear all queues. Observers that skip a tick forfeit its events.
    pub fn clear_all(&mut self) {
        self.motion.clear();
        self.sound.clear();
    }
}

impl Default for SimEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue() {
        let mut queue: EventQueue<i32> = EventQueue::new();

        queue.send(1);
        queue.send(2);
        queue.send(3);

        assert_eq!(queue.len(), 3);

        let collected: Vec<_> = queue.drain().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let mut events = SimEvents::new();
        events.sound.send(SoundEvent::SwitchOn {
            line: 0,
            position: Vec2::ZERO,
        });
        assert_eq!(events.sound.len(), 1);

        events.clear_all();
        assert!(events.sound.is_empty());
    }
}

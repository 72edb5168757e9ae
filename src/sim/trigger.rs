//! Per-line trigger memory
//!
//! Switch-modifier lines flip a wall texture when they fire and flip back
//! after a delay; while the revert is pending the line must not fire again.
//! One-shot lines (both switch and walkover) retire permanently after their
//! single firing. All of that bookkeeping lives here; the dispatch itself is
//! on `LevelSim`.

use std::collections::{HashMap, HashSet};

use crate::math::Vec2;

use super::events::{SimEvents, SoundEvent};

#[derive(Debug)]
struct PendingRevert {
    remaining: f32,
    position: Vec2,
}

#[derive(Debug, Default)]
pub struct SwitchBank {
    /// One-shot lines that have fired and never will again
    spent: HashSet<usize>,
    /// Lines showing their "on" texture, counting down to revert
    pending: HashMap<usize, PendingRevert>,
}

impl SwitchBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// A switch line fires only when it is neither spent nor mid-revert
    pub fn can_fire(&self, line: usize) -> bool {
        !self.spent.contains(&line) && !self.pending.contains_key(&line)
    }

    pub fn is_spent(&self, line: usize) -> bool {
        self.spent.contains(&line)
    }

    /// Permanently retire a one-shot line
    pub fn spend(&mut self, line: usize) {
        self.spent.insert(line);
    }

    /// Arm the revert countdown after a switch fires
    pub fn flip(&mut self, line: usize, position: Vec2, revert_ms: f32, events: &mut SimEvents) {
        events.sound.send(SoundEvent::SwitchOn { line, position });
        self.pending.insert(
            line,
            PendingRevert {
                remaining: revert_ms,
                position,
            },
        );
    }

    /// Advance revert countdowns; expired switches flip back and may fire
    /// again (unless spent).
    pub fn tick(&mut self, delta: f32, events: &mut SimEvents) {
        let mut expired: Vec<usize> = Vec::new();
        for (&line, revert) in self.pending.iter_mut() {
            revert.remaining -= delta;
            if revert.remaining <= 0.0 {
                expired.push(line);
            }
        }
        expired.sort_unstable();

        for line in expired {
            if let Some(revert) = self.pending.remove(&line) {
                events.sound.send(SoundEvent::SwitchOff {
                    line,
                    position: revert.position,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_revert_blocks_refire() {
        let mut bank = SwitchBank::new();
        let mut events = SimEvents::new();

        assert!(bank.can_fire(3));
        bank.flip(3, Vec2::ZERO, 1500.0, &mut events);
        assert!(!bank.can_fire(3));

        // Not yet expired
        bank.tick(1000.0, &mut events);
        assert!(!bank.can_fire(3));

        // Expired: the line may fire again
        bank.tick(1000.0, &mut events);
        assert!(bank.can_fire(3));
    }

    #[test]
    fn test_exactly_one_on_off_pair() {
        let mut bank = SwitchBank::new();
        let mut events = SimEvents::new();

        bank.flip(5, Vec2::ZERO, 100.0, &mut events);
        for _ in 0..20 {
            bank.tick(28.0, &mut events);
        }

        let ons = events
            .sound
            .iter()
            .filter(|s| matches!(s, SoundEvent::SwitchOn { .. }))
            .count();
        let offs = events
            .sound
            .iter()
            .filter(|s| matches!(s, SoundEvent::SwitchOff { .. }))
            .count();
        assert_eq!(ons, 1);
        assert_eq!(offs, 1);
    }

    #[test]
    fn test_spent_line_never_fires_again() {
        let mut bank = SwitchBank::new();
        let mut events = SimEvents::new();

        bank.spend(8);
        bank.flip(8, Vec2::ZERO, 10.0, &mut events);
        bank.tick(100.0, &mut events);

        assert!(!bank.can_fire(8));
        assert!(bank.is_spent(8));
    }
}

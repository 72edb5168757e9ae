//! Room - the mutable runtime state of one sector
//!
//! Each sector gets a Room at simulation start. The room interpolates its
//! floor and ceiling toward target heights, pauses on a countdown timer, and
//! reverses back to its original heights when a close time is armed. Targets
//! and timers are set only by the trigger dispatcher; the room itself only
//! ever moves toward what it was told.

use crate::map::{Marker, SectorDef};
use crate::math::Vec2;

use super::action::LineAction;
use super::events::{MotionAxis, MotionEvent, MotionPhase, SimEvents, SoundEvent};

#[derive(Debug, Clone)]
pub struct Room {
    pub id: usize,

    pub floor_height: f32,
    pub ceiling_height: f32,
    pub target_floor_height: f32,
    pub target_ceiling_height: f32,
    pub original_floor_height: f32,
    pub original_ceiling_height: f32,

    /// Plane movement, units per millisecond
    pub move_speed: f32,
    /// Countdown before the next motion may begin, ms
    pub timer: f32,
    /// Auto-reverse delay after reaching a target, ms; -1 = never reverse
    pub close_time: f32,

    /// Adjacent room ids, sorted ascending; fixed at construction so every
    /// neighbor scan is deterministic
    pub neighbors: Vec<usize>,
    /// The action most recently applied to this room, for motion sounds
    pub last_action: Option<LineAction>,
    /// Teleport destination inside this sector, if any
    pub destination: Option<Marker>,

    /// Set when a door action references this sector
    pub is_door: bool,
    pub visible: bool,

    /// World-space center, attached to emitted events
    pub center: Vec2,
    pub floor_flat: String,
    pub tag: u16,

    ceiling_moving: bool,
    floor_moving: bool,
}

impl Room {
    pub fn new(id: usize, sector: &SectorDef, center: Vec2, move_speed: f32) -> Self {
        Self {
            id,
            floor_height: sector.floor_height,
            ceiling_height: sector.ceiling_height,
            target_floor_height: sector.floor_height,
            target_ceiling_height: sector.ceiling_height,
            original_floor_height: sector.floor_height,
            original_ceiling_height: sector.ceiling_height,
            move_speed,
            timer: 0.0,
            close_time: -1.0,
            neighbors: Vec::new(),
            last_action: None,
            destination: None,
            is_door: false,
            visible: true,
            center,
            floor_flat: sector.floor_flat.clone(),
            tag: sector.tag,
            ceiling_moving: false,
            floor_moving: false,
        }
    }

    /// A room mid-timer or mid-motion rejects new operations
    pub fn is_busy(&self) -> bool {
        self.timer > 0.0
            || self.floor_height != self.target_floor_height
            || self.ceiling_height != self.target_ceiling_height
    }

    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
    }

    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
    }

    fn motion_event(&self, axis: MotionAxis, phase: MotionPhase) -> MotionEvent {
        let (original, height, target) = match axis {
            MotionAxis::Ceiling => (
                self.original_ceiling_height,
                self.ceiling_height,
                self.target_ceiling_height,
            ),
            MotionAxis::Floor => (
                self.original_floor_height,
                self.floor_height,
                self.target_floor_height,
            ),
        };
        MotionEvent {
            room: self.id,
            axis,
            phase,
            original,
            height,
            target,
            position: self.center,
        }
    }

    fn emit_start(&self, axis: MotionAxis, events: &mut SimEvents) {
        events.motion.send(self.motion_event(axis, MotionPhase::Start));

        match axis {
            MotionAxis::Ceiling if self.is_door => {
                // A door leaving its original height is opening; anything
                // else is the return trip.
                if self.ceiling_height == self.original_ceiling_height {
                    events.sound.send(SoundEvent::DoorOpenBegin {
                        room: self.id,
                        position: self.center,
                    });
                } else {
                    events.sound.send(SoundEvent::DoorCloseBegin {
                        room: self.id,
                        position: self.center,
                    });
                }
            }
            MotionAxis::Floor => {
                if let Some(sounds) = self.last_action.as_ref().and_then(|a| a.sounds) {
                    events.sound.send(SoundEvent::MotionStart {
                        room: self.id,
                        name: sounds.start,
                        position: self.center,
                    });
                }
            }
            _ => {}
        }
    }

    fn emit_stop(&self, axis: MotionAxis, events: &mut SimEvents) {
        events.motion.send(self.motion_event(axis, MotionPhase::Stop));

        if axis == MotionAxis::Floor {
            if let Some(sounds) = self.last_action.as_ref().and_then(|a| a.sounds) {
                events.sound.send(SoundEvent::MotionStop {
                    room: self.id,
                    name: sounds.stop,
                    position: self.center,
                });
            }
        }
    }

    /// Advance both planes by one tick.
    ///
    /// Exactly one start/stop pair is emitted per motion segment; a room
    /// already at its targets emits nothing.
    pub fn simulate(&mut self, delta: f32, events: &mut SimEvents) {
        if self.timer > 0.0 {
            self.timer -= delta;
            return;
        }
        self.timer = 0.0;

        let step = delta * self.move_speed;

        // Ceiling
        if self.ceiling_height != self.target_ceiling_height {
            if (self.target_ceiling_height - self.ceiling_height).abs() < step {
                if !self.ceiling_moving {
                    self.emit_start(MotionAxis::Ceiling, events);
                }
                self.emit_stop(MotionAxis::Ceiling, events);
                self.ceiling_height = self.target_ceiling_height;
                self.ceiling_moving = false;
            } else {
                if !self.ceiling_moving {
                    self.emit_start(MotionAxis::Ceiling, events);
                }
                self.ceiling_moving = true;
                self.ceiling_height +=
                    step * (self.target_ceiling_height - self.ceiling_height).signum();
            }
        } else {
            if self.ceiling_moving {
                self.emit_stop(MotionAxis::Ceiling, events);
                self.ceiling_moving = false;
            }

            if self.ceiling_height != self.original_ceiling_height && self.close_time > 0.0 {
                self.target_ceiling_height = self.original_ceiling_height;
                self.timer = self.close_time;
            }
        }

        // Floor
        if self.floor_height != self.target_floor_height {
            if (self.target_floor_height - self.floor_height).abs() < step {
                if !self.floor_moving {
                    self.emit_start(MotionAxis::Floor, events);
                }
                self.emit_stop(MotionAxis::Floor, events);
                self.floor_height = self.target_floor_height;
                self.floor_moving = false;
            } else {
                if !self.floor_moving {
                    self.emit_start(MotionAxis::Floor, events);
                }
                self.floor_moving = true;
                self.floor_height += step * (self.target_floor_height - self.floor_height).signum();
            }
        } else {
            if self.floor_moving {
                self.emit_stop(MotionAxis::Floor, events);
                self.floor_moving = false;
            }

            if self.floor_height != self.original_floor_height && self.close_time > 0.0 {
                self.target_floor_height = self.original_floor_height;
                self.timer = self.close_time;
            }
        }
    }
}

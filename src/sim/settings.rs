//! Simulation tuning (movement, clearances, timing)

use serde::{Deserialize, Serialize};

/// Tuning constants for the player proxy and the sector state machines.
///
/// Embedded in the map file so maps can override individual fields; every
/// field falls back to the classic values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Collision cylinder radius
    pub radius: f32,
    /// Eye height above the feet
    pub eye_height: f32,
    /// Maximum step-up while standing on a floor
    pub step_height: f32,
    /// Maximum step-up while above the floor
    pub airborne_step: f32,
    /// Minimum vertical opening the proxy fits through
    pub min_clearance: f32,
    /// Impulse acceleration per reference tick
    pub move_accel: f32,
    /// Velocity retained per reference tick
    pub move_decay: f32,
    /// Speeds below this snap to zero
    pub min_speed: f32,
    /// Sector plane movement, units per millisecond
    pub move_speed: f32,
    /// Gap kept below the lowest neighbor ceiling when a door opens
    pub door_clearance: f32,
    /// Delay between a trigger firing and the plane starting to move, ms
    pub trigger_latency: f32,
    /// Auto-reverse delay when an action names no time parameter, ms
    pub default_close_time: f32,
    /// How long a flipped switch stays on before reverting, ms
    pub switch_revert: f32,
    /// Height of one staircase step
    pub stair_step: f32,
    /// Downward acceleration per reference tick while falling
    pub gravity: f32,
    /// Fraction of the height gap closed per tick when rising
    pub rise_rate: f32,
    /// Largest single-tick rise; bigger gaps are clamped first
    pub max_rise: f32,
    /// Ticks shorter than this are skipped, ms
    pub min_tick: f32,
    /// Ticks longer than this are capped, ms
    pub max_tick: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            radius: 16.0,
            eye_height: 48.0,
            step_height: 24.0,
            airborne_step: 4.0,
            min_clearance: 48.0,
            move_accel: 1.25,
            move_decay: 0.90625,
            min_speed: 0.1,
            move_speed: 0.08,
            door_clearance: 4.0,
            trigger_latency: 10.0,
            default_close_time: 6000.0,
            switch_revert: 1500.0,
            stair_step: 8.0,
            gravity: 0.25,
            rise_rate: 0.25,
            max_rise: 24.0,
            min_tick: 16.0,
            max_tick: 32.0,
        }
    }
}

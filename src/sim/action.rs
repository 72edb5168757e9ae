//! Line action table
//!
//! Level data encodes actions as numeric codes on linedefs. This module is
//! the one place those codes are interpreted: each known code maps to a typed
//! `LineAction` with its kind, activation modifier, repeatability, optional
//! auto-reverse time, and the sound pair its motion plays. Codes outside the
//! table resolve to `None` and are inert.

/// What a triggered action does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Open the door sector on the far side of the touched line
    ManualDoor,
    /// Open every door sector in the tag group
    RemoteDoor,
    /// Move the tag group's ceilings
    Ceiling(VerticalDir),
    /// Drop the tag group's floors to the lowest neighbor, then return
    Lift,
    /// Move the tag group's floors
    Floor(VerticalDir),
    /// Build a staircase outward from each tagged sector
    Staircase,
    /// Move the player proxy to the tag group's destination marker
    Teleport,
    /// Signal level completion
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalDir {
    Raise,
    Lower,
}

/// How the action is activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionModifier {
    /// Pressed while the line blocks movement; no switch texture involved,
    /// so the line can be pressed again immediately (manual doors)
    Push,
    /// Pressed while the line blocks; flips the switch texture and cannot
    /// refire until the revert completes
    Switch,
    /// Crossed while the line is passable
    Walkover,
    /// Hit by a projectile or hitscan
    Gun,
}

/// Sounds played when the driven plane starts and stops moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundSet {
    pub start: &'static str,
    pub stop: &'static str,
}

const LIFT_SOUNDS: SoundSet = SoundSet {
    start: "PSTART",
    stop: "PSTOP",
};

const PLANE_SOUNDS: SoundSet = SoundSet {
    start: "STNMOV",
    stop: "PSTOP",
};

/// A fully resolved line action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAction {
    pub kind: ActionKind,
    pub modifier: ActionModifier,
    /// One-shot actions fire once per level, ever
    pub repeatable: bool,
    /// Auto-reverse delay in seconds; `None` means the default for lifts and
    /// "stays" for doors
    pub time: Option<f32>,
    pub sounds: Option<SoundSet>,
}

impl LineAction {
    /// Resolve a numeric action code. The mapping is fixed; unknown codes are
    /// inert rather than an error so imperfect maps keep working.
    pub fn from_special(special: u16) -> Option<LineAction> {
        use ActionKind::*;
        use ActionModifier::*;
        use VerticalDir::*;

        let action = |kind, modifier, repeatable, time, sounds| LineAction {
            kind,
            modifier,
            repeatable,
            time,
            sounds,
        };

        Some(match special {
            // Manual doors: press the line, the far sector opens
            1 | 26 | 27 | 28 => action(ManualDoor, Push, true, Some(4.0), None),
            31 => action(ManualDoor, Push, false, None, None),

            // Remote doors addressed by tag
            2 => action(RemoteDoor, Walkover, false, None, None),
            90 => action(RemoteDoor, Walkover, true, Some(4.0), None),
            63 => action(RemoteDoor, Switch, true, Some(4.0), None),
            103 => action(RemoteDoor, Switch, false, None, None),

            // Ceilings
            40 => action(Ceiling(Raise), Walkover, false, None, Some(PLANE_SOUNDS)),
            44 => action(Ceiling(Lower), Walkover, false, None, Some(PLANE_SOUNDS)),
            72 => action(Ceiling(Lower), Walkover, true, None, Some(PLANE_SOUNDS)),
            41 | 49 => action(Ceiling(Lower), Switch, false, None, Some(PLANE_SOUNDS)),
            43 => action(Ceiling(Lower), Switch, true, None, Some(PLANE_SOUNDS)),

            // Lifts: down to the lowest neighbor floor, wait, return
            10 | 121 => action(Lift, Walkover, false, None, Some(LIFT_SOUNDS)),
            88 | 120 => action(Lift, Walkover, true, None, Some(LIFT_SOUNDS)),
            21 | 122 => action(Lift, Switch, false, None, Some(LIFT_SOUNDS)),
            62 | 123 => action(Lift, Switch, true, None, Some(LIFT_SOUNDS)),

            // Floors, raising
            5 | 22 | 119 => action(Floor(Raise), Walkover, false, None, Some(PLANE_SOUNDS)),
            95 | 128 => action(Floor(Raise), Walkover, true, None, Some(PLANE_SOUNDS)),
            18 | 20 | 101 => action(Floor(Raise), Switch, false, None, Some(PLANE_SOUNDS)),
            64 | 68 | 69 | 91 => action(Floor(Raise), Switch, true, None, Some(PLANE_SOUNDS)),
            24 | 47 => action(Floor(Raise), Gun, false, None, Some(PLANE_SOUNDS)),

            // Floors, lowering
            36 => action(Floor(Lower), Walkover, false, None, Some(PLANE_SOUNDS)),
            83 | 98 => action(Floor(Lower), Walkover, true, None, Some(PLANE_SOUNDS)),
            71 | 102 => action(Floor(Lower), Switch, false, None, Some(PLANE_SOUNDS)),
            45 | 70 => action(Floor(Lower), Switch, true, None, Some(PLANE_SOUNDS)),

            // Staircases
            8 | 100 => action(Staircase, Walkover, false, None, Some(PLANE_SOUNDS)),
            7 | 127 => action(Staircase, Switch, false, None, Some(PLANE_SOUNDS)),

            // Teleports
            39 | 125 => action(Teleport, Walkover, false, None, None),
            97 | 126 => action(Teleport, Walkover, true, None, None),

            // Level exits
            11 | 51 => action(Exit, Switch, false, None, None),
            52 => action(Exit, Walkover, false, None, None),

            _ => return None,
        })
    }
}

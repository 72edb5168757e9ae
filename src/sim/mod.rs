//! Simulation module - the per-tick runtime over the static map
//!
//! One `LevelSim` owns everything mutable: room state machines, the tag
//! registry, per-line switch memory, the player proxy, and the notification
//! queues. A single fixed-granularity tick advances rooms, visibility, and
//! movement in a strict order; observers drain the queues between ticks.

pub mod action;
pub mod collision;
pub mod events;
pub mod level;
pub mod room;
pub mod settings;
pub mod tags;
pub mod trigger;
pub mod visibility;

pub use action::{ActionKind, ActionModifier, LineAction, VerticalDir};
pub use collision::{ContactKind, Mover, MoverInput};
pub use events::{MotionAxis, MotionEvent, MotionPhase, SimEvents, SoundEvent};
pub use level::LevelSim;
pub use room::Room;
pub use settings::SimSettings;

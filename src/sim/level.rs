//! Level simulation context
//!
//! `LevelSim` owns every piece of mutable level state: the rooms, the tag
//! registry, per-line switch memory, the player proxy, and the notification
//! queues. There is no ambient global state; dropping the context and
//! constructing a fresh one is how a level transition happens.
//!
//! Tick order is fixed: room state machines, switch countdowns, visibility,
//! then movement. Triggers fired by movement mutate rooms after the resolver
//! has finished reading them, so their effects are first seen on the next
//! tick.

use std::collections::HashSet;

use crate::map::MapGeometry;
use crate::math::Vec2;

use super::action::{ActionKind, ActionModifier, LineAction, VerticalDir};
use super::collision::{self, ContactKind, Mover, MoverInput, PendingTrigger};
use super::events::SimEvents;
use super::room::Room;
use super::settings::SimSettings;
use super::tags::TagRegistry;
use super::trigger::SwitchBank;
use super::visibility;

pub struct LevelSim {
    map: MapGeometry,
    settings: SimSettings,
    rooms: Vec<Room>,
    tags: TagRegistry,
    switches: SwitchBank,
    pub mover: Mover,
    pub events: SimEvents,
    exit_requested: bool,
    /// Wall-clock time waiting for the next simulation step, ms
    pending_time: f32,
}

impl LevelSim {
    pub fn new(map: MapGeometry) -> Self {
        let settings = map.settings;

        let mut rooms: Vec<Room> = map
            .sectors
            .iter()
            .enumerate()
            .map(|(i, s)| Room::new(i, s, map.sector_center(i), settings.move_speed))
            .collect();

        // Neighbors: sectors adjacent across two-sided lines, sorted so
        // every later scan is deterministic
        for line in 0..map.linedefs.len() {
            if let (Some(f), Some(b)) = map.line_sectors(line) {
                if f != b {
                    rooms[f].neighbors.push(b);
                    rooms[b].neighbors.push(f);
                }
            }
        }
        for room in &mut rooms {
            room.neighbors.sort_unstable();
            room.neighbors.dedup();
        }

        let tags = TagRegistry::build(&map.sectors);

        // Door derivation: the sector behind a manual door line is a door,
        // and so is every sector a remote door action addresses
        for (i, linedef) in map.linedefs.iter().enumerate() {
            let Some(action) = LineAction::from_special(linedef.special) else {
                continue;
            };
            match action.kind {
                ActionKind::ManualDoor => {
                    let (_, back) = map.line_sectors(i);
                    if let Some(back) = back {
                        rooms[back].is_door = true;
                    }
                }
                ActionKind::RemoteDoor => {
                    for &r in tags.rooms_with_tag(linedef.tag) {
                        rooms[r].is_door = true;
                    }
                }
                _ => {}
            }
        }

        // Teleport destinations land in their containing sector
        for marker in &map.markers {
            match map.sector_containing(marker.position) {
                Some(s) => rooms[s].destination = Some(marker.clone()),
                None => log::warn!(
                    "teleport marker at ({}, {}) is outside every sector",
                    marker.position.x,
                    marker.position.y
                ),
            }
        }

        let start = &map.player_start;
        let start_sector = map.sector_containing(start.position);
        let floor = start_sector
            .map(|s| rooms[s].floor_height)
            .unwrap_or(0.0);
        let mut mover = Mover::at(start.position, floor + settings.eye_height, start.angle);
        mover.sector = start_sector;

        Self {
            map,
            settings,
            rooms,
            tags,
            switches: SwitchBank::new(),
            mover,
            events: SimEvents::new(),
            exit_requested: false,
            pending_time: 0.0,
        }
    }

    pub fn map(&self) -> &MapGeometry {
        &self.map
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: usize) -> &Room {
        &self.rooms[id]
    }

    /// Set when an exit action fires; the orchestrator tears this context
    /// down and builds the next level.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Advance the simulation. Deltas accumulate until they reach the
    /// minimum tick and are capped at the maximum; returns whether a step
    /// actually ran.
    pub fn tick(&mut self, input: &MoverInput, delta_ms: f32) -> bool {
        self.pending_time += delta_ms;
        if self.pending_time < self.settings.min_tick {
            return false;
        }
        let delta = self.pending_time.min(self.settings.max_tick);
        self.pending_time = 0.0;

        // 1. Room state machines
        let events = &mut self.events;
        for room in &mut self.rooms {
            room.simulate(delta, events);
        }

        // 2. Switch revert countdowns
        self.switches.tick(delta, &mut self.events);

        // 3. Visibility gate
        visibility::update_visibility(
            &self.map,
            &mut self.rooms,
            self.mover.position,
            self.mover.no_clip,
        );

        // 4. Movement. Rooms are read-only during resolution; triggers are
        // dispatched afterwards so their effects land next tick.
        let fired = collision::resolve_movement(
            &self.map,
            &self.rooms,
            &self.settings,
            &mut self.mover,
            input,
            delta,
        );
        for trigger in fired {
            self.apply_trigger(trigger);
        }

        true
    }

    /// Single entry point for line activation, also usable directly by an
    /// embedding layer (e.g. a hitscan firing a gun-modifier line).
    pub fn apply_action(&mut self, line: usize, kind: ContactKind, front_side: bool) {
        self.apply_trigger(PendingTrigger {
            line,
            kind,
            front_side,
        });
    }

    fn apply_trigger(&mut self, trigger: PendingTrigger) {
        let linedef = &self.map.linedefs[trigger.line];
        let Some(action) = LineAction::from_special(linedef.special) else {
            return;
        };
        let tag = linedef.tag;

        // Activation gating by modifier and contact type
        match (action.modifier, trigger.kind) {
            (ActionModifier::Push, ContactKind::Press) => {
                // No switch texture involved; the room busy-guard is the
                // only throttle
            }
            (ActionModifier::Switch, ContactKind::Press) => {
                if !self.switches.can_fire(trigger.line) {
                    return;
                }
                let (a, b) = self.map.line_endpoints(trigger.line);
                self.switches.flip(
                    trigger.line,
                    (a + b) * 0.5,
                    self.settings.switch_revert,
                    &mut self.events,
                );
                if !action.repeatable {
                    self.switches.spend(trigger.line);
                }
            }
            (ActionModifier::Walkover, ContactKind::Cross)
            | (ActionModifier::Gun, ContactKind::Press) => {
                if self.switches.is_spent(trigger.line) {
                    return;
                }
                if !action.repeatable {
                    self.switches.spend(trigger.line);
                }
            }
            _ => return,
        }

        self.dispatch(trigger, action, tag);
    }

    fn tag_members(&self, line: usize, tag: u16) -> Vec<usize> {
        let members = self.tags.rooms_with_tag(tag);
        if members.is_empty() {
            log::warn!("line {}: tag {} addresses no sectors", line, tag);
        }
        members.to_vec()
    }

    fn dispatch(&mut self, trigger: PendingTrigger, action: LineAction, tag: u16) {
        match action.kind {
            ActionKind::ManualDoor => {
                let (front, back) = self.map.line_sectors(trigger.line);
                let far = if trigger.front_side { back } else { front };
                match far {
                    Some(room) => {
                        self.open_door(room, action.time);
                    }
                    None => log::warn!("manual door line {} has no far sector", trigger.line),
                }
            }
            ActionKind::RemoteDoor => {
                for room in self.tag_members(trigger.line, tag) {
                    self.open_door(room, action.time);
                }
            }
            ActionKind::Ceiling(dir) => {
                for room in self.tag_members(trigger.line, tag) {
                    self.rooms[room].last_action = Some(action);
                    match dir {
                        VerticalDir::Raise => self.raise_ceiling(room, action),
                        VerticalDir::Lower => self.lower_ceiling(room, action),
                    };
                }
            }
            ActionKind::Lift => {
                for room in self.tag_members(trigger.line, tag) {
                    self.rooms[room].last_action = Some(action);
                    self.lower_lift(room, action);
                }
            }
            ActionKind::Floor(dir) => {
                for room in self.tag_members(trigger.line, tag) {
                    self.rooms[room].last_action = Some(action);
                    match dir {
                        VerticalDir::Raise => self.raise_floor(room, action),
                        // Lowering floors reuse the lift scan: lowest
                        // neighbor floor, with the action's return delay
                        VerticalDir::Lower => self.lower_lift(room, action),
                    };
                }
            }
            ActionKind::Staircase => {
                for room in self.tag_members(trigger.line, tag) {
                    self.raise_staircase(room, action);
                }
            }
            ActionKind::Teleport => {
                // Teleporters only fire on a forward crossing
                if trigger.front_side {
                    self.teleport(trigger.line, tag);
                }
            }
            ActionKind::Exit => {
                self.exit_requested = true;
            }
        }
    }

    // =========================================================================
    // Room operations
    //
    // These need neighbor heights, so they live here rather than on `Room`.
    // All of them reject with `false` when the room is busy; the next
    // identical trigger may succeed later.
    // =========================================================================

    /// Raise the ceiling to the lowest neighbor ceiling minus the clearance
    /// margin. `time_secs` arms the auto-close; `None` leaves the door open.
    pub fn open_door(&mut self, room: usize, time_secs: Option<f32>) -> bool {
        let r = &self.rooms[room];
        if r.timer > 0.0 || r.ceiling_height != r.target_ceiling_height {
            return false;
        }

        // Lowest neighbor ceiling; ties keep the first hit in sorted order
        let lowest = r
            .neighbors
            .iter()
            .map(|&n| self.rooms[n].ceiling_height)
            .fold(None::<f32>, |acc, h| match acc {
                Some(a) if a <= h => Some(a),
                _ => Some(h),
            });

        let close_time = time_secs.map(|t| t * 1000.0).unwrap_or(-1.0);
        let clearance = self.settings.door_clearance;
        let latency = self.settings.trigger_latency;

        let r = &mut self.rooms[room];
        r.close_time = close_time;
        match lowest {
            Some(h) => {
                r.target_ceiling_height = h - clearance;
                r.timer = latency;
            }
            None => log::warn!("door sector {} has no neighbors", room),
        }
        true
    }

    /// Send the ceiling back to its original height
    pub fn close_door(&mut self, room: usize) -> bool {
        let r = &mut self.rooms[room];
        if r.timer > 0.0 || r.ceiling_height != r.target_ceiling_height {
            return false;
        }
        r.target_ceiling_height = r.original_ceiling_height;
        true
    }

    /// Drop the floor to the lowest neighbor floor, returning after the
    /// action's delay (default when the action names none).
    pub fn lower_lift(&mut self, room: usize, action: LineAction) -> bool {
        if self.rooms[room].is_busy() {
            return false;
        }

        let lowest = self.rooms[room]
            .neighbors
            .iter()
            .map(|&n| self.rooms[n].floor_height)
            .fold(None::<f32>, |acc, h| match acc {
                Some(a) if a <= h => Some(a),
                _ => Some(h),
            });

        let close_time = action
            .time
            .map(|t| t * 1000.0)
            .unwrap_or(self.settings.default_close_time);
        let latency = self.settings.trigger_latency;

        let r = &mut self.rooms[room];
        r.close_time = close_time;
        match lowest {
            Some(h) => {
                r.target_floor_height = h;
                r.timer = latency;
            }
            None => log::warn!("lift sector {} has no neighbors", room),
        }
        true
    }

    /// Raise the floor to the lowest neighbor floor above the current one
    pub fn raise_floor(&mut self, room: usize, action: LineAction) -> bool {
        if self.rooms[room].is_busy() {
            return false;
        }

        let current = self.rooms[room].floor_height;
        let target = self.rooms[room]
            .neighbors
            .iter()
            .map(|&n| self.rooms[n].floor_height)
            .filter(|&h| h > current)
            .fold(None::<f32>, |acc, h| match acc {
                Some(a) if a <= h => Some(a),
                _ => Some(h),
            });

        let close_time = action
            .time
            .map(|t| t * 1000.0)
            .unwrap_or(self.settings.default_close_time);
        let latency = self.settings.trigger_latency;

        let r = &mut self.rooms[room];
        r.close_time = close_time;
        if let Some(h) = target {
            r.target_floor_height = h;
            r.timer = latency;
        }
        true
    }

    /// Raise the ceiling to the highest neighbor ceiling above the current
    pub fn raise_ceiling(&mut self, room: usize, action: LineAction) -> bool {
        if self.rooms[room].is_busy() {
            return false;
        }

        let current = self.rooms[room].ceiling_height;
        let target = self.rooms[room]
            .neighbors
            .iter()
            .map(|&n| self.rooms[n].ceiling_height)
            .filter(|&h| h > current)
            .fold(None::<f32>, |acc, h| match acc {
                Some(a) if a >= h => Some(a),
                _ => Some(h),
            });

        let close_time = action
            .time
            .map(|t| t * 1000.0)
            .unwrap_or(self.settings.default_close_time);
        let latency = self.settings.trigger_latency;

        let r = &mut self.rooms[room];
        r.close_time = close_time;
        if let Some(h) = target {
            r.target_ceiling_height = h;
            r.timer = latency;
        }
        true
    }

    /// Drop the ceiling to the room's own floor
    pub fn lower_ceiling(&mut self, room: usize, _action: LineAction) -> bool {
        let r = &mut self.rooms[room];
        if r.is_busy() {
            return false;
        }
        r.target_ceiling_height = r.floor_height;
        true
    }

    /// Build a staircase: each chained sector's floor targets one step
    /// higher than the last. The chain follows two-sided lines into sectors
    /// sharing the starting floor flat and stops at a texture change; the
    /// visited set makes cyclic chains terminate.
    pub fn raise_staircase(&mut self, room: usize, action: LineAction) {
        let flat = self.rooms[room].floor_flat.clone();
        let step_height = self.settings.stair_step;

        let mut visited: HashSet<usize> = HashSet::new();
        let mut current = room;
        let mut step = 0usize;

        loop {
            visited.insert(current);
            {
                let r = &mut self.rooms[current];
                r.target_floor_height =
                    r.original_floor_height + (step as f32 + 1.0) * step_height;
                r.last_action = Some(action);
            }

            let mut next = None;
            for &l in self.map.sector_line_ids(current) {
                let far = match self.map.line_sectors(l) {
                    (Some(f), Some(b)) if f == current => Some(b),
                    (Some(f), Some(b)) if b == current => Some(f),
                    _ => None,
                };
                if let Some(far) = far {
                    if !visited.contains(&far) && self.map.sectors[far].floor_flat == flat {
                        next = Some(far);
                        break;
                    }
                }
            }

            match next {
                Some(n) => {
                    current = n;
                    step += 1;
                }
                None => break,
            }
        }
    }

    /// Move the player proxy to the tag group's destination marker. The
    /// first destination in sorted group order wins.
    fn teleport(&mut self, line: usize, tag: u16) {
        for room in self.tag_members(line, tag) {
            if let Some(dest) = self.rooms[room].destination.clone() {
                self.mover.position = dest.position;
                self.mover.angle = dest.angle;
                self.mover.height = self.rooms[room].floor_height + self.settings.eye_height;
                self.mover.velocity = Vec2::ZERO;
                self.mover.vertical_velocity = 0.0;
                self.mover.sector = Some(room);
                return;
            }
        }
        log::warn!("line {}: teleport tag {} has no destination marker", line, tag);
    }
}

//! Collision resolver
//!
//! Moves the circular player proxy through the line network each tick:
//! impulse integration with exponential damping, passability classification
//! against sector heights, push-out response against blocking lines with
//! corner disambiguation, trigger collection for crossed and pressed lines,
//! and vertical easing onto the floor of the containing sector.
//!
//! Room state is read-only here. Triggers fired by contact are returned to
//! the caller and dispatched after movement, so any room mutation they cause
//! is only seen by the next tick.

use crate::map::MapGeometry;
use crate::math::{nearest_point_on_segment, segments_intersect, Vec2};

use super::room::Room;
use super::settings::SimSettings;

/// The classic simulation rate the tuning constants are expressed against
const REFERENCE_TICK_HZ: f32 = 35.0;

/// The player proxy
#[derive(Debug, Clone)]
pub struct Mover {
    pub position: Vec2,
    /// Eye height in world space
    pub height: f32,
    pub velocity: Vec2,
    pub vertical_velocity: f32,
    /// Facing, radians
    pub angle: f32,
    /// Sector containing the proxy, updated each tick
    pub sector: Option<usize>,
    /// Debug: ignore passability entirely
    pub no_clip: bool,
}

impl Mover {
    pub fn at(position: Vec2, height: f32, angle: f32) -> Self {
        Self {
            position,
            height,
            velocity: Vec2::ZERO,
            vertical_velocity: 0.0,
            angle,
            sector: None,
            no_clip: false,
        }
    }
}

/// Per-tick movement intent
#[derive(Debug, Clone, Copy, Default)]
pub struct MoverInput {
    /// Desired acceleration direction times magnitude; zero when idle
    pub impulse: Vec2,
}

impl MoverInput {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build an impulse from camera-relative controls. `forward` and
    /// `strafe` are -1/0/1 key states; forward movement carries the classic
    /// 1.25 bias over strafing.
    pub fn from_camera(camera_angle: f32, forward: f32, strafe: f32) -> Self {
        if forward == 0.0 && strafe == 0.0 {
            return Self::none();
        }
        let dir = (1.25 * -forward).atan2(strafe) + camera_angle + std::f32::consts::FRAC_PI_2;
        let mag = (1.25 * forward).hypot(strafe).min(1.25);
        Self {
            impulse: Vec2::new(dir.cos(), dir.sin()) * mag,
        }
    }
}

/// How the proxy touched a line this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Pressed against the line while it blocks
    Press,
    /// Crossed the line while it is passable
    Cross,
}

/// A line touch that may fire a trigger, dispatched after movement
#[derive(Debug, Clone, Copy)]
pub struct PendingTrigger {
    pub line: usize,
    pub kind: ContactKind,
    /// Was the proxy on the line's front side at contact time?
    pub front_side: bool,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    line: usize,
    nearest: Vec2,
    dist: f32,
    /// Unit vector from the contact point toward the proxy
    normal: Vec2,
}

/// Is the line currently passable from the mover's side?
///
/// A dangling line with no sector on either side is always impassable rather
/// than an error, so malformed levels stay walkable.
fn line_passable(
    map: &MapGeometry,
    rooms: &[Room],
    settings: &SimSettings,
    mover: &Mover,
    line: usize,
) -> bool {
    let linedef = &map.linedefs[line];
    if linedef.is_blocking() {
        return false;
    }

    let (front, back) = map.line_sectors(line);
    let (Some(front), Some(back)) = (front, back) else {
        return false;
    };

    let on_front = map.side_of(line, mover.position) < 0.0;
    let (near, far) = if on_front { (front, back) } else { (back, front) };
    let (near, far) = (&rooms[near], &rooms[far]);

    let feet = mover.height - settings.eye_height;
    let grounded = (feet - near.floor_height).abs() < 1.0;
    let step_limit = if grounded {
        settings.step_height
    } else {
        settings.airborne_step
    };

    if far.floor_height - feet > step_limit {
        return false;
    }
    if near.ceiling_height - near.floor_height < settings.min_clearance
        || far.ceiling_height - far.floor_height < settings.min_clearance
        || far.ceiling_height - near.floor_height < settings.min_clearance
        || near.ceiling_height - far.floor_height < settings.min_clearance
    {
        return false;
    }

    true
}

/// Outward normal for a contact at distance zero, oriented against travel
fn fallback_normal(a: Vec2, b: Vec2, velocity: Vec2) -> Vec2 {
    let n = (b - a).normalize().perp();
    if n.dot(velocity) > 0.0 {
        -n
    } else {
        n
    }
}

fn shared_vertex(map: &MapGeometry, l0: usize, l1: usize) -> Option<Vec2> {
    let (a, b) = (&map.linedefs[l0], &map.linedefs[l1]);
    for v0 in [a.from, a.to] {
        for v1 in [b.from, b.to] {
            if v0 == v1 {
                return Some(map.vertices[v0]);
            }
        }
    }
    None
}

fn resolve_single(contact: &Contact, settings: &SimSettings, pos: &mut Vec2, v: &mut Vec2) {
    let penetration = settings.radius - contact.dist;
    if penetration <= 0.0 {
        return;
    }
    *pos = *pos + contact.normal * penetration;
    let vn = v.dot(contact.normal);
    if vn < 0.0 {
        *v = *v - contact.normal * vn;
    }
}

/// Advance the proxy one tick. Returns the line touches that may fire
/// triggers, in the order they were found.
pub fn resolve_movement(
    map: &MapGeometry,
    rooms: &[Room],
    settings: &SimSettings,
    mover: &mut Mover,
    input: &MoverInput,
    delta: f32,
) -> Vec<PendingTrigger> {
    let tick_fraction = delta * REFERENCE_TICK_HZ / 1000.0;

    // Frame-rate independent impulse and damping
    let mut v = mover.velocity + input.impulse * (settings.move_accel * tick_fraction);
    v = v * settings.move_decay.powf(tick_fraction);
    if v.len() < settings.min_speed {
        v = Vec2::ZERO;
    }

    let mut triggers = Vec::new();

    if v != Vec2::ZERO {
        let pos = mover.position;
        let predicted = pos + v;
        let mut contacts: Vec<Contact> = Vec::new();

        for line in map.lines_near(pos) {
            let (a, b) = map.line_endpoints(line);
            // Zero-length lines never block
            if a == b {
                continue;
            }

            let front_side = map.side_of(line, pos) < 0.0;
            let crossing = segments_intersect(pos, predicted, a, b).is_some();
            let passable =
                mover.no_clip || line_passable(map, rooms, settings, mover, line);

            if passable {
                if crossing && map.linedefs[line].special != 0 {
                    triggers.push(PendingTrigger {
                        line,
                        kind: ContactKind::Cross,
                        front_side,
                    });
                }
                continue;
            }

            // Distance is measured from the current position so the push-out
            // lands the proxy exactly at its radius.
            let (nearest, _t) = nearest_point_on_segment(pos, a, b, true);
            let offset = pos - nearest;
            let dist = offset.len();
            let approaching = offset.dot(v) <= 0.0;

            if dist < settings.radius && approaching {
                let normal = if dist > 0.0 {
                    offset.scale(1.0 / dist)
                } else {
                    fallback_normal(a, b, v)
                };
                contacts.push(Contact {
                    line,
                    nearest,
                    dist,
                    normal,
                });

                if front_side && map.linedefs[line].special != 0 {
                    triggers.push(PendingTrigger {
                        line,
                        kind: ContactKind::Press,
                        front_side,
                    });
                }
            } else if crossing {
                // Fast approach that would tunnel this tick: cancel the
                // inward velocity, leave the position alone.
                let n = if dist > 0.0 {
                    offset.scale(1.0 / dist)
                } else {
                    fallback_normal(a, b, v)
                };
                let vn = v.dot(n);
                if vn < 0.0 {
                    v = v - n * vn;
                }
            }
        }

        contacts.sort_by(|a, b| a.dist.total_cmp(&b.dist));

        let mut pos = pos;
        let mut skip = 0;

        if contacts.len() >= 2 {
            let (c0, c1) = (contacts[0], contacts[1]);
            if let Some(vertex) = shared_vertex(map, c0.line, c1.line) {
                let clamped0 = (c0.nearest - vertex).len() < 0.001;
                let clamped1 = (c1.nearest - vertex).len() < 0.001;

                if clamped0 && clamped1 {
                    // Convex corner: the nearer line's response is the whole
                    // answer, the second contact is the same vertex again.
                    resolve_single(&c0, settings, &mut pos, &mut v);
                    skip = 2;
                } else if !clamped0 && !clamped1 {
                    // Concave corner: the proxy is pocketed between two wall
                    // interiors. Clamp to the vertex along the bisector of
                    // the outward normals.
                    let bisector = (c0.normal + c1.normal).normalize();
                    pos = vertex + bisector * settings.radius;
                    for n in [c0.normal, c1.normal] {
                        let vn = v.dot(n);
                        if vn < 0.0 {
                            v = v - n * vn;
                        }
                    }
                    skip = 2;
                }
            }
        }

        // Remaining contacts resolve independently in ascending distance
        // order; with three or more walls this is an approximation that
        // settles over consecutive ticks.
        for contact in contacts.iter().skip(skip) {
            resolve_single(contact, settings, &mut pos, &mut v);
        }

        mover.position = pos + v;
    }

    mover.velocity = v;

    // Vertical easing onto the containing sector's floor
    if let Some(sector) = map.sector_containing(mover.position) {
        mover.sector = Some(sector);
        if !mover.no_clip {
            let footing = rooms[sector].floor_height + settings.eye_height;
            if (mover.height - footing).abs() < 1.0 {
                mover.height = footing;
                mover.vertical_velocity = 0.0;
            } else if mover.height < footing {
                // Rising: clamp big gaps, then ease in
                if footing - mover.height > settings.max_rise {
                    mover.height = footing - settings.max_rise;
                }
                mover.height += settings.rise_rate * (footing - mover.height);
                mover.vertical_velocity = 0.0;
            } else {
                // Falling
                mover.vertical_velocity -= settings.gravity * tick_fraction;
                mover.height += mover.vertical_velocity * tick_fraction;
                if mover.height < footing {
                    mover.height = footing;
                    mover.vertical_velocity = 0.0;
                }
            }
        }
    }

    triggers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::builder::MapBuilder;
    use crate::map::line_flags;

    fn rooms_for(map: &MapGeometry) -> Vec<Room> {
        map.sectors
            .iter()
            .enumerate()
            .map(|(i, s)| Room::new(i, s, map.sector_center(i), map.settings.move_speed))
            .collect()
    }

    fn grounded_mover(map: &MapGeometry, x: f32, y: f32) -> Mover {
        let settings = map.settings;
        let pos = Vec2::new(x, y);
        let sector = map.sector_containing(pos).unwrap();
        let floor = map.sectors[sector].floor_height;
        let mut mover = Mover::at(pos, floor + settings.eye_height, 0.0);
        mover.sector = Some(sector);
        mover
    }

    #[test]
    fn test_head_on_push_out() {
        let map = MapBuilder::new().square(0.0, 0.0, 256.0, 0.0, 128.0, "FLAT1").build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        // 10 units from the west wall, inside the radius of 16, heading in
        let mut mover = grounded_mover(&map, 10.0, 128.0);
        mover.velocity = Vec2::new(-5.0, 0.0);

        resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        // Pushed out along the wall normal by exactly 16 - 10 = 6
        assert_eq!(mover.position.x, 16.0);
        assert_eq!(mover.position.y, 128.0);
        // Normal component of the velocity is zeroed
        assert_eq!(mover.velocity.x, 0.0);
    }

    #[test]
    fn test_zero_length_line_never_blocks() {
        let mut b = MapBuilder::new().square(0.0, 0.0, 256.0, 0.0, 128.0, "FLAT1");
        // Degenerate line in the middle of the room
        let v = b.vertex(128.0, 128.0);
        b.line(v, v, 0, None);
        let map = b.build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        let mut mover = grounded_mover(&map, 120.0, 128.0);
        mover.velocity = Vec2::new(4.0, 0.0);

        resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        // Moved straight through the degenerate line's position
        assert!(mover.position.x > 120.0);
        assert_eq!(mover.position.y, 128.0);
    }

    #[test]
    fn test_concave_corner_clamps_to_vertex_bisector() {
        let map = MapBuilder::new().square(0.0, 0.0, 256.0, 0.0, 128.0, "FLAT1").build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        // Inside the southwest interior corner, heading into it
        let mut mover = grounded_mover(&map, 8.0, 8.0);
        mover.velocity = Vec2::new(-3.0, -3.0);

        resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        // Clamped to the corner vertex plus radius along the bisector
        let expected = 16.0 / 2.0_f32.sqrt();
        assert!((mover.position.x - expected).abs() < 0.01);
        assert!((mover.position.y - expected).abs() < 0.01);
        assert_eq!(mover.velocity.x, 0.0);
        assert_eq!(mover.velocity.y, 0.0);
    }

    #[test]
    fn test_convex_corner_resolves_against_nearer_line() {
        // A square pillar inside a large room; the pillar walls face outward
        let mut b = MapBuilder::new().square(0.0, 0.0, 512.0, 0.0, 128.0, "FLAT1");
        let p0 = b.vertex(256.0, 256.0);
        let p1 = b.vertex(256.0, 320.0);
        let p2 = b.vertex(320.0, 320.0);
        let p3 = b.vertex(320.0, 256.0);
        b.line(p1, p0, 0, None);
        b.line(p0, p3, 0, None);
        b.line(p3, p2, 0, None);
        b.line(p2, p1, 0, None);
        let map = b.build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        // Approaching the pillar's southwest corner diagonally, off-axis
        let mut mover = grounded_mover(&map, 248.0, 244.0);
        mover.velocity = Vec2::new(2.0, 3.0);

        resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        // Pushed back to the radius around the corner vertex, in the
        // direction the proxy already was (not snapped to the wall bisector)
        let corner = Vec2::new(256.0, 256.0);
        let dist = (mover.position - corner).len();
        assert!(dist >= 16.0 - 0.01, "dist {} below radius", dist);
        // Still on the lower-left side of the corner
        assert!(mover.position.x < 256.0);
        assert!(mover.position.y < 256.0);
    }

    #[test]
    fn test_step_up_blocks_when_too_high() {
        // Two rooms sharing an edge; the far floor is 32 above, over the
        // 24-unit step limit
        let mut b = MapBuilder::new();
        let s0 = b.sector(0.0, 128.0, "FLAT1", 0);
        let s1 = b.sector(32.0, 160.0, "FLAT1", 0);
        let v0 = b.vertex(0.0, 0.0);
        let v1 = b.vertex(0.0, 256.0);
        let v2 = b.vertex(256.0, 256.0);
        let v3 = b.vertex(256.0, 0.0);
        let v4 = b.vertex(512.0, 256.0);
        let v5 = b.vertex(512.0, 0.0);
        b.line(v0, v1, s0, None);
        b.line(v1, v2, s0, None);
        b.line(v2, v3, s0, Some(s1)); // shared edge, s1 behind
        b.line(v3, v0, s0, None);
        b.line(v2, v4, s1, None);
        b.line(v4, v5, s1, None);
        b.line(v5, v3, s1, None);
        let map = b.build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        let mut mover = grounded_mover(&map, 245.0, 128.0);
        mover.velocity = Vec2::new(10.0, 0.0);

        resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        // Blocked at the shared edge, pushed back to the radius
        assert!(mover.position.x <= 256.0 - settings.radius + 0.01);
    }

    #[test]
    fn test_step_up_passes_when_low_enough() {
        let mut b = MapBuilder::new();
        let s0 = b.sector(0.0, 128.0, "FLAT1", 0);
        let s1 = b.sector(16.0, 160.0, "FLAT1", 0);
        let v0 = b.vertex(0.0, 0.0);
        let v1 = b.vertex(0.0, 256.0);
        let v2 = b.vertex(256.0, 256.0);
        let v3 = b.vertex(256.0, 0.0);
        let v4 = b.vertex(512.0, 256.0);
        let v5 = b.vertex(512.0, 0.0);
        b.line(v0, v1, s0, None);
        b.line(v1, v2, s0, None);
        b.line(v2, v3, s0, Some(s1));
        b.line(v3, v0, s0, None);
        b.line(v2, v4, s1, None);
        b.line(v4, v5, s1, None);
        b.line(v5, v3, s1, None);
        let map = b.build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        let mut mover = grounded_mover(&map, 250.0, 128.0);
        mover.velocity = Vec2::new(10.0, 0.0);

        resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        assert!(mover.position.x > 256.0, "should cross onto the step");
    }

    #[test]
    fn test_walkover_crossing_collects_trigger() {
        let mut b = MapBuilder::new();
        let s0 = b.sector(0.0, 128.0, "FLAT1", 0);
        let s1 = b.sector(0.0, 128.0, "FLAT1", 0);
        let v0 = b.vertex(0.0, 0.0);
        let v1 = b.vertex(0.0, 256.0);
        let v2 = b.vertex(256.0, 256.0);
        let v3 = b.vertex(256.0, 0.0);
        let v4 = b.vertex(512.0, 256.0);
        let v5 = b.vertex(512.0, 0.0);
        b.line(v0, v1, s0, None);
        b.line(v1, v2, s0, None);
        let crossing = b.line_with(v2, v3, s0, Some(s1), 0, 39, 1);
        b.line(v3, v0, s0, None);
        b.line(v2, v4, s1, None);
        b.line(v4, v5, s1, None);
        b.line(v5, v3, s1, None);
        let map = b.build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        let mut mover = grounded_mover(&map, 250.0, 128.0);
        mover.velocity = Vec2::new(10.0, 0.0);

        let triggers =
            resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);

        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].line, crossing);
        assert_eq!(triggers[0].kind, ContactKind::Cross);
        assert!(triggers[0].front_side);
    }

    #[test]
    fn test_press_collects_trigger_from_front_only() {
        let mut b = MapBuilder::new().square(0.0, 0.0, 256.0, 0.0, 128.0, "FLAT1");
        let v6 = b.vertex(64.0, 100.0);
        let v7 = b.vertex(64.0, 156.0);
        // Self-referencing blocking switch wall inside the room, front
        // facing +x
        let pressed = b.line_with(v6, v7, 0, Some(0), line_flags::BLOCKING, 103, 2);
        let map = b.build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        // Approach from the front (+x side), inside the collision radius
        let mut mover = grounded_mover(&map, 76.0, 128.0);
        mover.velocity = Vec2::new(-6.0, 0.0);
        let triggers =
            resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);
        assert!(triggers
            .iter()
            .any(|t| t.line == pressed && t.kind == ContactKind::Press));

        // Pressing from behind blocks but fires nothing
        let mut mover = grounded_mover(&map, 52.0, 128.0);
        mover.velocity = Vec2::new(6.0, 0.0);
        let triggers =
            resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_velocity_decays_to_rest() {
        let map = MapBuilder::new().square(0.0, 0.0, 256.0, 0.0, 128.0, "FLAT1").build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        let mut mover = grounded_mover(&map, 128.0, 128.0);
        mover.velocity = Vec2::new(3.0, 0.0);

        for _ in 0..200 {
            resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);
        }

        assert_eq!(mover.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_vertical_easing_rises_to_footing() {
        let map = MapBuilder::new().square(0.0, 0.0, 256.0, 0.0, 128.0, "FLAT1").build();
        let rooms = rooms_for(&map);
        let settings = map.settings;

        let mut mover = Mover::at(Vec2::new(128.0, 128.0), 20.0, 0.0);
        for _ in 0..100 {
            resolve_movement(&map, &rooms, &settings, &mut mover, &MoverInput::none(), 28.0);
        }

        assert_eq!(mover.height, settings.eye_height);
    }
}

//! Visibility gate
//!
//! Maps the camera's sector through the precomputed visibility relation and
//! toggles per-room show/hide once per tick. Show and hide are idempotent on
//! the rooms, so re-applying the same set each tick costs nothing.

use crate::map::MapGeometry;
use crate::math::Vec2;

use super::room::Room;

/// Apply the visible-sector set for the camera position.
///
/// With no PVS data (or with `show_all`, e.g. while no-clipping) every room
/// is shown. The camera's own room is always shown.
pub fn update_visibility(map: &MapGeometry, rooms: &mut [Room], camera: Vec2, show_all: bool) {
    if show_all || map.pvs.is_empty() {
        for room in rooms.iter_mut() {
            room.show();
        }
        return;
    }

    // Outside every sector: keep the previous set rather than blanking
    let Some(cam) = map.sector_containing(camera) else {
        return;
    };

    for room in rooms.iter_mut() {
        if map.pvs.is_visible(cam, room.id) {
            room.show();
        } else {
            room.hide();
        }
    }

    rooms[cam].show();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::builder::MapBuilder;
    use crate::map::Pvs;
    use crate::sim::room::Room;

    fn two_room_map() -> MapGeometry {
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
        b.line(v2, v3, s0, Some(s1));
        b.line(v3, v0, s0, None);
        b.line(v2, v4, s1, None);
        b.line(v4, v5, s1, None);
        b.line(v5, v3, s1, None);
        b.build()
    }

    fn rooms_for(map: &MapGeometry) -> Vec<Room> {
        map.sectors
            .iter()
            .enumerate()
            .map(|(i, s)| Room::new(i, s, map.sector_center(i), 0.08))
            .collect()
    }

    #[test]
    fn test_pvs_hides_unseen_rooms() {
        let mut map = two_room_map();
        let mut pvs = Pvs::with_sectors(2);
        pvs.set_visible(0, 0);
        pvs.set_visible(1, 0);
        pvs.set_visible(1, 1);
        map.pvs = pvs;

        let mut rooms = rooms_for(&map);

        // From sector 0, sector 1 is not visible
        update_visibility(&map, &mut rooms, Vec2::new(128.0, 128.0), false);
        assert!(rooms[0].visible);
        assert!(!rooms[1].visible);

        // From sector 1, both are visible
        update_visibility(&map, &mut rooms, Vec2::new(384.0, 128.0), false);
        assert!(rooms[0].visible);
        assert!(rooms[1].visible);
    }

    #[test]
    fn test_empty_pvs_shows_everything() {
        let map = two_room_map();
        let mut rooms = rooms_for(&map);
        rooms[1].hide();

        update_visibility(&map, &mut rooms, Vec2::new(128.0, 128.0), false);
        assert!(rooms[0].visible);
        assert!(rooms[1].visible);
    }

    #[test]
    fn test_camera_room_always_shown() {
        let mut map = two_room_map();
        // PVS claims nothing is visible from sector 0, not even itself
        map.pvs = Pvs::with_sectors(2);

        let mut rooms = rooms_for(&map);
        update_visibility(&map, &mut rooms, Vec2::new(128.0, 128.0), false);

        assert!(rooms[0].visible);
        assert!(!rooms[1].visible);
    }
}

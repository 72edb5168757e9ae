//! Hand-made map construction for tests
//!
//! Small helper so test modules can lay out a handful of sectors and lines
//! without going through the RON loader.

use super::{Linedef, MapGeometry, Marker, SectorDef, Sidedef};
use crate::math::Vec2;

pub(crate) struct MapBuilder {
    map: MapGeometry,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            map: MapGeometry::default(),
        }
    }

    pub fn vertex(&mut self, x: f32, y: f32) -> usize {
        self.map.vertices.push(Vec2::new(x, y));
        self.map.vertices.len() - 1
    }

    pub fn sector(&mut self, floor: f32, ceiling: f32, flat: &str, tag: u16) -> usize {
        self.map.sectors.push(SectorDef {
            floor_height: floor,
            ceiling_height: ceiling,
            floor_flat: flat.to_string(),
            ceiling_flat: flat.to_string(),
            light_level: 160,
            special: 0,
            tag,
        });
        self.map.sectors.len() - 1
    }

    fn side(&mut self, sector: usize) -> usize {
        self.map.sidedefs.push(Sidedef { sector });
        self.map.sidedefs.len() - 1
    }

    /// Add a line; the front side is to the right of `from -> to`.
    pub fn line(&mut self, from: usize, to: usize, front: usize, back: Option<usize>) -> usize {
        self.line_with(from, to, front, back, 0, 0, 0)
    }

    pub fn line_with(
        &mut self,
        from: usize,
        to: usize,
        front: usize,
        back: Option<usize>,
        flags: u16,
        special: u16,
        tag: u16,
    ) -> usize {
        let front_side = self.side(front);
        let back_side = back.map(|s| self.side(s));
        self.map.linedefs.push(Linedef {
            from,
            to,
            flags,
            special,
            tag,
            front: front_side,
            back: back_side,
        });
        self.map.linedefs.len() - 1
    }

    pub fn marker(&mut self, x: f32, y: f32, angle: f32) {
        self.map.markers.push(Marker {
            position: Vec2::new(x, y),
            angle,
        });
    }

    pub fn start(&mut self, x: f32, y: f32, angle: f32) {
        self.map.player_start.position = Vec2::new(x, y);
        self.map.player_start.angle = angle;
    }

    /// Closed square room at `(x, y)` with side length `size`, wound so the
    /// interior is on the front side of every wall.
    pub fn square(mut self, x: f32, y: f32, size: f32, floor: f32, ceiling: f32, flat: &str) -> Self {
        let s = self.sector(floor, ceiling, flat, 0);
        let v0 = self.vertex(x, y);
        let v1 = self.vertex(x, y + size);
        let v2 = self.vertex(x + size, y + size);
        let v3 = self.vertex(x + size, y);
        self.line(v0, v1, s, None);
        self.line(v1, v2, s, None);
        self.line(v2, v3, s, None);
        self.line(v3, v0, s, None);
        self
    }

    pub fn build(self) -> MapGeometry {
        let mut map = self.map;
        map.rebuild_index();
        map
    }
}

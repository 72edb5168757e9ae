//! Core geometry types for sector-based levels
//!
//! A level is a planar graph: linedefs connect vertices, sidedefs attach
//! linedefs to sectors, and sectors carry floor/ceiling heights. Derived
//! lookup structures (block grid, per-sector line lists, bounds) are rebuilt
//! after loading and never serialized.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::sim::SimSettings;

/// Block grid cell size in world units
pub const BLOCK_SIZE: f32 = 128.0;

/// Linedef flag bits
pub mod line_flags {
    /// Blocks movement regardless of sector heights
    pub const BLOCKING: u16 = 1 << 0;
    /// Has sectors on both sides
    pub const TWO_SIDED: u16 = 1 << 2;
    pub const UPPER_UNPEGGED: u16 = 1 << 3;
    pub const LOWER_UNPEGGED: u16 = 1 << 4;
    /// Hidden from the automap
    pub const SECRET: u16 = 1 << 5;
}

/// One side of a linedef, attaching it to a sector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidedef {
    /// Index of the sector this side faces away from
    pub sector: usize,
}

/// A wall or boundary edge between two vertices
///
/// The front side is to the right of the `from -> to` direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linedef {
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub flags: u16,
    /// Numeric action code, resolved through the fixed action table
    #[serde(default)]
    pub special: u16,
    /// Tag addressing a sector group; 0 = untagged
    #[serde(default)]
    pub tag: u16,
    pub front: usize,
    #[serde(default)]
    pub back: Option<usize>,
}

impl Linedef {
    pub fn is_blocking(&self) -> bool {
        self.flags & line_flags::BLOCKING != 0
    }
}

/// Static half of a sector: the authored data that never changes at runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorDef {
    pub floor_height: f32,
    pub ceiling_height: f32,
    pub floor_flat: String,
    pub ceiling_flat: String,
    #[serde(default)]
    pub light_level: u8,
    #[serde(default)]
    pub special: u16,
    #[serde(default)]
    pub tag: u16,
}

/// Teleport destination marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub position: Vec2,
    /// Facing after teleport, radians
    #[serde(default)]
    pub angle: f32,
}

/// Where the player proxy begins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerStart {
    pub position: Vec2,
    #[serde(default)]
    pub angle: f32,
}

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec2::new(f32::MAX, f32::MAX),
            max: Vec2::new(f32::MIN, f32::MIN),
        }
    }
}

impl Aabb {
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn expand(&mut self, point: Vec2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }
}

/// Potentially visible set: one bitset row per sector
///
/// An empty PVS (no precomputed data) answers "visible" for everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pvs {
    rows: Vec<Vec<u8>>,
}

impl Pvs {
    /// Allocate an all-hidden PVS for `sectors` sectors
    pub fn with_sectors(sectors: usize) -> Self {
        let stride = sectors.div_ceil(8);
        Self {
            rows: vec![vec![0; stride]; sectors],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn set_visible(&mut self, from: usize, to: usize) {
        if let Some(row) = self.rows.get_mut(from) {
            if let Some(byte) = row.get_mut(to / 8) {
                *byte |= 1 << (to % 8);
            }
        }
    }

    /// Visibility query; fails open when no data covers the pair
    pub fn is_visible(&self, from: usize, to: usize) -> bool {
        if self.rows.is_empty() {
            return true;
        }
        match self.rows.get(from).and_then(|row| row.get(to / 8)) {
            Some(byte) => byte & (1 << (to % 8)) != 0,
            None => true,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Uniform grid over the linedefs, answering near-point queries
#[derive(Debug, Clone, Default)]
pub struct BlockGrid {
    origin: Vec2,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl BlockGrid {
    fn build(bounds: Aabb, lines: &[Linedef], vertices: &[Vec2]) -> Self {
        if lines.is_empty() || vertices.is_empty() {
            return Self::default();
        }

        let cols = ((bounds.max.x - bounds.min.x) / BLOCK_SIZE).floor() as usize + 1;
        let rows = ((bounds.max.y - bounds.min.y) / BLOCK_SIZE).floor() as usize + 1;
        let mut cells = vec![Vec::new(); cols * rows];

        for (i, line) in lines.iter().enumerate() {
            let (a, b) = (vertices[line.from], vertices[line.to]);
            let cx0 = (((a.x.min(b.x)) - bounds.min.x) / BLOCK_SIZE).floor() as usize;
            let cx1 = (((a.x.max(b.x)) - bounds.min.x) / BLOCK_SIZE).floor() as usize;
            let cy0 = (((a.y.min(b.y)) - bounds.min.y) / BLOCK_SIZE).floor() as usize;
            let cy1 = (((a.y.max(b.y)) - bounds.min.y) / BLOCK_SIZE).floor() as usize;

            for cy in cy0..=cy1.min(rows - 1) {
                for cx in cx0..=cx1.min(cols - 1) {
                    cells[cy * cols + cx].push(i);
                }
            }
        }

        Self {
            origin: bounds.min,
            cols,
            rows,
            cells,
        }
    }

    /// Line indices in the 3x3 cell neighborhood around `point`, deduplicated
    pub fn lines_near(&self, point: Vec2) -> Vec<usize> {
        if self.cells.is_empty() {
            return Vec::new();
        }

        let cx = ((point.x - self.origin.x) / BLOCK_SIZE).floor() as isize;
        let cy = ((point.y - self.origin.y) / BLOCK_SIZE).floor() as isize;

        let mut out = Vec::new();
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                let (x, y) = (cx + dx, cy + dy);
                if x < 0 || y < 0 || x >= self.cols as isize || y >= self.rows as isize {
                    continue;
                }
                out.extend_from_slice(&self.cells[y as usize * self.cols + x as usize]);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// The complete static map: authored data plus derived lookup structures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapGeometry {
    pub vertices: Vec<Vec2>,
    pub sidedefs: Vec<Sidedef>,
    pub linedefs: Vec<Linedef>,
    pub sectors: Vec<SectorDef>,
    /// Teleport destinations, resolved to sectors at simulation start
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub player_start: PlayerStart,
    #[serde(default)]
    pub pvs: Pvs,
    #[serde(default)]
    pub settings: SimSettings,

    // Derived after load, not serialized
    #[serde(skip)]
    pub bounds: Aabb,
    #[serde(skip)]
    blocks: BlockGrid,
    #[serde(skip)]
    sector_lines: Vec<Vec<usize>>,
    #[serde(skip)]
    sector_bounds: Vec<Aabb>,
    #[serde(skip)]
    sector_centers: Vec<Vec2>,
}

impl MapGeometry {
    /// Rebuild the derived lookup structures. Call after loading or after
    /// constructing the authored fields by hand.
    pub fn rebuild_index(&mut self) {
        self.bounds = Aabb::default();
        for v in &self.vertices {
            self.bounds.expand(*v);
        }

        self.blocks = BlockGrid::build(self.bounds, &self.linedefs, &self.vertices);

        self.sector_lines = vec![Vec::new(); self.sectors.len()];
        for (i, line) in self.linedefs.iter().enumerate() {
            let (front, back) = self.line_sector_refs(line);
            // A line with the same sector on both sides is interior detail;
            // it is not a boundary and would break the containment test.
            if front.is_some() && front == back {
                continue;
            }
            if let Some(s) = front {
                self.sector_lines[s].push(i);
            }
            if let Some(s) = back {
                self.sector_lines[s].push(i);
            }
        }

        self.sector_bounds = vec![Aabb::default(); self.sectors.len()];
        self.sector_centers = vec![Vec2::ZERO; self.sectors.len()];
        for (s, lines) in self.sector_lines.iter().enumerate() {
            let mut sum = Vec2::ZERO;
            let mut count = 0.0;
            for &l in lines {
                let (a, b) = self.line_endpoints(l);
                self.sector_bounds[s].expand(a);
                self.sector_bounds[s].expand(b);
                sum = sum + a + b;
                count += 2.0;
            }
            if count > 0.0 {
                self.sector_centers[s] = sum.scale(1.0 / count);
            }
        }
    }

    pub fn line_endpoints(&self, line: usize) -> (Vec2, Vec2) {
        let l = &self.linedefs[line];
        (self.vertices[l.from], self.vertices[l.to])
    }

    fn line_sector_refs(&self, line: &Linedef) -> (Option<usize>, Option<usize>) {
        let front = self.sidedefs.get(line.front).map(|s| s.sector);
        let back = line
            .back
            .and_then(|b| self.sidedefs.get(b).map(|s| s.sector));
        (front, back)
    }

    /// Sectors on the front and back side of a line
    pub fn line_sectors(&self, line: usize) -> (Option<usize>, Option<usize>) {
        self.line_sector_refs(&self.linedefs[line])
    }

    /// Signed side of `point` relative to a line: negative on the front
    /// (right of `from -> to`), positive on the back.
    pub fn side_of(&self, line: usize, point: Vec2) -> f32 {
        let (a, b) = self.line_endpoints(line);
        (b - a).cross(point - a)
    }

    /// Line indices near a point, via the block grid
    pub fn lines_near(&self, point: Vec2) -> Vec<usize> {
        self.blocks.lines_near(point)
    }

    /// Boundary lines of a sector (both-sided references included once)
    pub fn sector_line_ids(&self, sector: usize) -> &[usize] {
        &self.sector_lines[sector]
    }

    /// World-space centroid of a sector's boundary, for event spatialization
    pub fn sector_center(&self, sector: usize) -> Vec2 {
        self.sector_centers[sector]
    }

    /// Sectors potentially visible from `sector`. With no PVS data this is
    /// every sector.
    pub fn visible_from(&self, sector: usize) -> Vec<usize> {
        (0..self.sectors.len())
            .filter(|&s| self.pvs.is_visible(sector, s))
            .collect()
    }

    /// Which sector contains this point, via crossing-number over the
    /// sector's boundary lines with bounding-box pruning.
    pub fn sector_containing(&self, point: Vec2) -> Option<usize> {
        for (s, bounds) in self.sector_bounds.iter().enumerate() {
            if !bounds.contains(point) {
                continue;
            }

            let mut inside = false;
            for &l in &self.sector_lines[s] {
                let (a, b) = self.line_endpoints(l);
                if (a.y > point.y) != (b.y > point.y) {
                    let x_hit = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                    if x_hit > point.x {
                        inside = !inside;
                    }
                }
            }
            if inside {
                return Some(s);
            }
        }
        None
    }
}

//! Tag registry - sector grouping for triggers
//!
//! A line action addresses sectors by integer tag, not by id, so one switch
//! can drive any number of sectors at once. Groups are built once at
//! simulation start and never change; members are kept sorted by sector id so
//! fan-out order is deterministic.

use std::collections::HashMap;

use crate::map::SectorDef;

#[derive(Debug, Default)]
pub struct TagRegistry {
    groups: HashMap<u16, Vec<usize>>,
}

impl TagRegistry {
    pub fn build(sectors: &[SectorDef]) -> Self {
        let mut groups: HashMap<u16, Vec<usize>> = HashMap::new();
        for (i, sector) in sectors.iter().enumerate() {
            groups.entry(sector.tag).or_default().push(i);
        }
        // Insertion order is already ascending, but don't depend on it
        for members in groups.values_mut() {
            members.sort_unstable();
        }
        Self { groups }
    }

    /// Members of a tag group, sorted ascending; empty for unknown tags
    pub fn rooms_with_tag(&self, tag: u16) -> &[usize] {
        self.groups.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }
}

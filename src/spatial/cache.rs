//! Multi-level cell index of item locations.

use super::cell::{CellEntry, LEVEL_COUNT, ancestry};
use super::covering::{CoveringInfo, cover_disk, level_span};
use crate::config::SearchCoveringParameters;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Caller-assigned item identifier.
pub type ItemId = u64;

/// In-memory proximity index mapping items to the cells that contain them.
///
/// Every indexed item is registered in exactly one cell at each of the 31
/// levels, and `items` and `cells` always mirror each other. The cache is not
/// internally synchronized; wrap it in a lock (or use `SyncGeoLocationCache`
/// with the `sync` feature) to share it across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocationCache {
    /// Cell memberships of each item, finest level first
    pub(crate) items: FxHashMap<ItemId, Vec<CellEntry>>,
    /// Per level: cell position to the items registered in it
    pub(crate) cells: Vec<FxHashMap<u64, FxHashSet<ItemId>>>,
}

/// Summary of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub items: usize,
    /// Non-empty cells, summed over all levels
    pub occupied_cells: usize,
}

impl GeoLocationCache {
    pub fn new() -> Self {
        Self {
            items: FxHashMap::default(),
            cells: (0..LEVEL_COUNT).map(|_| FxHashMap::default()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Cell memberships of `id`, level 30 first.
    pub fn cells_of(&self, id: ItemId) -> Option<&[CellEntry]> {
        self.items.get(&id).map(Vec::as_slice)
    }

    /// Items registered in the cell at `pos` on `level`.
    pub fn members(&self, level: u8, pos: u64) -> Option<&FxHashSet<ItemId>> {
        self.cells.get(usize::from(level))?.get(&pos)
    }

    /// Insert `id` at (lat, lon), replacing any previous location.
    pub fn set(&mut self, id: ItemId, lat: f64, lon: f64) {
        self.delete(id);

        let entries = ancestry(lat, lon);
        for entry in &entries {
            self.cells[usize::from(entry.level)]
                .entry(entry.pos)
                .or_default()
                .insert(id);
        }
        self.items.insert(id, entries);
    }

    /// Remove `id` from every level. Unknown ids are ignored.
    pub fn delete(&mut self, id: ItemId) {
        let Some(entries) = self.items.remove(&id) else {
            return;
        };

        for entry in entries {
            let level = &mut self.cells[usize::from(entry.level)];
            if let Some(members) = level.get_mut(&entry.pos) {
                members.remove(&id);
                if members.is_empty() {
                    level.remove(&entry.pos);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        for level in &mut self.cells {
            level.clear();
        }
    }

    /// Ids of items whose cells intersect the disk of `distance_meters` around (lat, lon).
    ///
    /// Results are candidates at cell precision, sorted ascending; callers
    /// wanting exact distances re-check them. With the exhaustive covering,
    /// each covering cell is also looked up at every coarser level down to
    /// the coarsest level in the covering. Finer levels are never probed:
    /// every item is registered at all 31 levels, so its ancestor at the
    /// covering cell's own level already matches. The coarser probes are what
    /// widen the result when the covering mixes levels, so a covering with a
    /// low minimum level returns more far-away candidates. The fast covering
    /// looks up each of its (fewer, larger) cells at its own level only.
    ///
    /// The covering never exceeds `params.max_cells` cells, even when
    /// `params.min_level` is finer than the disk warrants.
    pub fn items_within_distance(
        &self,
        lat: f64,
        lon: f64,
        distance_meters: f64,
        params: &SearchCoveringParameters,
    ) -> (Vec<ItemId>, CoveringInfo) {
        let covering = cover_disk(lat, lon, distance_meters, params);
        let fast = params.use_fast_covering;

        let Some((min_level, max_level)) = level_span(&covering) else {
            return (Vec::new(), CoveringInfo {
                fast,
                ..CoveringInfo::default()
            });
        };

        let mut visited: FxHashSet<CellEntry> = FxHashSet::default();
        for cell in &covering {
            if fast {
                visited.insert(CellEntry::from_cell(*cell));
                continue;
            }
            let cell_level = cell.level() as u8;
            for level in min_level..=cell_level {
                visited.insert(CellEntry::from_cell(cell.parent(u64::from(level))));
            }
        }

        let mut found: FxHashSet<ItemId> = FxHashSet::default();
        for entry in &visited {
            if let Some(members) = self.members(entry.level, entry.pos) {
                found.extend(members.iter().copied());
            }
        }

        let mut ids: Vec<ItemId> = found.into_iter().collect();
        ids.sort_unstable();

        let info = CoveringInfo {
            cells: covering.into_iter().map(CellEntry::from_cell).collect(),
            min_level,
            max_level,
            fast,
            lookups: visited.len(),
        };
        (ids, info)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            items: self.items.len(),
            occupied_cells: self.cells.iter().map(FxHashMap::len).sum(),
        }
    }

    /// Check that `items` and `cells` mirror each other exactly.
    pub fn is_consistent(&self) -> bool {
        if self.cells.len() != LEVEL_COUNT {
            return false;
        }

        let mut memberships = 0;
        for (id, entries) in &self.items {
            if entries.len() != LEVEL_COUNT {
                return false;
            }
            let mut seen = [false; LEVEL_COUNT];
            for entry in entries {
                let level = usize::from(entry.level);
                if level >= LEVEL_COUNT || seen[level] {
                    return false;
                }
                seen[level] = true;
                if !self.cells[level]
                    .get(&entry.pos)
                    .is_some_and(|members| members.contains(id))
                {
                    return false;
                }
            }
            memberships += LEVEL_COUNT;
        }

        let registered: usize = self
            .cells
            .iter()
            .flat_map(|level| level.values())
            .map(|members| members.len())
            .sum();
        let no_empty_cells = self
            .cells
            .iter()
            .all(|level| level.values().all(|members| !members.is_empty()));

        registered == memberships && no_empty_cells
    }
}

impl Default for GeoLocationCache {
    fn default() -> Self {
        Self::new()
    }
}

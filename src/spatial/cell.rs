//! Hierarchical cell addressing on top of S2 cell ids.
//!
//! A point lies in exactly one cell at each of the 31 levels. The full 64-bit
//! cell id serves as the cell position: it is unique within a level, and the
//! parent at any coarser level is a constant-time bit truncation.

use super::point::unit_point;
use crate::config::MAX_CELL_LEVEL;
use s2::cellid::CellID;
use serde::{Deserialize, Serialize};

/// Number of cell levels tracked per item (0 through 30).
pub const LEVEL_COUNT: usize = MAX_CELL_LEVEL as usize + 1;

/// One (position, level) membership of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellEntry {
    pub pos: u64,
    pub level: u8,
}

impl CellEntry {
    pub fn from_cell(cell: CellID) -> Self {
        Self {
            pos: cell.0,
            level: cell.level() as u8,
        }
    }

    pub fn cell_id(&self) -> CellID {
        CellID(self.pos)
    }

    pub fn token(&self) -> String {
        self.cell_id().to_token()
    }
}

/// Leaf (level 30) cell containing the point.
pub fn leaf_cell(lat: f64, lon: f64) -> CellID {
    CellID::from(&unit_point(lat, lon))
}

/// Cell containing the point at `level`; levels above 30 are clamped.
pub fn cell_at(lat: f64, lon: f64, level: u8) -> CellEntry {
    let level = level.min(MAX_CELL_LEVEL);
    CellEntry::from_cell(leaf_cell(lat, lon).parent(u64::from(level)))
}

/// Every cell containing the point, finest first: level 30 down to level 0.
pub fn ancestry(lat: f64, lon: f64) -> Vec<CellEntry> {
    let leaf = leaf_cell(lat, lon);
    (0..=MAX_CELL_LEVEL)
        .rev()
        .map(|level| CellEntry::from_cell(leaf.parent(u64::from(level))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHICAGO: (f64, f64) = (41.87963549397698, -87.63028184499035);
    const MANHATTAN: (f64, f64) = (40.75306726395187, -73.98119781456353);

    #[test]
    fn test_ancestry_covers_every_level_once() {
        let cells = ancestry(CHICAGO.0, CHICAGO.1);
        assert_eq!(cells.len(), LEVEL_COUNT);

        let levels: Vec<u8> = cells.iter().map(|c| c.level).collect();
        let expected: Vec<u8> = (0..=30).rev().collect();
        assert_eq!(levels, expected);
    }

    #[test]
    fn test_parent_chain_is_consistent() {
        let cells = ancestry(MANHATTAN.0, MANHATTAN.1);
        for pair in cells.windows(2) {
            let (child, parent) = (pair[0], pair[1]);
            assert_eq!(child.level, parent.level + 1);
            assert_eq!(child.cell_id().parent(u64::from(parent.level)).0, parent.pos);
            assert!(parent.cell_id().contains(&child.cell_id()));
        }
    }

    #[test]
    fn test_cell_at_matches_ancestry() {
        let cells = ancestry(CHICAGO.0, CHICAGO.1);
        for level in [0_u8, 7, 15, 30] {
            let entry = cell_at(CHICAGO.0, CHICAGO.1, level);
            assert_eq!(entry.level, level);
            assert_eq!(entry, cells[(30 - level) as usize]);
        }
        assert_eq!(cell_at(CHICAGO.0, CHICAGO.1, 99).level, 30);
    }

    #[test]
    fn test_far_points_split_early() {
        let a = ancestry(CHICAGO.0, CHICAGO.1);
        let b = ancestry(MANHATTAN.0, MANHATTAN.1);
        // ~1100 km apart: distinct well before the level-10 (~10 km) cells.
        assert_ne!(a[30 - 10].pos, b[30 - 10].pos);
        assert_ne!(a[0].pos, b[0].pos);
    }
}

//! Disk coverings used to turn a radius query into cell lookups.

use super::cell::CellEntry;
use super::point::{meters_to_radians, unit_point};
use crate::config::{MAX_CELL_LEVEL, SearchCoveringParameters};
use s2::cap::Cap;
use s2::cellid::CellID;
use s2::region::RegionCoverer;
use s2::s1::{Angle, Rad};
use serde::{Deserialize, Serialize};

/// Diagnostics describing what a proximity query searched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoveringInfo {
    /// Cells returned by the region coverer
    pub cells: Vec<CellEntry>,
    /// Coarsest level present in the covering
    pub min_level: u8,
    /// Finest level present in the covering
    pub max_level: u8,
    /// Whether the fast covering was used
    pub fast: bool,
    /// Number of distinct (level, position) lookups performed against the index
    pub lookups: usize,
}

impl CoveringInfo {
    pub fn tokens(&self) -> Vec<String> {
        self.cells.iter().map(CellEntry::token).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Derivative of the minimum cell width for the quadratic S2 projection:
/// every level-`k` cell is at least `MIN_WIDTH_DERIV * 2^-k` radians wide.
const MIN_WIDTH_DERIV: f64 = 2.0 * std::f64::consts::SQRT_2 / 3.0;

/// Finest level whose cells are all at least `width` radians wide.
fn level_for_min_width(width: f64) -> u8 {
    if width <= 0.0 {
        return MAX_CELL_LEVEL;
    }
    let level = (MIN_WIDTH_DERIV / width).log2().floor();
    level.clamp(0.0, f64::from(MAX_CELL_LEVEL)) as u8
}

/// Cover the disk of `radius_meters` around (lat, lon) with at most
/// `max_cells` cells.
///
/// The coverer lets `min_level` override `max_cells`, so `min_level` is first
/// lowered to the level at which a few cells span the disk. If the covering
/// is still too large it is coarsened level by level; a coarsened covering
/// contains the original one, so no item inside the disk is lost. The one
/// exception to the cap is a disk straddling more cube faces than `max_cells`.
pub(crate) fn cover_disk(
    lat: f64,
    lon: f64,
    radius_meters: f64,
    params: &SearchCoveringParameters,
) -> Vec<CellID> {
    let params = params.normalized();
    let radians = meters_to_radians(radius_meters);
    let center = unit_point(lat, lon);
    let cap = Cap::from_center_angle(&center, &Angle::from(Rad(radians)));

    let spanning = level_for_min_width(2.0 * radians);
    let coverer = RegionCoverer {
        min_level: params.min_level.min(spanning),
        max_level: params.max_level,
        level_mod: params.level_mod,
        max_cells: params.max_cells,
    };

    let union = if params.use_fast_covering {
        coverer.fast_covering(&cap)
    } else {
        coverer.covering(&cap)
    };
    coarsen(union.0, params.max_cells)
}

/// Replace cells by their ancestors until at most `max_cells` remain.
fn coarsen(mut cells: Vec<CellID>, max_cells: usize) -> Vec<CellID> {
    while cells.len() > max_cells {
        let Some((min, max)) = level_span(&cells) else {
            break;
        };
        let target = match (min, max) {
            (0, 0) => break,
            (min, max) if min < max => min,
            (min, _) => min - 1,
        };

        for cell in &mut cells {
            if cell.level() as u8 > target {
                *cell = cell.parent(u64::from(target));
            }
        }
        cells.sort_unstable_by_key(|c| c.0);
        cells.dedup_by_key(|c| c.0);
    }
    cells
}

/// Level span of a covering; `None` when it is empty.
pub(crate) fn level_span(cells: &[CellID]) -> Option<(u8, u8)> {
    let levels = cells.iter().map(|c| c.level() as u8);
    let min = levels.clone().min()?;
    let max = levels.max()?;
    Some((min, max))
}

//! Multi-resolution proximity index built on S2 cells.
//!
//! ```rust
//! use geopool::spatial::GeoLocationCache;
//! use geopool::SearchCoveringParameters;
//!
//! let mut cache = GeoLocationCache::new();
//! cache.set(0, 41.87963549397698, -87.63028184499035); // Chicago
//! cache.set(1, 40.75306726395187, -73.98119781456353); // Manhattan
//!
//! let params = SearchCoveringParameters::default();
//! let (nearby, _covering) = cache.items_within_distance(41.8806, -87.6313, 1_000.0, &params);
//! assert_eq!(nearby, vec![0]);
//! ```

pub mod cache;
pub mod cell;
pub mod covering;
pub mod point;

#[cfg(feature = "snapshot")]
mod snapshot;

#[cfg(feature = "sync")]
pub mod sync;

pub use cache::{CacheStats, GeoLocationCache, ItemId};
pub use cell::{CellEntry, LEVEL_COUNT};
pub use covering::CoveringInfo;
pub use point::{EARTH_RADIUS_METERS, distance_between_degrees, distance_meters, unit_point};

#[cfg(feature = "sync")]
pub use sync::SyncGeoLocationCache;

//! Order-preserving ring worker pool and multi-resolution S2 proximity index.
//!
//! ```rust
//! use geopool::{GeoLocationCache, Pool, SearchCoveringParameters, Task, TaskDescriptor};
//! use std::thread;
//!
//! // Results come back in submission order.
//! let pool: Pool<f64, f64> = Pool::new(2, 3, "sqrt")?;
//! let tasks = [4.0, 9.0, 16.0]
//!     .map(|x| Task::new(TaskDescriptor::new("sqrt"), x, |_, x: f64| Ok(x.sqrt())));
//! let results = pool.results();
//! thread::scope(|s| {
//!     s.spawn(|| pool.run());
//!     s.spawn(|| pool.generate_from(tasks));
//! });
//! let roots: Vec<f64> = results.iter().filter_map(|r| r.into_value()).collect();
//! assert_eq!(roots, vec![2.0, 3.0, 4.0]);
//!
//! // Nearby items by cell covering.
//! let mut cache = GeoLocationCache::new();
//! cache.set(7, 40.7128, -74.0060);
//! let (ids, _) = cache.items_within_distance(40.7130, -74.0062, 500.0, &SearchCoveringParameters::default());
//! assert_eq!(ids, vec![7]);
//! # Ok::<(), geopool::GeopoolError>(())
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod spatial;

pub use config::{Config, MAX_CELL_LEVEL, PoolConfig, SearchCoveringParameters};
pub use error::{BoxError, GeopoolError, Result, TaskError};

pub use spatial::{CacheStats, CellEntry, CoveringInfo, GeoLocationCache, ItemId};
#[cfg(feature = "sync")]
pub use spatial::SyncGeoLocationCache;

pub use pool::{Pool, Task, TaskContext, TaskDescriptor, TaskResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Config, GeopoolError, PoolConfig, Result, SearchCoveringParameters};

    pub use crate::{GeoLocationCache, ItemId};

    pub use crate::{Pool, Task, TaskContext, TaskDescriptor, TaskError, TaskResult};

    #[cfg(feature = "sync")]
    pub use crate::SyncGeoLocationCache;

    pub use std::time::Duration;
}

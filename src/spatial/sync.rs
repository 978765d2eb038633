//! Thread-safe wrapper for concurrent cache access.
//!
//! `SyncGeoLocationCache` wraps a [`GeoLocationCache`] in `Arc<RwLock<_>>`:
//! queries share the lock, `set`/`delete` take it exclusively.
//!
//! # Features
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! geopool = { version = "0.1", features = ["sync"] }
//! ```

use super::cache::{CacheStats, GeoLocationCache, ItemId};
use super::covering::CoveringInfo;
use crate::config::SearchCoveringParameters;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable, lock-protected handle to one shared [`GeoLocationCache`].
#[derive(Clone, Default)]
pub struct SyncGeoLocationCache {
    inner: Arc<RwLock<GeoLocationCache>>,
}

impl SyncGeoLocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cache(cache: GeoLocationCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn set(&self, id: ItemId, lat: f64, lon: f64) {
        self.inner.write().set(id, lat, lon);
    }

    pub fn delete(&self, id: ItemId) {
        self.inner.write().delete(id);
    }

    pub fn items_within_distance(
        &self,
        lat: f64,
        lon: f64,
        distance_meters: f64,
        params: &SearchCoveringParameters,
    ) -> (Vec<ItemId>, CoveringInfo) {
        self.inner
            .read()
            .items_within_distance(lat, lon, distance_meters, params)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.inner.read().contains(id)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats()
    }

    /// Copy of the current cache contents.
    pub fn snapshot(&self) -> GeoLocationCache {
        self.inner.read().clone()
    }

    /// Run `f` with shared access to the cache.
    pub fn with_read<R>(&self, f: impl FnOnce(&GeoLocationCache) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access, e.g. to apply several moves atomically.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut GeoLocationCache) -> R) -> R {
        f(&mut self.inner.write())
    }

    #[cfg(feature = "snapshot")]
    pub fn encode(&self) -> crate::error::Result<Vec<u8>> {
        self.inner.read().encode()
    }

    #[cfg(feature = "snapshot")]
    pub fn decode(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(Self::from_cache(GeoLocationCache::decode(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let cache = SyncGeoLocationCache::new();
        let other = cache.clone();

        cache.set(1, 41.8796, -87.6303);
        assert!(other.contains(1));
        assert_eq!(other.len(), 1);

        other.delete(1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_with_write_batches_moves() {
        let cache = SyncGeoLocationCache::new();
        cache.with_write(|c| {
            c.set(1, 41.8796, -87.6303);
            c.set(2, 40.7531, -73.9812);
        });
        assert_eq!(cache.with_read(GeoLocationCache::len), 2);
        assert!(cache.snapshot().is_consistent());
    }
}

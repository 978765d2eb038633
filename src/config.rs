//! Configuration for the worker pool and covering searches.
//!
//! Every struct here is serializable and carries serde defaults, so partial
//! JSON or TOML documents load cleanly.
//!
//! # Example
//!
//! ```rust
//! use geopool::Config;
//!
//! let json = r#"{
//!     "pool": { "name": "reverse-geocode", "worker_count": 8 },
//!     "search": { "max_cells": 16, "use_fast_covering": true }
//! }"#;
//! let config = Config::from_json(json).unwrap();
//! assert_eq!(config.pool.worker_count, 8);
//! assert_eq!(config.search.max_level, 30);
//! ```

use crate::error::{GeopoolError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Finest cell level; level 0 cells are the six cube faces.
pub const MAX_CELL_LEVEL: u8 = 30;

/// Settings for a [`Pool`](crate::pool::Pool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Name used in log lines and passed to task execution functions
    #[serde(default = "PoolConfig::default_name")]
    pub name: String,

    /// Number of workers in the ring (at least 1)
    #[serde(default = "PoolConfig::default_worker_count")]
    pub worker_count: usize,

    /// Capacity of the input and output channels
    #[serde(default = "PoolConfig::default_task_count")]
    pub task_count: usize,

    /// Per-worker deadline, measured from worker start
    #[serde(default = "PoolConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl PoolConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    fn default_name() -> String {
        "pool".to_string()
    }

    const fn default_worker_count() -> usize {
        4
    }

    const fn default_task_count() -> usize {
        64
    }

    const fn default_timeout_ms() -> u64 {
        Self::DEFAULT_TIMEOUT.as_millis() as u64
    }

    pub fn new(name: impl Into<String>, worker_count: usize, task_count: usize) -> Self {
        Self {
            name: name.into(),
            worker_count,
            task_count,
            timeout_ms: Self::default_timeout_ms(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.worker_count == 0 {
            return Err("Worker count must be greater than zero".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Worker timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(
            Self::default_name(),
            Self::default_worker_count(),
            Self::default_task_count(),
        )
    }
}

/// Knobs for the region covering computed by
/// [`GeoLocationCache::items_within_distance`](crate::spatial::GeoLocationCache::items_within_distance).
///
/// `min_level` is the coarsest level the covering may use and `max_level` the
/// finest; `level_mod` restricts covering cells to levels
/// `min_level + k * level_mod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCoveringParameters {
    #[serde(default)]
    pub min_level: u8,

    #[serde(default = "SearchCoveringParameters::default_max_level")]
    pub max_level: u8,

    #[serde(default = "SearchCoveringParameters::default_level_mod")]
    pub level_mod: u8,

    #[serde(default = "SearchCoveringParameters::default_max_cells")]
    pub max_cells: usize,

    /// Use the cheaper, looser covering instead of the exhaustive one
    #[serde(default)]
    pub use_fast_covering: bool,
}

impl SearchCoveringParameters {
    const fn default_max_level() -> u8 {
        MAX_CELL_LEVEL
    }

    const fn default_level_mod() -> u8 {
        1
    }

    const fn default_max_cells() -> usize {
        8
    }

    pub fn fast(mut self) -> Self {
        self.use_fast_covering = true;
        self
    }

    pub fn with_levels(mut self, min_level: u8, max_level: u8) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn with_level_mod(mut self, level_mod: u8) -> Self {
        self.level_mod = level_mod;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_level > MAX_CELL_LEVEL {
            return Err(format!("Max level must be at most {MAX_CELL_LEVEL}"));
        }
        if self.min_level > self.max_level {
            return Err("Min level must not exceed max level".to_string());
        }
        if !(1..=3).contains(&self.level_mod) {
            return Err("Level mod must be between 1 and 3".to_string());
        }
        if self.max_cells == 0 {
            return Err("Max cells must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Clamp every field into its valid range.
    ///
    /// Queries run on normalized parameters so that a bad configuration
    /// degrades the covering instead of failing the lookup.
    pub fn normalized(&self) -> Self {
        let max_level = self.max_level.min(MAX_CELL_LEVEL);
        Self {
            min_level: self.min_level.min(max_level),
            max_level,
            level_mod: self.level_mod.clamp(1, 3),
            max_cells: self.max_cells.max(1),
            use_fast_covering: self.use_fast_covering,
        }
    }
}

impl Default for SearchCoveringParameters {
    fn default() -> Self {
        Self {
            min_level: 0,
            max_level: Self::default_max_level(),
            level_mod: Self::default_level_mod(),
            max_cells: Self::default_max_cells(),
            use_fast_covering: false,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub search: SearchCoveringParameters,
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.pool.validate()?;
        self.search.validate()
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate().map_err(GeopoolError::InvalidConfig)?;
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| GeopoolError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(GeopoolError::InvalidConfig)?;
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GeopoolError::InvalidConfig(e.to_string()))
    }
}

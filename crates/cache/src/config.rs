//! Configuration system for the image row cache.
//!
//! This module defines the configuration a [`Director`](crate::Director) is built from.
//! It provides:
//! 1. **Defaults:** Baseline block size and memory budget.
//! 2. **Structure:** A single flat `CacheConfig` deserializable from JSON.
//! 3. **Builders:** Unit-scaled setters matching the command-line flags (KiB blocks, MiB budget).
//!
//! Configuration is supplied via JSON (`CacheConfig::from_json` / `from_file`) or
//! use `CacheConfig::default()` and the `with_*` builders.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::{CacheError, Result};

/// Default configuration constants for the cache.
mod defaults {
    /// Size of one cache block in bytes (2 MiB).
    ///
    /// Rows are grouped into blocks of this size; a block is the unit of
    /// allocation, eviction and spill I/O.
    pub const BLOCK_SIZE_BYTES: usize = 2 << 20;

    /// Total memory budget shared by all caches (1 GiB).
    pub const MANAGED_BYTES: usize = 1 << 30;
}

/// Cache director configuration.
///
/// The director derives its block budget from these values when it is created
/// and whenever they change while no caches are registered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Size of one block in bytes
    #[serde(default = "CacheConfig::default_block_size_bytes")]
    pub block_size_bytes: usize,

    /// Memory budget shared by all image caches, in bytes
    #[serde(default = "CacheConfig::default_managed_bytes")]
    pub managed_bytes: usize,

    /// Directory for spill files (defaults to the system temp directory)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Returns the default block size in bytes.
    const fn default_block_size_bytes() -> usize {
        defaults::BLOCK_SIZE_BYTES
    }

    /// Returns the default managed memory in bytes.
    const fn default_managed_bytes() -> usize {
        defaults::MANAGED_BYTES
    }

    /// Sets the block size in KiB, as accepted by the `-b` flag.
    #[must_use]
    pub const fn with_block_size_kb(mut self, kb: usize) -> Self {
        self.block_size_bytes = kb.saturating_mul(1024);
        self
    }

    /// Sets the managed memory in MiB, as accepted by the `-m` flag.
    #[must_use]
    pub const fn with_managed_mb(mut self, mb: usize) -> Self {
        self.managed_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    /// Sets the directory in which spill files are created.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields take their defaults. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigParse`] for malformed JSON or unknown fields and
    /// [`CacheError::InvalidConfig`] if a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigRead`] if the file cannot be read, otherwise
    /// the errors of [`CacheConfig::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(CacheError::ConfigRead)?;
        Self::from_json(&text)
    }

    /// Checks that the block size and budget are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if either size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.block_size_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "block_size_bytes must be greater than zero".to_owned(),
            ));
        }
        if self.managed_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "managed_bytes must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Number of blocks the budget covers, rounded up.
    ///
    /// A valid configuration always yields at least one block.
    pub const fn managed_blocks(&self) -> usize {
        if self.block_size_bytes == 0 {
            return 0;
        }
        self.managed_bytes.div_ceil(self.block_size_bytes)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_size_bytes: defaults::BLOCK_SIZE_BYTES,
            managed_bytes: defaults::MANAGED_BYTES,
            temp_dir: None,
        }
    }
}

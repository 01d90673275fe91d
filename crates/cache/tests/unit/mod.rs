//! # Unit Components
//!
//! Tests for each building block of the cache, from configuration and block
//! geometry up to whole-director behaviour under memory pressure.

/// Configuration defaults, builders, JSON loading and locking.
pub mod config;

/// Row-to-block layout.
pub mod geometry;

/// Block pool and slab buffers.
pub mod pool;




/// Statistics snapshots and their rendering.
pub mod stats;

/// Memory-pressure scenarios over multi-block images.
pub mod scenarios;

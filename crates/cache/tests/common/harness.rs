//! Test harness for director-level tests.
//!
//! Directors built here use tiny blocks so a few hundred rows exercise
//! eviction, spill writes and read-back without large allocations.

use std::path::Path;

use rowswap_core::{CacheConfig, CacheId, Director};

/// Installs a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Configuration with `block_size`-byte blocks and a budget of exactly `managed_blocks`.
pub fn config(block_size: usize, managed_blocks: usize) -> CacheConfig {
    CacheConfig {
        block_size_bytes: block_size,
        managed_bytes: block_size * managed_blocks,
        temp_dir: None,
    }
}

/// Director with the given block size and budget, spilling to the system temp dir.
pub fn director(block_size: usize, managed_blocks: usize) -> Director {
    init_tracing();
    Director::new(config(block_size, managed_blocks)).unwrap()
}

/// Director that creates its spill files in `dir`.
pub fn director_in(dir: &Path, block_size: usize, managed_blocks: usize) -> Director {
    init_tracing();
    Director::new(config(block_size, managed_blocks).with_temp_dir(dir)).unwrap()
}

/// Deterministic byte for column `col` of row `row` of the image seeded with `seed`.
pub fn pattern(seed: usize, row: usize, col: usize) -> u8 {
    u8::try_from((seed * 131 + row * 31 + col * 7) % 251).unwrap()
}

/// Writes the seeded pattern into every row of `id`, top to bottom.
pub fn write_pattern(director: &mut Director, id: CacheId, seed: usize) {
    let height = director.geometry(id).unwrap().height();
    for row in 0..height {
        let bytes = director.row_mut(id, row).unwrap();
        for (col, byte) in bytes.iter_mut().enumerate() {
            *byte = pattern(seed, row, col);
        }
    }
}

/// Checks that row `row` of `id` holds the seeded pattern.
pub fn row_matches(director: &mut Director, id: CacheId, seed: usize, row: usize) -> bool {
    let bytes = director.row(id, row).unwrap();
    bytes
        .iter()
        .enumerate()
        .all(|(col, &b)| b == pattern(seed, row, col))
}

/// Asserts that every row of `id` holds the seeded pattern.
pub fn assert_pattern(director: &mut Director, id: CacheId, seed: usize) {
    let height = director.geometry(id).unwrap().height();
    for row in 0..height {
        assert!(
            row_matches(director, id, seed, row),
            "row {row} of cache {id} lost its contents"
        );
    }
}

/// Number of entries in `dir`.
pub fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

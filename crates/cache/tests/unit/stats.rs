//! # Statistics Tests
//!
//! Counter values in director and cache snapshots, miss-counter resets, and
//! the rendered tables.

use pretty_assertions::assert_eq;

use crate::common::harness::{director, write_pattern};

#[test]
fn director_snapshot_tracks_budget() {
    let mut d = director(128, 5);
    let a = d.create_cache(16, 64, &[0]).unwrap();
    let _ = d.create_cache(16, 8, &[0]).unwrap();
    let _ = d.row(a, 63).unwrap();

    let stats = d.stats();
    assert_eq!(stats.block_size_bytes, 128);
    assert_eq!(stats.managed_bytes, 640);
    assert_eq!(stats.managed_blocks, 5);
    assert_eq!(stats.blocks_available, 2);
    assert_eq!(stats.pool_in_use, 3);
    assert_eq!(stats.pool_capacity, 3);
    assert_eq!(stats.total_misses, 1);
    assert_eq!(stats.registered_caches, 2);
}

#[test]
fn cache_snapshot_tracks_misses_and_evictions() {
    let mut d = director(64, 2);
    let id = d.create_cache(8, 64, &[0]).unwrap();
    write_pattern(&mut d, id, 0);

    let stats = d.cache_stats(id).unwrap();
    assert_eq!(stats.blocks_needed, 8);
    assert_eq!(stats.lines_per_block, 8);
    assert_eq!(stats.resident_blocks, 2);
    assert_eq!(stats.misses, 7);
    assert_eq!(stats.evictions, 6);
    assert_eq!(stats.spill_writes, 6);
    assert_eq!(stats.last_victim, Some(5));
}

#[test]
fn reset_clears_total_and_per_cache_misses() {
    let mut d = director(64, 1);
    let a = d.create_cache(8, 64, &[0]).unwrap();
    let b = d.create_cache(8, 64, &[0]).unwrap();
    let _ = d.row(a, 40).unwrap();
    let _ = d.row(b, 40).unwrap();
    assert_eq!(d.stats().total_misses, 2);

    d.reset_cache_misses();
    assert_eq!(d.stats().total_misses, 0);
    assert_eq!(d.cache_stats(a).unwrap().misses, 0);
    assert_eq!(d.cache_stats(b).unwrap().misses, 0);

    let _ = d.row(a, 0).unwrap();
    assert_eq!(d.cache_stats(a).unwrap().misses, 1);
    assert_eq!(d.stats().total_misses, 1);
}

#[test]
fn tables_render_key_fields() {
    let mut d = director(64, 2);
    let id = d.create_cache(8, 64, &[0]).unwrap();
    write_pattern(&mut d, id, 0);

    let director_table = d.stats().to_string();
    assert!(director_table.contains("ROW CACHE DIRECTOR"));
    assert!(director_table.contains("managed_blocks           2"));
    assert!(director_table.contains("total_misses             7"));

    let cache_table = d.cache_stats(id).unwrap().to_string();
    assert!(cache_table.contains("IMAGE CACHE #0"));
    assert!(cache_table.contains("8 x 64 x 1 B"));
    assert!(cache_table.contains("spill.writes           6 (384 B)"));

    let all = d.all_cache_stats();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
}

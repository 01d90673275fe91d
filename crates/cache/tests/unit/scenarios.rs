//! # Memory Pressure Scenarios
//!
//! Whole-image scans under budgets far smaller than the images:
//! - a single block serving a hundred-block image,
//! - two images competing for a shared budget,
//! - victim choice during a strictly forward scan.

use pretty_assertions::assert_eq;
use rowswap_core::{CacheId, Director};
use rstest::rstest;

use crate::common::harness::{assert_pattern, director, row_matches, write_pattern};

/// 16-byte rows in 2 KiB blocks: 128 rows per block, 100 blocks.
const WIDTH: usize = 16;
const HEIGHT: usize = 12_800;
const BLOCK: usize = 2048;

// ══════════════════════════════════════════════════════════
// 1. One block for a hundred
// ══════════════════════════════════════════════════════════

#[test]
fn single_block_budget_serves_large_image() {
    let mut d = director(BLOCK, 1);
    let id = d.create_cache(WIDTH, HEIGHT, &[0]).unwrap();
    assert_eq!(d.geometry(id).unwrap().blocks_needed(), 100);

    for row in 0..HEIGHT {
        assert_eq!(d.row(id, row).unwrap(), &[0; WIDTH]);
    }
    assert_eq!(d.cache_stats(id).unwrap().misses, 99);

    write_pattern(&mut d, id, 3);
    assert_pattern(&mut d, id, 3);
    assert_eq!(d.blocks_available(), 0);
    assert!(d.is_balanced());
}

// ══════════════════════════════════════════════════════════
// 2. Two images, one budget
// ══════════════════════════════════════════════════════════

fn interleaved_scan(d: &mut Director, a: CacheId, b: CacheId) {
    for row in 0..HEIGHT {
        assert!(row_matches(d, a, 1, row));
        assert!(row_matches(d, b, 2, row));
        assert!(d.blocks_available() <= 150);
    }
}

#[test]
fn two_images_share_one_and_a_half_images_of_budget() {
    let mut d = director(BLOCK, 150);
    let a = d.create_cache(WIDTH, HEIGHT, &[0]).unwrap();
    let b = d.create_cache(WIDTH, HEIGHT, &[0]).unwrap();
    write_pattern(&mut d, a, 1);
    write_pattern(&mut d, b, 2);
    d.reset_cache_misses();

    interleaved_scan(&mut d, a, b);

    let misses_a = d.cache_stats(a).unwrap().misses;
    let misses_b = d.cache_stats(b).unwrap().misses;
    assert!(misses_a > 0);
    assert!(misses_b > 0);
    assert_eq!(d.stats().total_misses, misses_a + misses_b);

    let resident =
        d.cache_stats(a).unwrap().resident_blocks + d.cache_stats(b).unwrap().resident_blocks;
    assert_eq!(resident + d.blocks_available(), 150);
    assert!(d.is_balanced());
}

// ══════════════════════════════════════════════════════════
// 3. Forward scans evict behind themselves
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(2, false)]
#[case(3, false)]
#[case(7, true)]
fn forward_scan_never_evicts_ahead(#[case] budget: usize, #[case] mutable: bool) {
    let mut d = director(BLOCK, budget);
    let id = d.create_cache(WIDTH, HEIGHT, &[0]).unwrap();
    let lines = d.geometry(id).unwrap().lines_per_block();
    let mut evictions = 0;

    for row in 0..HEIGHT {
        if mutable {
            d.row_mut(id, row).unwrap()[0] = 1;
        } else {
            let _ = d.row(id, row).unwrap();
        }
        let stats = d.cache_stats(id).unwrap();
        if stats.evictions > evictions {
            evictions = stats.evictions;
            let victim = stats.last_victim.unwrap();
            assert!(
                victim <= row / lines,
                "scan at block {} evicted block {victim}",
                row / lines
            );
        }
    }
    assert_eq!(evictions, 100 - budget as u64);
}

//! # Block Pool Tests
//!
//! Chunk reuse, accounting, and the slab buffer accessors.

use pretty_assertions::assert_eq;
use rowswap_core::CacheError;
use rowswap_core::pool::BlockPool;
use rowswap_core::pool::buffer::SlabBuffer;

use crate::common::harness::director;

#[test]
fn pool_grows_one_chunk_at_a_time() {
    let mut pool = BlockPool::new(128);
    assert_eq!((pool.capacity(), pool.in_use()), (0, 0));

    let handles: Vec<_> = (0..3).map(|_| pool.allocate().unwrap()).collect();
    assert_eq!((pool.capacity(), pool.in_use()), (3, 3));

    for h in handles {
        pool.release(h);
    }
    assert_eq!((pool.capacity(), pool.in_use()), (3, 0));

    let _ = pool.allocate().unwrap();
    assert_eq!((pool.capacity(), pool.in_use()), (3, 1));
    assert_eq!(pool.block_size(), 128);
}

#[test]
fn impossible_allocation_reports_out_of_memory() {
    let err = SlabBuffer::try_new(usize::MAX).unwrap_err();
    assert!(matches!(err, CacheError::OutOfMemory { bytes } if bytes == usize::MAX));
    assert!(err.is_fatal());
}

#[test]
fn slab_fill_tiles_multi_byte_pattern() {
    let mut slab = SlabBuffer::try_new(10).unwrap();
    slab.fill_pattern(9, &[1, 2, 3]);
    assert_eq!(slab.read_slice(0, 10), &[1, 2, 3, 1, 2, 3, 1, 2, 3, 0]);

    slab.write_slice(4, &[9, 9]);
    assert_eq!(&slab[3..7], &[1, 9, 9, 1]);
    slab[0] = 7;
    assert_eq!(slab.read_slice(0, 1), &[7]);
    assert_eq!(slab.len(), 10);
}

#[test]
#[should_panic(expected = "slab read out of bounds")]
fn slab_read_past_end_panics() {
    let slab = SlabBuffer::try_new(4).unwrap();
    let _ = slab.read_slice(2, 3);
}

#[test]
#[should_panic(expected = "slab write out of bounds")]
fn slab_write_past_end_panics() {
    let mut slab = SlabBuffer::try_new(4).unwrap();
    slab.write_slice(3, &[1, 2]);
}

#[test]
fn pool_never_exceeds_peak_grant() {
    let mut d = director(64, 3);
    let a = d.create_cache(8, 64, &[0]).unwrap();
    for row in 0..64 {
        let _ = d.row(a, row).unwrap();
    }
    let stats = d.stats();
    assert_eq!(stats.pool_capacity, 3);
    assert_eq!(stats.pool_in_use, 3);
    assert_eq!(stats.blocks_available, 0);
}

//! # Geometry Tests
//!
//! Derivation of rows per block and the block count from image dimensions.

use pretty_assertions::assert_eq;
use rowswap_core::CacheError;
use rowswap_core::image::Geometry;
use rstest::rstest;

#[rstest]
// width, height, pixel, block -> lines per block, blocks
#[case(16, 12_800, 1, 2048, 128, 100)]
#[case(100, 50, 2, 3000, 8, 7)]
#[case(640, 480, 3, 2 << 20, 1024, 1)]
#[case(7, 10, 1, 7, 1, 10)]
#[case(10, 10, 1, 39, 2, 5)]
fn lines_per_block_is_largest_fitting_power_of_two(
    #[case] width: usize,
    #[case] height: usize,
    #[case] pixel: usize,
    #[case] block: usize,
    #[case] lines: usize,
    #[case] blocks: usize,
) {
    let g = Geometry::new(width, height, pixel, block).unwrap();
    assert_eq!(g.row_bytes(), width * pixel);
    assert_eq!(g.lines_per_block(), lines);
    assert_eq!(g.blocks_needed(), blocks);
    assert!(g.lines_per_block() * g.row_bytes() <= block);
}

#[test]
fn final_block_may_be_short() {
    let g = Geometry::new(10, 10, 1, 40).unwrap();
    assert_eq!(g.lines_per_block(), 4);
    assert_eq!(g.blocks_needed(), 3);
    assert_eq!(g.rows_in_block(0), 4);
    assert_eq!(g.rows_in_block(2), 2);
    assert_eq!(g.block_bytes(2), 20);
    assert_eq!(g.first_row(2), 8);
    assert_eq!(g.spill_offset(2), 80);
}

#[test]
fn rows_map_to_blocks_and_offsets() {
    let g = Geometry::new(4, 100, 2, 64).unwrap();
    assert_eq!(g.lines_per_block(), 8);
    for row in 0..100 {
        assert_eq!(g.block_of(row), row / 8);
        assert_eq!(g.offset_in_block(row), (row % 8) * 8);
    }
}

#[test]
fn row_wider_than_block_is_rejected() {
    let err = Geometry::new(100, 10, 4, 256).unwrap_err();
    assert!(matches!(
        err,
        CacheError::RowTooWide {
            row_bytes: 400,
            block_size: 256
        }
    ));
}

#[rstest]
#[case(0, 10)]
#[case(10, 0)]
#[case(0, 0)]
fn zero_dimension_needs_no_blocks(#[case] width: usize, #[case] height: usize) {
    let g = Geometry::new(width, height, 1, 64).unwrap();
    assert!(g.is_empty());
    assert_eq!(g.blocks_needed(), 0);
    assert_eq!((g.width(), g.height()), (width, height));
}

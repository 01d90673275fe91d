//! Synthetic write/verify workload.
//!
//! Every image gets a pattern that depends on its index, the row and the
//! column, so a row served from the wrong block, image or file offset is
//! detected on read-back.

use std::fmt;

use clap::ValueEnum;
use rowswap_core::{CacheId, Director, Result};
use tracing::warn;

/// Order in which rows of several images are visited.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Finish each image before starting the next.
    Sequential,
    /// Visit row `r` of every image before row `r + 1`.
    Interleaved,
}

impl fmt::Display for ScanOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Interleaved => f.write_str("interleaved"),
        }
    }
}

/// Images created for one run.
#[derive(Debug)]
pub struct Workload {
    ids: Vec<CacheId>,
    height: usize,
}

/// Pattern byte for `col` of `row` in image `seed`.
const fn pattern(seed: usize, row: usize, col: usize) -> u8 {
    let mixed = seed
        .wrapping_mul(131)
        .wrapping_add(row.wrapping_mul(31))
        .wrapping_add(col.wrapping_mul(7));
    mixed.to_le_bytes()[0]
}

impl Workload {
    /// Creates `images` zero-filled caches of the given size.
    pub fn create(
        director: &mut Director,
        images: usize,
        width: usize,
        height: usize,
        pixel_bytes: usize,
    ) -> Result<Self> {
        let fill = vec![0; pixel_bytes];
        let ids = (0..images)
            .map(|_| director.create_cache(width, height, &fill))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { ids, height })
    }

    /// Visits every `(image index, id, row)` in `order`.
    fn visit(
        &self,
        order: ScanOrder,
        mut f: impl FnMut(usize, CacheId, usize) -> Result<()>,
    ) -> Result<()> {
        match order {
            ScanOrder::Sequential => {
                for (seed, &id) in self.ids.iter().enumerate() {
                    for row in 0..self.height {
                        f(seed, id, row)?;
                    }
                }
            }
            ScanOrder::Interleaved => {
                for row in 0..self.height {
                    for (seed, &id) in self.ids.iter().enumerate() {
                        f(seed, id, row)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Writes the pattern into every row.
    pub fn write(&self, director: &mut Director, order: ScanOrder) -> Result<()> {
        self.visit(order, |seed, id, row| {
            for (col, byte) in director.row_mut(id, row)?.iter_mut().enumerate() {
                *byte = pattern(seed, row, col);
            }
            Ok(())
        })
    }

    /// Reads every row back and returns the number that differ from the pattern.
    pub fn verify(&self, director: &mut Director, order: ScanOrder) -> Result<usize> {
        let mut mismatches = 0;
        self.visit(order, |seed, id, row| {
            let intact = director
                .row(id, row)?
                .iter()
                .enumerate()
                .all(|(col, &b)| b == pattern(seed, row, col));
            if !intact {
                warn!(cache = %id, row, "row content mismatch");
                mismatches += 1;
            }
            Ok(())
        })?;
        Ok(mismatches)
    }
}

//! Single-image view.
//!
//! A [`CacheHandle`] pairs a mutable borrow of the director with one cache id,
//! giving consumers the row-access interface of a plain image. Because the
//! handle holds the director exclusively, the id cannot go stale while it exists.

use std::fmt;

use super::Director;
use crate::common::{CacheId, Pixel, Result};
use crate::image::Geometry;
use crate::stats::CacheStats;

/// Borrowed view of one image cache.
pub struct CacheHandle<'d> {
    director: &'d mut Director,
    id: CacheId,
}

impl<'d> CacheHandle<'d> {
    pub(super) const fn new(director: &'d mut Director, id: CacheId) -> Self {
        Self { director, id }
    }

    /// Identifier of the viewed cache.
    pub const fn id(&self) -> CacheId {
        self.id
    }

    /// Current layout.
    pub fn geometry(&self) -> Geometry {
        self.director
            .geometry(self.id)
            .unwrap_or_else(|_| Geometry::empty(0))
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.geometry().width()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.geometry().height()
    }

    /// Bytes per pixel.
    pub fn pixel_size(&self) -> usize {
        self.geometry().pixel_size()
    }

    /// Borrows row `row` for reading.
    ///
    /// # Errors
    ///
    /// Fatal errors from faulting the row in; see [`Director::row`].
    ///
    /// # Panics
    ///
    /// Panics if the image is empty or `row` is out of range.
    pub fn get_row(&mut self, row: usize) -> Result<&[u8]> {
        self.director.row(self.id, row)
    }

    /// Borrows row `row` for writing.
    ///
    /// # Errors
    ///
    /// Fatal errors from faulting the row in; see [`Director::row_mut`].
    ///
    /// # Panics
    ///
    /// Panics if the image is empty or `row` is out of range.
    pub fn get_row_mut(&mut self, row: usize) -> Result<&mut [u8]> {
        self.director.row_mut(self.id, row)
    }

    /// Reads the pixel at column `x` of row `y`.
    ///
    /// # Errors
    ///
    /// Fatal errors from faulting the row in.
    ///
    /// # Panics
    ///
    /// Panics if `P` does not match the pixel size or the coordinates are out of range.
    pub fn pixel<P: Pixel>(&mut self, x: usize, y: usize) -> Result<P> {
        assert_eq!(P::SIZE, self.pixel_size(), "pixel type size mismatch");
        let row = self.get_row(y)?;
        Ok(P::read_bytes(&row[x * P::SIZE..(x + 1) * P::SIZE]))
    }

    /// Writes the pixel at column `x` of row `y`.
    ///
    /// # Errors
    ///
    /// Fatal errors from faulting the row in.
    ///
    /// # Panics
    ///
    /// Panics if `P` does not match the pixel size or the coordinates are out of range.
    pub fn set_pixel<P: Pixel>(&mut self, x: usize, y: usize, value: P) -> Result<()> {
        assert_eq!(P::SIZE, self.pixel_size(), "pixel type size mismatch");
        let row = self.get_row_mut(y)?;
        value.write_bytes(&mut row[x * P::SIZE..(x + 1) * P::SIZE]);
        Ok(())
    }

    /// Resizes the image, discarding its contents; see [`Director::resize`].
    ///
    /// # Errors
    ///
    /// Same as [`Director::resize`].
    pub fn resize(&mut self, width: usize, height: usize, fill: &[u8]) -> Result<()> {
        self.director.resize(self.id, width, height, fill)
    }

    /// Sets every pixel to `fill`; see [`Director::fill`].
    ///
    /// # Errors
    ///
    /// Same as [`Director::fill`].
    pub fn fill(&mut self, fill: &[u8]) -> Result<()> {
        self.director.fill(self.id, fill)
    }

    /// Snapshot of this cache's counters.
    ///
    /// # Errors
    ///
    /// Never fails while the handle exists; the signature mirrors [`Director::cache_stats`].
    pub fn stats(&self) -> Result<CacheStats> {
        self.director.cache_stats(self.id)
    }
}

impl fmt::Debug for CacheHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("id", &self.id)
            .field("geometry", &self.geometry())
            .finish_non_exhaustive()
    }
}

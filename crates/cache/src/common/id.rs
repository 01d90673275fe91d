//! Cache identifiers.

use std::fmt;

/// Identifies one image cache owned by a [`Director`](crate::Director).
///
/// Identifiers are never reused within a director, so a stale id is reported
/// as [`CacheError::UnknownCache`](crate::CacheError::UnknownCache) instead of
/// silently aliasing a newer cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheId(pub(crate) u64);

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

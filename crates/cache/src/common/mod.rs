//! Common types shared by the director, the image caches, and the pool.
//!
//! 1. **Error Handling:** The crate error enum and its `Result` alias.
//! 2. **Identifiers:** Strongly typed cache identifiers.
//! 3. **Pixels:** Encoding of typed pixel values into raw row bytes.

/// Error types for budget, I/O, and configuration failures.
pub mod error;

/// Cache identifier type.
pub mod id;

/// Pixel encoding trait and primitive implementations.
pub mod pixel;

pub use error::{CacheError, Result, SpillOp};
pub use id::CacheId;
pub use pixel::Pixel;

//! # Common Test Infrastructure
//!
//! Helpers shared by every test module.

/// Director constructors, tracing setup and row patterns.
pub mod harness;

//! Shared utilities.
//!
//! Content hashing used by completion markers and artifact sets.

pub mod hash;

//! Optimized collection types for Quarry.
//!
//! Lookup tables such as the registry extension table use the AHash map
//! instead of the std hasher.

pub use ahash::AHashMap as HashMap;

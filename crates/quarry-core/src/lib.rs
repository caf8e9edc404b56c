//! Quarry Core
//!
//! This crate contains the ambient functionality shared by the Quarry crates:
//! logging setup, profiling scopes and hash collections.

pub mod alloc;
pub mod logging;
pub mod profiling;

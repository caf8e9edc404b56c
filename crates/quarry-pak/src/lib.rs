//! PAK archives: many named, optionally compressed and encrypted files in one container.
//!
//! - [`Pak`] opens an archive, validates its entry table and reads payloads on demand.
//! - [`PakWriter`] builds archives (always format version 2).
//! - [`format`] documents the bit-exact layout shared by both.

pub mod cipher;
pub mod compression;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use error::{PakError, PakResult};
pub use format::{PakFlags, PakHeader};
pub use reader::{Pak, PakEntry};
pub use writer::{PakWriter, WriteStats};

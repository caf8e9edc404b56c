//! Error types for archive operations.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while reading or writing an archive.
#[derive(Debug)]
pub enum PakError {
    /// Failed to read or write the archive or one of its inputs.
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The file does not start with `PAK`.
    InvalidSignature([u8; 3]),

    /// The format version is not 1 or 2.
    UnsupportedVersion(u8),

    /// The flag bits are inconsistent (full encryption without table encryption).
    InvalidFlags(u32),

    /// The archive is encrypted but no (non-empty) key was supplied.
    MissingKey,

    /// The file ends before a required region.
    Truncated {
        /// Which region is incomplete.
        what: &'static str,
    },

    /// An entry references data outside the archive or has a malformed name.
    BrokenEntry {
        /// Entry index.
        index: usize,
        /// Description of the problem.
        reason: String,
    },

    /// An entry index past the end of the table.
    EntryOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of entries.
        count: usize,
    },

    /// A compressed payload could not be inflated to its recorded size.
    Decompress {
        /// Entry index.
        index: usize,
        /// Description from the codec.
        message: String,
    },

    /// A name cannot be stored in an archive.
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The archive would exceed the 32-bit offsets of the format.
    TooLarge,
}

impl fmt::Display for PakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PakError::Io { path, source } => {
                write!(f, "IO error on '{}': {}", path.display(), source)
            }
            PakError::InvalidSignature(sign) => {
                write!(f, "Invalid signature {:?}", String::from_utf8_lossy(sign))
            }
            PakError::UnsupportedVersion(version) => {
                write!(f, "Invalid version {}", version)
            }
            PakError::InvalidFlags(flags) => {
                write!(f, "Invalid flags combination {}", flags)
            }
            PakError::MissingKey => write!(f, "Archive is encrypted and no key was given"),
            PakError::Truncated { what } => write!(f, "Failed to read {}", what),
            PakError::BrokenEntry { index, reason } => {
                write!(f, "Broken entry at index {}: {}", index, reason)
            }
            PakError::EntryOutOfRange { index, count } => {
                write!(f, "Entry index {} out of range ({} entries)", index, count)
            }
            PakError::Decompress { index, message } => {
                write!(f, "Failed to decompress entry {}: {}", index, message)
            }
            PakError::InvalidName { name } => write!(f, "Invalid entry name '{}'", name),
            PakError::TooLarge => write!(f, "Archive exceeds 4 GiB"),
        }
    }
}

impl std::error::Error for PakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PakError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl PakError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> PakError {
        let path = path.into();
        move |source| PakError::Io { path, source }
    }

    /// Attach a path to IO errors raised by path-less readers.
    pub(crate) fn with_path(self, path: &std::path::Path) -> PakError {
        match self {
            PakError::Io { path: p, source } if p.as_os_str().is_empty() => PakError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

/// Result type alias for archive operations.
pub type PakResult<T> = Result<T, PakError>;

//! Error types for the resource system.

use std::fmt;
use std::path::PathBuf;

use quarry_pak::PakError;

use crate::resource::ResourceType;
use crate::scheduler::SchedulerMode;

/// Errors that can occur during resource operations.
#[derive(Debug)]
pub enum AssetError {
    /// No resource is registered under this filename.
    NotFound {
        /// The requested filename.
        filename: String,
    },

    /// The resource exists but has a different type.
    TypeMismatch {
        /// The requested filename.
        filename: String,
        /// Type the caller asked for.
        expected: ResourceType,
        /// Type the resource was registered with.
        actual: ResourceType,
    },

    /// A directory passed to registration does not exist.
    DirectoryNotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// Failed to read resource bytes or enumerate a directory.
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// An archive could not be opened or an entry could not be read.
    Pak {
        /// The archive path.
        path: PathBuf,
        /// The archive error.
        source: PakError,
    },

    /// The resource bytes are malformed for its type.
    Decode {
        /// Display path of the resource.
        path: String,
        /// Description of the error.
        message: String,
    },

    /// A device collaborator refused the resource.
    Device {
        /// Display path of the resource.
        path: String,
        /// Message reported by the device.
        message: String,
    },

    /// The operation is not valid in the current scheduler mode.
    InvalidMode {
        /// The rejected operation.
        operation: &'static str,
        /// The scheduler mode at the time of the call.
        mode: SchedulerMode,
    },

    /// A resource config is not valid TOML or has unknown keys.
    Config {
        /// The config file, if read from disk.
        path: Option<PathBuf>,
        /// The parse error.
        source: toml::de::Error,
    },

    /// A load screen progress range outside `0.0..=1.0` or with `min > max`.
    InvalidProgressRange {
        /// Requested lower bound.
        min: f32,
        /// Requested upper bound.
        max: f32,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { filename } => {
                write!(f, "Missing resource '{}'", filename)
            }
            AssetError::TypeMismatch {
                filename,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Resource '{}' is a {}, expected a {}",
                    filename, actual, expected
                )
            }
            AssetError::DirectoryNotFound { path } => {
                write!(f, "Directory not found: {}", path.display())
            }
            AssetError::Io { path, source } => {
                write!(f, "IO error on '{}': {}", path.display(), source)
            }
            AssetError::Pak { path, source } => {
                write!(f, "Failed to read pak '{}': {}", path.display(), source)
            }
            AssetError::Decode { path, message } => {
                write!(f, "Failed to decode '{}': {}", path, message)
            }
            AssetError::Device { path, message } => {
                write!(f, "Device rejected '{}': {}", path, message)
            }
            AssetError::InvalidMode { operation, mode } => {
                write!(f, "'{}' is not allowed in {:?} mode", operation, mode)
            }
            AssetError::Config { path: Some(path), source } => {
                write!(f, "Invalid resource config '{}': {}", path.display(), source)
            }
            AssetError::Config { path: None, source } => {
                write!(f, "Invalid resource config: {}", source)
            }
            AssetError::InvalidProgressRange { min, max } => {
                write!(f, "Invalid load screen progress range {}..{}", min, max)
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            AssetError::Pak { source, .. } => Some(source),
            AssetError::Config { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for resource operations.
pub type AssetResult<T> = Result<T, AssetError>;

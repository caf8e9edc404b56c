//! Resource records and their load state.

use std::fmt;
use std::path::PathBuf;

use crate::device::{FontObject, SoundObject, TextureObject};
use crate::mesh::{MeshData, RawGeometry};

/// Load state of a resource.
///
/// Moves forward only, except that a failed decode or a cancelled load screen
/// returns a `Loading` resource to `NotLoaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// Registered but not decoded.
    #[default]
    NotLoaded,
    /// Queued on a load screen.
    Loading,
    /// Decoded and ready for use.
    Loaded,
}

/// Kind of a resource, resolved from its file extension at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Texture,
    Mesh,
    VertexData,
    Sound,
    Music,
    Font,
}

impl ResourceType {
    /// Lowercase name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Texture => "texture",
            ResourceType::Mesh => "mesh",
            ResourceType::VertexData => "vertex data",
            ResourceType::Sound => "sound",
            ResourceType::Music => "music",
            ResourceType::Font => "font",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of an opened archive inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PakId(pub(crate) usize);

/// Stable index of a resource inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    /// Raw index.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Where the bytes of a resource come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrigin {
    /// A file found by a directory scan.
    Loose {
        /// Full path of the file.
        path: PathBuf,
    },
    /// An entry of a registered archive.
    Packed {
        /// The owning archive.
        pak: PakId,
        /// Entry index inside the archive.
        index: usize,
    },
    /// Built by the caller and inserted already loaded; has no bytes.
    Memory,
}

/// Decoded contents of a resource.
#[derive(Debug, Default)]
pub enum Payload {
    /// Nothing decoded yet.
    #[default]
    Empty,
    Texture(TextureObject),
    /// Metadata-only meshes have no device buffers yet.
    Mesh(Box<MeshData>),
    VertexData(RawGeometry),
    /// Sounds and music share the audio handle type.
    Sound(SoundObject),
    Font(FontObject),
}

/// Registry record for one loadable asset.
#[derive(Debug)]
pub struct Resource {
    pub(crate) filename: String,
    pub(crate) kind: ResourceType,
    pub(crate) state: ResourceState,
    pub(crate) origin: ResourceOrigin,
    pub(crate) payload: Payload,
}

impl Resource {
    pub(crate) fn new(filename: String, kind: ResourceType, origin: ResourceOrigin) -> Self {
        Self {
            filename,
            kind,
            state: ResourceState::NotLoaded,
            origin,
            payload: Payload::Empty,
        }
    }

    /// Name the resource is registered under, in its original case.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Resource type.
    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    /// Current load state.
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Where the bytes come from.
    pub fn origin(&self) -> &ResourceOrigin {
        &self.origin
    }

    /// Decoded payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Check if the resource is a loose file.
    pub fn is_file(&self) -> bool {
        matches!(self.origin, ResourceOrigin::Loose { .. })
    }

    /// Check if the resource is ready for use.
    pub fn is_loaded(&self) -> bool {
        self.state == ResourceState::Loaded
    }
}

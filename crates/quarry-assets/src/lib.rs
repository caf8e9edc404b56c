//! Quarry Assets
//!
//! Resources are registered by filename from data directories and PAK archives,
//! then decoded on demand by per-type loaders that hand the bytes to device
//! collaborators. The first source to provide a filename wins.
//!
//! Loading is either immediate or batched behind a load screen:
//!
//! ```ignore
//! use quarry_assets::prelude::*;
//!
//! let mut manager = ResourceManager::new(render, audio);
//! manager.add_dir("data", true)?;
//!
//! manager.prepare_load_screen(0.0, 1.0)?;
//! manager.add_task_category("meshes")?;
//! let tree = manager.load::<Mesh>("tree.qmsh")?;
//! manager.set_progress_callback(|progress, category| draw_bar(progress, category));
//! manager.start_load_screen(None)?;
//!
//! while manager.tick() {}
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod handle;
mod loader;
pub mod manager;
pub mod mesh;
pub mod music;
pub mod registry;
pub mod resource;
pub mod scheduler;

pub use config::{ArchiveSource, DirectorySource, ResourceConfig};
pub use device::{AudioDevice, BufferObject, DeviceError, FontObject, RenderDevice, SoundObject, TextureObject};
pub use error::{AssetError, AssetResult};
pub use event::{ResourceEvent, ResourceEventBuffer};
pub use handle::{Handle, ResourceKind};
pub use manager::ResourceManager;
pub use mesh::{MeshData, MeshFlags, RawGeometry};
pub use music::MusicList;
pub use registry::ResourceRegistry;
pub use resource::{Resource, ResourceId, ResourceOrigin, ResourceState, ResourceType};
pub use scheduler::SchedulerMode;

/// Marker types for typed handles.
pub mod kinds {
    pub use crate::handle::{Font, Mesh, Music, Sound, Texture, VertexData};
}

pub mod prelude {
    pub use crate::kinds::*;
    pub use crate::{
        AssetError, AssetResult, Handle, MusicList, ResourceConfig, ResourceEvent, ResourceManager,
        ResourceState, ResourceType, SchedulerMode,
    };
}

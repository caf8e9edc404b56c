//! The resource registry: one record per case-insensitive filename.

use std::collections::BTreeMap;
use std::path::Path;

use quarry_core::alloc::HashMap;
use quarry_pak::Pak;
use walkdir::WalkDir;

use crate::error::{AssetError, AssetResult};
use crate::handle::{Handle, ResourceKind};
use crate::resource::{Payload, PakId, Resource, ResourceId, ResourceOrigin, ResourceState, ResourceType};

const DEFAULT_EXTENSIONS: &[(&str, ResourceType)] = &[
    ("bmp", ResourceType::Texture),
    ("dds", ResourceType::Texture),
    ("dib", ResourceType::Texture),
    ("hdr", ResourceType::Texture),
    ("jpg", ResourceType::Texture),
    ("pfm", ResourceType::Texture),
    ("png", ResourceType::Texture),
    ("ppm", ResourceType::Texture),
    ("tga", ResourceType::Texture),
    ("qmsh", ResourceType::Mesh),
    ("phy", ResourceType::VertexData),
    ("aiff", ResourceType::Sound),
    ("asf", ResourceType::Sound),
    ("asx", ResourceType::Sound),
    ("dls", ResourceType::Sound),
    ("flac", ResourceType::Sound),
    ("it", ResourceType::Sound),
    ("m3u", ResourceType::Sound),
    ("midi", ResourceType::Sound),
    ("mod", ResourceType::Sound),
    ("mp2", ResourceType::Sound),
    ("mp3", ResourceType::Sound),
    ("pls", ResourceType::Sound),
    ("s3m", ResourceType::Sound),
    ("wav", ResourceType::Sound),
    ("wax", ResourceType::Sound),
    ("wma", ResourceType::Sound),
    ("xm", ResourceType::Sound),
    ("ogg", ResourceType::Music),
    ("ttf", ResourceType::Font),
    ("otf", ResourceType::Font),
];

/// Index of every known resource, sourced from directories and archives.
///
/// The first registration of a filename wins; later sources providing the same
/// name (compared case-insensitively) are ignored. Records are never removed.
pub struct ResourceRegistry {
    resources: Vec<Resource>,
    index: BTreeMap<String, ResourceId>,
    extensions: HashMap<String, ResourceType>,
    paks: Vec<Pak>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    /// Create a registry with the default extension table.
    pub fn new() -> Self {
        let mut registry = Self {
            resources: Vec::new(),
            index: BTreeMap::new(),
            extensions: HashMap::new(),
            paks: Vec::new(),
        };
        for &(ext, kind) in DEFAULT_EXTENSIONS {
            registry.register_extension(ext, kind);
        }
        registry
    }

    /// Map a file extension (without the dot) to a resource type.
    ///
    /// Only affects files registered afterwards.
    pub fn register_extension(&mut self, ext: &str, kind: ResourceType) {
        self.extensions.insert(ext.to_ascii_lowercase(), kind);
    }

    /// Resolve the type of a filename from its extension.
    pub fn resource_type_for(&self, filename: &str) -> Option<ResourceType> {
        let (_, ext) = filename.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        self.extensions.get(&ext.to_ascii_lowercase()).copied()
    }

    /// Register every file of a directory. Returns the number of new resources.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>, recursive: bool) -> AssetResult<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AssetError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
        let walker = if recursive { walker } else { walker.max_depth(1) };

        let mut added = 0;
        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(dir).to_path_buf();
                AssetError::Io {
                    path,
                    source: err.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(filename) = entry.file_name().to_str() else {
                tracing::warn!("Skipping non UTF-8 file name '{}'", entry.path().display());
                continue;
            };
            let origin = ResourceOrigin::Loose {
                path: entry.path().to_path_buf(),
            };
            if self.add_resource(filename, origin).is_some() {
                added += 1;
            }
        }

        tracing::debug!("Added directory '{}' ({} resources)", dir.display(), added);
        Ok(added)
    }

    /// Open an archive and register its entries. Returns the number of new resources.
    ///
    /// The archive is fully validated before anything is registered.
    pub fn add_pak(&mut self, path: impl AsRef<Path>, key: Option<&str>) -> AssetResult<usize> {
        let path = path.as_ref();
        let pak = Pak::open(path, key).map_err(|source| AssetError::Pak {
            path: path.to_path_buf(),
            source,
        })?;

        let pak_id = PakId(self.paks.len());
        let names: Vec<String> = pak.entries().iter().map(|e| e.name.clone()).collect();
        self.paks.push(pak);

        let mut added = 0;
        for (index, name) in names.iter().enumerate() {
            let origin = ResourceOrigin::Packed { pak: pak_id, index };
            if self.add_resource(name, origin).is_some() {
                added += 1;
            }
        }

        tracing::debug!("Added pak '{}' ({} resources)", path.display(), added);
        Ok(added)
    }

    /// Add a caller-built resource that is loaded on insertion.
    ///
    /// Returns `None` if the filename is already taken.
    pub fn insert_loaded(&mut self, filename: &str, kind: ResourceType, payload: Payload) -> Option<ResourceId> {
        let key = filename.to_ascii_lowercase();
        if let Some(&existing) = self.index.get(&key) {
            tracing::warn!(
                "Resource '{}' already added ({})",
                filename,
                self.display_path(existing)
            );
            return None;
        }

        let mut resource = Resource::new(filename.to_string(), kind, ResourceOrigin::Memory);
        resource.state = ResourceState::Loaded;
        resource.payload = payload;
        Some(self.push(key, resource))
    }

    fn add_resource(&mut self, filename: &str, origin: ResourceOrigin) -> Option<ResourceId> {
        let kind = self.resource_type_for(filename)?;
        let key = filename.to_ascii_lowercase();

        if let Some(&existing) = self.index.get(&key) {
            let same_file = matches!(
                (&self.resource(existing).origin, &origin),
                (ResourceOrigin::Loose { path: a }, ResourceOrigin::Loose { path: b }) if a == b
            );
            if !same_file {
                tracing::warn!(
                    "Resource '{}' already exists ({}; {})",
                    filename,
                    self.display_path(existing),
                    self.origin_path(filename, &origin)
                );
            }
            return None;
        }

        Some(self.push(key, Resource::new(filename.to_string(), kind, origin)))
    }

    fn push(&mut self, key: String, resource: Resource) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(resource);
        self.index.insert(key, id);
        id
    }

    /// Find a resource of any type.
    pub fn find(&self, filename: &str) -> Option<ResourceId> {
        self.index.get(&filename.to_ascii_lowercase()).copied()
    }

    /// Look up a resource, returning `None` if it is missing or of another type.
    pub fn try_get<T: ResourceKind>(&self, filename: &str) -> Option<Handle<T>> {
        let id = self.find(filename)?;
        (self.resource(id).kind == T::TYPE).then(|| Handle::new(id))
    }

    /// Look up a resource that must exist with the requested type.
    pub fn get<T: ResourceKind>(&self, filename: &str) -> AssetResult<Handle<T>> {
        let id = self.find(filename).ok_or_else(|| AssetError::NotFound {
            filename: filename.to_string(),
        })?;
        let actual = self.resource(id).kind;
        if actual != T::TYPE {
            return Err(AssetError::TypeMismatch {
                filename: filename.to_string(),
                expected: T::TYPE,
                actual,
            });
        }
        Ok(Handle::new(id))
    }

    /// Borrow a record.
    ///
    /// # Panics
    ///
    /// If `id` was issued by another registry.
    pub fn resource(&self, id: impl Into<ResourceId>) -> &Resource {
        &self.resources[id.into().0 as usize]
    }

    pub(crate) fn resource_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.0 as usize]
    }

    /// Read the raw bytes of a resource from its file or archive.
    pub fn read_bytes(&mut self, id: ResourceId) -> AssetResult<Vec<u8>> {
        let resource = &self.resources[id.0 as usize];
        match &resource.origin {
            ResourceOrigin::Loose { path } => std::fs::read(path).map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            }),
            ResourceOrigin::Packed { pak, index } => {
                let pak = &mut self.paks[pak.0];
                pak.read_entry(*index).map_err(|source| AssetError::Pak {
                    path: pak.path().to_path_buf(),
                    source,
                })
            }
            ResourceOrigin::Memory => Err(AssetError::Decode {
                path: resource.filename.clone(),
                message: "resource has no backing bytes".to_string(),
            }),
        }
    }

    /// Path used in messages: the file path, or `<archive>/<filename>` for packed resources.
    pub fn display_path(&self, id: impl Into<ResourceId>) -> String {
        let resource = self.resource(id);
        self.origin_path(&resource.filename, &resource.origin)
    }

    fn origin_path(&self, filename: &str, origin: &ResourceOrigin) -> String {
        match origin {
            ResourceOrigin::Loose { path } => path.display().to_string(),
            ResourceOrigin::Packed { pak, .. } => {
                format!("{}/{}", self.paks[pak.0].path().display(), filename)
            }
            ResourceOrigin::Memory => filename.to_string(),
        }
    }

    /// The archive a packed resource lives in.
    pub fn pak(&self, id: PakId) -> &Pak {
        &self.paks[id.0]
    }

    /// Number of registered archives.
    pub fn pak_count(&self) -> usize {
        self.paks.len()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate resources in filename order (case-insensitive).
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.index
            .values()
            .map(|&id| (id, &self.resources[id.0 as usize]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TextureObject;
    use crate::handle::{Mesh, Sound, Texture};
    use quarry_pak::PakWriter;

    fn write(dir: &Path, name: &str, bytes: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_extension_table() {
        let mut registry = ResourceRegistry::new();
        assert_eq!(registry.resource_type_for("a.PNG"), Some(ResourceType::Texture));
        assert_eq!(registry.resource_type_for("x.qmsh"), Some(ResourceType::Mesh));
        assert_eq!(registry.resource_type_for("song.ogg"), Some(ResourceType::Music));
        assert_eq!(registry.resource_type_for("readme.txt"), None);
        assert_eq!(registry.resource_type_for("noext"), None);
        assert_eq!(registry.resource_type_for("trailing."), None);

        registry.register_extension("KTX", ResourceType::Texture);
        assert_eq!(registry.resource_type_for("sky.ktx"), Some(ResourceType::Texture));
    }

    #[test]
    fn test_add_dir_skips_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.png", b"png");
        write(dir.path(), "notes.txt", b"text");
        write(dir.path(), "sub/b.wav", b"wav");

        let mut registry = ResourceRegistry::new();
        assert_eq!(registry.add_dir(dir.path(), true).unwrap(), 2);
        assert!(registry.find("notes.txt").is_none());

        let b = registry.get::<Sound>("B.WAV").unwrap();
        let resource = registry.resource(b);
        assert!(resource.is_file());
        assert_eq!(resource.filename(), "b.wav");
        assert_eq!(resource.state(), ResourceState::NotLoaded);
    }

    #[test]
    fn test_add_dir_non_recursive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.png", b"png");
        write(dir.path(), "sub/b.png", b"png");

        let mut registry = ResourceRegistry::new();
        assert_eq!(registry.add_dir(dir.path(), false).unwrap(), 1);
        assert!(registry.find("b.png").is_none());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ResourceRegistry::new();
        assert!(matches!(
            registry.add_dir(dir.path().join("missing"), true),
            Err(AssetError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_first_registration_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "loose/a.png", b"from dir");

        let pak_path = dir.path().join("data.pak");
        let mut writer = PakWriter::new();
        writer.add_bytes("A.png", b"from pak".to_vec());
        writer.add_bytes("b.png", b"only pak".to_vec());
        writer.write(&pak_path).unwrap();

        let mut registry = ResourceRegistry::new();
        registry.add_dir(dir.path().join("loose"), true).unwrap();
        assert_eq!(registry.add_pak(&pak_path, None).unwrap(), 1);

        let a = registry.get::<Texture>("a.png").unwrap();
        assert!(registry.resource(a).is_file());
        assert_eq!(registry.read_bytes(a.id()).unwrap(), b"from dir");

        let b = registry.get::<Texture>("b.png").unwrap();
        assert_eq!(registry.read_bytes(b.id()).unwrap(), b"only pak");
        assert_eq!(
            registry.display_path(b),
            format!("{}/b.png", pak_path.display())
        );
    }

    #[test]
    fn test_same_directory_twice_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.png", b"png");

        let mut registry = ResourceRegistry::new();
        assert_eq!(registry.add_dir(dir.path(), true).unwrap(), 1);
        assert_eq!(registry.add_dir(dir.path(), true).unwrap(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_failed_pak_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pak_path = dir.path().join("bad.pak");
        std::fs::write(&pak_path, b"NOTAPAK_________________").unwrap();

        let mut registry = ResourceRegistry::new();
        assert!(matches!(
            registry.add_pak(&pak_path, None),
            Err(AssetError::Pak { .. })
        ));
        assert!(registry.is_empty());
        assert_eq!(registry.pak_count(), 0);
    }

    #[test]
    fn test_lookup_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.png", b"png");

        let mut registry = ResourceRegistry::new();
        registry.add_dir(dir.path(), true).unwrap();

        assert!(registry.try_get::<Mesh>("a.png").is_none());
        assert!(registry.try_get::<Texture>("missing.png").is_none());
        assert!(matches!(
            registry.get::<Mesh>("a.png"),
            Err(AssetError::TypeMismatch {
                expected: ResourceType::Mesh,
                actual: ResourceType::Texture,
                ..
            })
        ));
        assert!(matches!(
            registry.get::<Texture>("missing.png"),
            Err(AssetError::NotFound { .. })
        ));
    }

    #[test]
    fn test_insert_loaded() {
        let mut registry = ResourceRegistry::new();
        let texture = TextureObject {
            id: 7,
            width: 1,
            height: 1,
        };
        let id = registry
            .insert_loaded("white.png", ResourceType::Texture, Payload::Texture(texture))
            .unwrap();
        assert!(registry.resource(id).is_loaded());
        assert_eq!(registry.resource(id).origin(), &ResourceOrigin::Memory);

        assert!(registry
            .insert_loaded("WHITE.png", ResourceType::Texture, Payload::Empty)
            .is_none());
    }

    #[test]
    fn test_iteration_is_ordered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "c.png", b"");
        write(dir.path(), "B.png", b"");
        write(dir.path(), "a.png", b"");

        let mut registry = ResourceRegistry::new();
        registry.add_dir(dir.path(), true).unwrap();
        let names: Vec<_> = registry.iter().map(|(_, r)| r.filename()).collect();
        assert_eq!(names, ["a.png", "B.png", "c.png"]);
    }
}

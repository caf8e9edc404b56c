//! Typed resource handles.
//!
//! Handles are lightweight, copyable references to registry records. Records are
//! never removed, so a handle stays valid for the lifetime of its registry.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::device::{FontObject, SoundObject, TextureObject};
use crate::mesh::{MeshData, RawGeometry};
use crate::resource::{Payload, ResourceId, ResourceType};

/// Marker trait tying a handle type to a [`ResourceType`] and its payload.
pub trait ResourceKind: 'static {
    /// The registered type this marker stands for.
    const TYPE: ResourceType;

    /// Decoded value exposed through handles of this kind.
    type Payload;

    /// Borrow the typed payload, if decoded.
    fn payload(payload: &Payload) -> Option<&Self::Payload>;

    /// Wrap a caller-built value for insertion.
    fn wrap(value: Self::Payload) -> Payload;
}

macro_rules! resource_kind {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $payload:ty, $pat:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name;

        impl ResourceKind for $name {
            const TYPE: ResourceType = ResourceType::$variant;
            type Payload = $payload;

            fn payload(payload: &Payload) -> Option<&Self::Payload> {
                match payload {
                    Payload::$pat(value) => Some(value),
                    _ => None,
                }
            }

            fn wrap(value: Self::Payload) -> Payload {
                Payload::$pat(value)
            }
        }
    };
}

resource_kind!(
    /// Images decoded by the render device.
    Texture, Texture, TextureObject, Texture
);
resource_kind!(
    /// QMSH meshes with device buffers.
    Mesh, Mesh, Box<MeshData>, Mesh
);
resource_kind!(
    /// Physics geometry without device objects.
    VertexData, VertexData, RawGeometry, VertexData
);
resource_kind!(
    /// Sound effects.
    Sound, Sound, SoundObject, Sound
);
resource_kind!(
    /// Streamed music tracks.
    Music, Music, SoundObject, Sound
);
resource_kind!(
    /// Fonts created by the render device.
    Font, Font, FontObject, Font
);

/// A typed handle to a registered resource.
///
/// # Example
///
/// ```ignore
/// let tex: Handle<Texture> = manager.load::<Texture>("grass.png")?;
/// if let Some(object) = manager.payload(tex) {
///     // bind object...
/// }
/// ```
pub struct Handle<T: ResourceKind> {
    id: ResourceId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ResourceKind> Handle<T> {
    pub(crate) fn new(id: ResourceId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Registry index of the resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl<T: ResourceKind> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("type", &T::TYPE)
            .field("index", &self.id.index())
            .finish()
    }
}

impl<T: ResourceKind> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ResourceKind> Copy for Handle<T> {}

impl<T: ResourceKind> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: ResourceKind> Eq for Handle<T> {}

impl<T: ResourceKind> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ResourceKind> From<Handle<T>> for ResourceId {
    fn from(handle: Handle<T>) -> Self {
        handle.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_copy_and_compare_by_id() {
        let a: Handle<Texture> = Handle::new(ResourceId(3));
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, Handle::new(ResourceId(4)));
        assert_eq!(ResourceId::from(a).index(), 3);
    }

    #[test]
    fn test_music_and_sound_share_payload() {
        let payload = Payload::Sound(SoundObject {
            id: 1,
            streamed: true,
        });
        assert!(Music::payload(&payload).is_some());
        assert!(Sound::payload(&payload).is_some());
        assert!(Texture::payload(&payload).is_none());
        assert_eq!(Music::TYPE, ResourceType::Music);
    }
}

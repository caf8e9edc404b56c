//! Device collaborators that turn resource bytes into usable objects.
//!
//! The resource system never decodes pixels or samples itself. Loaders hand
//! raw bytes to these traits and store the opaque objects they return.
//! Both traits take `&self`; implementations use interior mutability.

use std::fmt;

/// Error reported by a device collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DeviceError {}

/// Device image created from an encoded image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureObject {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

/// Device vertex or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferObject {
    pub id: u64,
    /// Size in bytes.
    pub size: usize,
}

/// Audio handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundObject {
    pub id: u64,
    /// Music is streamed, sounds are fully decoded.
    pub streamed: bool,
}

/// Device font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontObject {
    pub id: u64,
}

/// Graphics collaborator.
pub trait RenderDevice {
    /// Decode an encoded image (PNG, DDS, ...).
    fn create_texture(&self, name: &str, bytes: &[u8]) -> Result<TextureObject, DeviceError>;

    /// Upload interleaved vertices of `stride` bytes each.
    fn create_vertex_buffer(&self, name: &str, bytes: &[u8], stride: u32) -> Result<BufferObject, DeviceError>;

    /// Upload a triangle list index buffer.
    fn create_index_buffer(&self, name: &str, indices: &[u16]) -> Result<BufferObject, DeviceError>;

    /// Create a font from a font file.
    fn create_font(&self, name: &str, bytes: &[u8]) -> Result<FontObject, DeviceError>;
}

/// Audio collaborator.
pub trait AudioDevice {
    /// Create a sound, or a streamed track when `streamed` is set.
    fn create_sound(&self, name: &str, bytes: &[u8], streamed: bool) -> Result<SoundObject, DeviceError>;
}

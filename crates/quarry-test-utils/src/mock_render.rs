//! Mock render device.

use parking_lot::Mutex;
use quarry_assets::{BufferObject, DeviceError, FontObject, RenderDevice, TextureObject};

/// Records a device call for verification in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    CreateTexture { name: String, width: u32, height: u32 },
    CreateVertexBuffer { name: String, size: usize, stride: u32 },
    CreateIndexBuffer { name: String, count: usize },
    CreateFont { name: String },
}

/// Mock implementation of [`RenderDevice`].
///
/// Textures are accepted when their bytes start with a known image signature.
/// PNG dimensions are read from the `IHDR` chunk; other formats report 1x1.
///
/// # Example
///
/// ```rust
/// use quarry_assets::RenderDevice;
/// use quarry_test_utils::{fixtures, MockRenderDevice};
///
/// let mock = MockRenderDevice::new();
/// let texture = mock.create_texture("grass.png", &fixtures::png(64, 32)).unwrap();
/// assert_eq!((texture.width, texture.height), (64, 32));
/// assert!(mock.create_texture("notes.txt", b"hello").is_err());
/// assert_eq!(mock.count_texture_creates(), 1);
/// ```
#[derive(Default)]
pub struct MockRenderDevice {
    /// Recorded successful calls
    calls: Mutex<Vec<RenderCall>>,
    /// Name suffixes that are rejected
    failing: Mutex<Vec<String>>,
    next_id: Mutex<u64>,
}

impl MockRenderDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every call whose resource name ends with `suffix`.
    pub fn fail_on(&self, suffix: &str) {
        self.failing.lock().push(suffix.to_string());
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateTexture { .. }))
    }

    /// Count vertex and index buffer creates.
    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                RenderCall::CreateVertexBuffer { .. } | RenderCall::CreateIndexBuffer { .. }
            )
        })
    }

    pub fn count_font_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateFont { .. }))
    }

    /// Count calls for one resource, matched by name suffix.
    pub fn count_for(&self, suffix: &str) -> usize {
        self.count(|call| call_name(call).ends_with(suffix))
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn count(&self, filter: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| filter(*call)).count()
    }

    fn check(&self, name: &str) -> Result<u64, DeviceError> {
        if self.failing.lock().iter().any(|suffix| name.ends_with(suffix.as_str())) {
            return Err(DeviceError::new("forced failure"));
        }
        let mut id = self.next_id.lock();
        *id += 1;
        Ok(*id)
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().push(call);
    }
}

fn call_name(call: &RenderCall) -> &str {
    match call {
        RenderCall::CreateTexture { name, .. }
        | RenderCall::CreateVertexBuffer { name, .. }
        | RenderCall::CreateIndexBuffer { name, .. }
        | RenderCall::CreateFont { name } => name,
    }
}

fn image_size(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.starts_with(b"\x89PNG") {
        let be = |at: usize| {
            bytes
                .get(at..at + 4)
                .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        };
        return Some((be(16).unwrap_or(1), be(20).unwrap_or(1)));
    }
    let known: [&[u8]; 5] = [b"DDS ", b"BM", b"\xff\xd8", b"#?RADIANCE", b"P6"];
    known.iter().any(|magic| bytes.starts_with(magic)).then_some((1, 1))
}

impl RenderDevice for MockRenderDevice {
    fn create_texture(&self, name: &str, bytes: &[u8]) -> Result<TextureObject, DeviceError> {
        let (width, height) = image_size(bytes).ok_or_else(|| DeviceError::new("unrecognised image format"))?;
        let id = self.check(name)?;
        self.record(RenderCall::CreateTexture {
            name: name.to_string(),
            width,
            height,
        });
        Ok(TextureObject { id, width, height })
    }

    fn create_vertex_buffer(&self, name: &str, bytes: &[u8], stride: u32) -> Result<BufferObject, DeviceError> {
        if stride == 0 || bytes.len() % stride as usize != 0 {
            return Err(DeviceError::new("vertex buffer size is not a multiple of the stride"));
        }
        let id = self.check(name)?;
        self.record(RenderCall::CreateVertexBuffer {
            name: name.to_string(),
            size: bytes.len(),
            stride,
        });
        Ok(BufferObject { id, size: bytes.len() })
    }

    fn create_index_buffer(&self, name: &str, indices: &[u16]) -> Result<BufferObject, DeviceError> {
        let id = self.check(name)?;
        self.record(RenderCall::CreateIndexBuffer {
            name: name.to_string(),
            count: indices.len(),
        });
        Ok(BufferObject {
            id,
            size: indices.len() * 2,
        })
    }

    fn create_font(&self, name: &str, bytes: &[u8]) -> Result<FontObject, DeviceError> {
        let known: [&[u8]; 3] = [b"\x00\x01\x00\x00", b"OTTO", b"true"];
        if !known.iter().any(|magic| bytes.starts_with(magic)) {
            return Err(DeviceError::new("unrecognised font format"));
        }
        let id = self.check(name)?;
        self.record(RenderCall::CreateFont { name: name.to_string() });
        Ok(FontObject { id })
    }
}

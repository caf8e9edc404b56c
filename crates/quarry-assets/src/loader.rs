//! Per-type decoding of resource bytes.

use std::sync::Arc;

use quarry_core::profiling::profile_function;

use crate::device::{AudioDevice, DeviceError, RenderDevice};
use crate::error::{AssetError, AssetResult};
use crate::mesh;
use crate::registry::ResourceRegistry;
use crate::resource::{Payload, ResourceId, ResourceState, ResourceType};

/// Device collaborators shared by all loaders.
#[derive(Clone)]
pub struct Devices {
    pub render: Arc<dyn RenderDevice>,
    pub audio: Arc<dyn AudioDevice>,
}

/// Context provided to a type loader.
struct LoadContext<'a> {
    /// Display path of the resource.
    path: &'a str,
    /// Raw bytes of the resource.
    bytes: &'a [u8],
    /// Payload left by an earlier partial decode.
    prior: &'a Payload,
    devices: &'a Devices,
}

impl LoadContext<'_> {
    fn decode_error(&self, message: String) -> AssetError {
        AssetError::Decode {
            path: self.path.to_string(),
            message,
        }
    }

    fn device_error(&self, err: DeviceError) -> AssetError {
        AssetError::Device {
            path: self.path.to_string(),
            message: err.message,
        }
    }
}

fn decode(kind: ResourceType, ctx: LoadContext<'_>) -> AssetResult<Payload> {
    let render = &ctx.devices.render;
    match kind {
        ResourceType::Texture => render
            .create_texture(ctx.path, ctx.bytes)
            .map(Payload::Texture)
            .map_err(|e| ctx.device_error(e)),
        ResourceType::Mesh => {
            let prior = match ctx.prior {
                Payload::Mesh(mesh) if mesh.is_metadata_only() => Some(&**mesh),
                _ => None,
            };
            let (mut mesh, buffers) =
                mesh::decode_mesh(ctx.bytes, prior).map_err(|e| ctx.decode_error(e))?;
            let vb = render
                .create_vertex_buffer(ctx.path, buffers.vertices, mesh.vertex_size)
                .map_err(|e| ctx.device_error(e))?;
            let ib = render
                .create_index_buffer(ctx.path, &buffers.indices)
                .map_err(|e| ctx.device_error(e))?;
            mesh.vertex_buffer = Some(vb);
            mesh.index_buffer = Some(ib);
            Ok(Payload::Mesh(Box::new(mesh)))
        }
        ResourceType::VertexData => mesh::decode_vertex_data(ctx.bytes)
            .map(Payload::VertexData)
            .map_err(|e| ctx.decode_error(e)),
        ResourceType::Sound | ResourceType::Music => ctx
            .devices
            .audio
            .create_sound(ctx.path, ctx.bytes, kind == ResourceType::Music)
            .map(Payload::Sound)
            .map_err(|e| ctx.device_error(e)),
        ResourceType::Font => render
            .create_font(ctx.path, ctx.bytes)
            .map(Payload::Font)
            .map_err(|e| ctx.device_error(e)),
    }
}

/// Read and decode a resource, marking it `Loaded`.
///
/// On failure the resource is left `NotLoaded` and any partial payload is kept.
pub(crate) fn load_resource(registry: &mut ResourceRegistry, devices: &Devices, id: ResourceId) -> AssetResult<()> {
    profile_function!();
    let result = read_and_decode(registry, devices, id);
    let resource = registry.resource_mut(id);
    match result {
        Ok(payload) => {
            resource.payload = payload;
            resource.state = ResourceState::Loaded;
            Ok(())
        }
        Err(err) => {
            resource.state = ResourceState::NotLoaded;
            Err(err)
        }
    }
}

fn read_and_decode(registry: &mut ResourceRegistry, devices: &Devices, id: ResourceId) -> AssetResult<Payload> {
    let bytes = registry.read_bytes(id)?;
    let path = registry.display_path(id);
    let resource = registry.resource(id);
    decode(
        resource.kind(),
        LoadContext {
            path: &path,
            bytes: &bytes,
            prior: resource.payload(),
            devices,
        },
    )
}

/// Decode only the header and attachment points of a mesh.
///
/// Does nothing if the mesh is loaded or its metadata is already present.
pub(crate) fn load_mesh_metadata(registry: &mut ResourceRegistry, id: ResourceId) -> AssetResult<()> {
    profile_function!();
    if !matches!(registry.resource(id).payload(), Payload::Empty) {
        return Ok(());
    }

    let bytes = registry.read_bytes(id)?;
    let metadata = mesh::decode_metadata(&bytes).map_err(|message| AssetError::Decode {
        path: registry.display_path(id),
        message,
    })?;
    registry.resource_mut(id).payload = Payload::Mesh(Box::new(metadata));
    Ok(())
}

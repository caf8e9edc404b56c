//! QMSH mesh files.
//!
//! All values are little-endian. Layout:
//!
//! ```text
//! header (88 bytes)
//!   format "QMSH", version u8, flags u8,
//!   n_verts, n_tris, n_subs, n_bones, n_anims, n_points, n_groups: u16,
//!   radius f32, bbox 6 x f32, points_offset u32, cam_pos/target/up 9 x f32
//! vertices      n_verts x vertex_size(flags)
//! indices       n_tris x 3 x u16
//! submeshes     n_subs x { first, tris, min_ind, n_ind: u16, name }
//! if ANIMATED and not STATIC:
//!   bones       n_bones x { parent u16, 4x3 f32, name }
//!   groups      n_groups x { name, parent u16, count u8, count x bone u8 }
//!   animations  n_anims x { name, length f32, n_frames u16,
//!                           n_frames x { time f32, n_bones x { pos 3f, rot 4f, scale 3f } } }
//! points        at points_offset: n_points x { name, 4x4 f32, bone u16, type u16, size 3f, rot 3f }
//! splits        if SPLIT: n_subs x { pos 3f, radius f32, bbox 6f }
//! ```
//!
//! Strings are a u8 length followed by UTF-8 bytes. Bone ids start at 1; a
//! parent of 0 is the root.
//!
//! Vertex data files (`.phy`) share the header but must be version 20 with
//! flags exactly `PHYSICS`, followed by `n_verts` positions and `n_tris` faces.

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3, Vec4};

use crate::device::BufferObject;

/// File signature.
pub const SIGNATURE: [u8; 4] = *b"QMSH";

/// Header length in bytes.
pub const HEADER_SIZE: usize = 88;

/// Maximum number of bones per mesh.
pub const MAX_BONES: u16 = 64;

/// Oldest version recognised at all.
pub const MIN_VERSION: u8 = 12;

/// Oldest version that can be decoded.
pub const MIN_SUPPORTED_VERSION: u8 = 20;

/// Newest version.
pub const MAX_VERSION: u8 = 22;

/// The only version accepted for vertex data files.
pub const VERTEX_DATA_VERSION: u8 = 20;

const KEYFRAME_BONE_SIZE: usize = 40;

// matrix + bone + type + size + rot
const POINT_FIXED_SIZE: usize = 64 + 2 + 2 + 12 + 12;

bitflags! {
    /// Header flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshFlags: u8 {
        const TANGENTS = 0x01;
        const ANIMATED = 0x02;
        const STATIC = 0x04;
        const PHYSICS = 0x08;
        const SPLIT = 0x10;
    }
}

impl MeshFlags {
    /// Whether the file carries bones, groups and animations.
    pub fn is_skinned(self) -> bool {
        self.contains(MeshFlags::ANIMATED) && !self.contains(MeshFlags::STATIC)
    }
}

/// Bytes per vertex for the given flags.
pub fn vertex_size(flags: MeshFlags) -> u32 {
    if flags.contains(MeshFlags::PHYSICS) {
        return 12;
    }
    // position + normal + uv
    let mut size = 32;
    if flags.contains(MeshFlags::TANGENTS) {
        size += 24;
    }
    if flags.contains(MeshFlags::ANIMATED) {
        size += 8;
    }
    size
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Decoded file header.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHeader {
    pub version: u8,
    pub flags: MeshFlags,
    pub n_verts: u16,
    pub n_tris: u16,
    pub n_subs: u16,
    pub n_bones: u16,
    pub n_anims: u16,
    pub n_points: u16,
    pub n_groups: u16,
    pub radius: f32,
    pub bbox: Aabb,
    pub points_offset: u32,
    pub cam_pos: Vec3,
    pub cam_target: Vec3,
    pub cam_up: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    pub first: u16,
    pub tris: u16,
    pub min_ind: u16,
    pub n_ind: u16,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// 1-based id.
    pub id: u16,
    /// Parent bone id, 0 for the root.
    pub parent: u16,
    pub transform: Mat4,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeBone {
    pub pos: Vec3,
    pub rot: Quat,
    pub scale: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub bones: Vec<KeyframeBone>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    pub length: f32,
    pub frames: Vec<Keyframe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneGroup {
    pub name: String,
    pub parent: u16,
    pub bones: Vec<u8>,
}

/// Named attachment point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub transform: Mat4,
    pub bone: u16,
    pub kind: u16,
    pub size: Vec3,
    pub rot: Vec3,
}

/// Per-submesh culling volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub pos: Vec3,
    pub radius: f32,
    pub bbox: Aabb,
}

/// A decoded mesh.
///
/// After a metadata-only decode only `header` and `points` are filled and the
/// buffers are `None`. A full decode reuses both.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub header: MeshHeader,
    pub vertex_size: u32,
    pub submeshes: Vec<Submesh>,
    pub bones: Vec<Bone>,
    pub groups: Vec<BoneGroup>,
    pub animations: Vec<Animation>,
    pub points: Vec<Point>,
    pub splits: Vec<Split>,
    pub vertex_buffer: Option<BufferObject>,
    pub index_buffer: Option<BufferObject>,
}

impl MeshData {
    /// Whether device buffers are still missing.
    pub fn is_metadata_only(&self) -> bool {
        self.vertex_buffer.is_none()
    }

    /// First point whose name starts with `prefix`.
    pub fn find_point(&self, prefix: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.name.starts_with(prefix))
    }

    pub fn find_animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name == name)
    }
}

/// Geometry for collision, decoded from `.phy` files.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGeometry {
    pub radius: f32,
    pub verts: Vec<Vec3>,
    pub faces: Vec<[u16; 3]>,
}

/// Buffers of a full decode, handed to the render device by the loader.
pub(crate) struct MeshBuffers<'a> {
    pub vertices: &'a [u8],
    pub indices: Vec<u16>,
}

type DecodeResult<T> = Result<T, String>;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn seek(&mut self, pos: usize, what: &str) -> DecodeResult<()> {
        if pos > self.bytes.len() {
            return Err(format!("Failed to read {}.", what));
        }
        self.pos = pos;
        Ok(())
    }

    fn ensure(&self, len: usize, what: &str) -> DecodeResult<()> {
        if self.bytes.len() - self.pos < len {
            return Err(format!("Failed to read {}.", what));
        }
        Ok(())
    }

    fn take(&mut self, len: usize, what: &str) -> DecodeResult<&'a [u8]> {
        self.ensure(len, what)?;
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> DecodeResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> DecodeResult<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> DecodeResult<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self, what: &str) -> DecodeResult<f32> {
        Ok(f32::from_bits(self.u32(what)?))
    }

    fn floats<const N: usize>(&mut self, what: &str) -> DecodeResult<[f32; N]> {
        let mut out = [0.0; N];
        for value in &mut out {
            *value = self.f32(what)?;
        }
        Ok(out)
    }

    fn vec3(&mut self, what: &str) -> DecodeResult<Vec3> {
        Ok(Vec3::from_array(self.floats::<3>(what)?))
    }

    fn aabb(&mut self, what: &str) -> DecodeResult<Aabb> {
        Ok(Aabb {
            min: self.vec3(what)?,
            max: self.vec3(what)?,
        })
    }

    fn string(&mut self, what: &str) -> DecodeResult<String> {
        let len = self.u8(what)? as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| format!("Invalid string in {}.", what))
    }
}

/// Read and validate the header.
pub fn read_header(bytes: &[u8]) -> Result<MeshHeader, String> {
    let mut c = Cursor::new(bytes);
    let what = "file header";
    c.ensure(HEADER_SIZE, what)?;

    let format = c.take(4, what)?;
    if format != SIGNATURE {
        return Err(format!(
            "Invalid file signature '{}'.",
            String::from_utf8_lossy(format)
        ));
    }
    let version = c.u8(what)?;
    let flags = MeshFlags::from_bits_retain(c.u8(what)?);
    let header = MeshHeader {
        version,
        flags,
        n_verts: c.u16(what)?,
        n_tris: c.u16(what)?,
        n_subs: c.u16(what)?,
        n_bones: c.u16(what)?,
        n_anims: c.u16(what)?,
        n_points: c.u16(what)?,
        n_groups: c.u16(what)?,
        radius: c.f32(what)?,
        bbox: c.aabb(what)?,
        points_offset: c.u32(what)?,
        cam_pos: c.vec3(what)?,
        cam_target: c.vec3(what)?,
        cam_up: c.vec3(what)?,
    };
    debug_assert_eq!(c.pos, HEADER_SIZE);
    Ok(header)
}

fn validate_mesh_header(header: &MeshHeader) -> DecodeResult<()> {
    if !(MIN_VERSION..=MAX_VERSION).contains(&header.version) {
        return Err(format!("Invalid file version '{}'.", header.version));
    }
    if header.version < MIN_SUPPORTED_VERSION {
        return Err(format!("Unsupported file version '{}'.", header.version));
    }
    if header.n_bones > MAX_BONES {
        return Err(format!("Too many bones ({}).", header.n_bones));
    }
    if header.n_subs == 0 {
        return Err("Missing model mesh!".to_string());
    }
    if header.flags.is_skinned() {
        if header.n_bones == 0 {
            return Err("No bones.".to_string());
        }
        if header.n_groups == 0 {
            return Err("No bone groups.".to_string());
        }
    }
    Ok(())
}

fn read_points(c: &mut Cursor<'_>, header: &MeshHeader) -> DecodeResult<Vec<Point>> {
    c.seek(header.points_offset as usize, "points")?;
    c.ensure((1 + POINT_FIXED_SIZE) * header.n_points as usize, "points")?;

    let mut points = Vec::with_capacity(header.n_points as usize);
    for _ in 0..header.n_points {
        points.push(Point {
            name: c.string("points")?,
            transform: Mat4::from_cols_array(&c.floats::<16>("points")?),
            bone: c.u16("points")?,
            kind: c.u16("points")?,
            size: c.vec3("points")?,
            rot: c.vec3("points")?,
        });
    }
    Ok(points)
}

/// Decode the header and attachment points only.
pub fn decode_metadata(bytes: &[u8]) -> Result<MeshData, String> {
    let header = read_header(bytes)?;
    validate_mesh_header(&header)?;

    let mut c = Cursor::new(bytes);
    let points = read_points(&mut c, &header)?;
    Ok(MeshData {
        vertex_size: vertex_size(header.flags),
        header,
        submeshes: Vec::new(),
        bones: Vec::new(),
        groups: Vec::new(),
        animations: Vec::new(),
        points,
        splits: Vec::new(),
        vertex_buffer: None,
        index_buffer: None,
    })
}

/// Decode a whole mesh, reusing the header and points of a prior metadata decode.
pub(crate) fn decode_mesh<'a>(
    bytes: &'a [u8],
    prior: Option<&MeshData>,
) -> Result<(MeshData, MeshBuffers<'a>), String> {
    let mut c = Cursor::new(bytes);
    let (header, points) = match prior {
        Some(prior) => (prior.header.clone(), Some(prior.points.clone())),
        None => {
            let header = read_header(bytes)?;
            validate_mesh_header(&header)?;
            (header, None)
        }
    };
    c.seek(HEADER_SIZE, "file header")?;

    let vertex_size = vertex_size(header.flags);
    let vertices = c.take(vertex_size as usize * header.n_verts as usize, "vertex buffer")?;
    let indices = c
        .take(header.n_tris as usize * 6, "index buffer")?
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();

    c.ensure(9 * header.n_subs as usize, "submesh data")?;
    let mut submeshes = Vec::with_capacity(header.n_subs as usize);
    for i in 0..header.n_subs {
        let what = format!("submesh {}", i);
        submeshes.push(Submesh {
            first: c.u16(&what)?,
            tris: c.u16(&what)?,
            min_ind: c.u16(&what)?,
            n_ind: c.u16(&what)?,
            name: c.string(&what)?,
        });
    }

    let mut bones = Vec::new();
    let mut groups = Vec::new();
    let mut animations = Vec::new();
    if header.flags.is_skinned() {
        bones = read_bones(&mut c, &header)?;
        groups = read_groups(&mut c, &header)?;
        animations = read_animations(&mut c, &header)?;
    }

    let points = match points {
        Some(points) => points,
        None => read_points(&mut c, &header)?,
    };

    let mut splits = Vec::new();
    if header.flags.contains(MeshFlags::SPLIT) {
        c.seek(points_end(&header, &points), "mesh splits")?;
        c.ensure(40 * header.n_subs as usize, "mesh splits")?;
        for _ in 0..header.n_subs {
            splits.push(Split {
                pos: c.vec3("mesh splits")?,
                radius: c.f32("mesh splits")?,
                bbox: c.aabb("mesh splits")?,
            });
        }
    }

    let mesh = MeshData {
        vertex_size,
        header,
        submeshes,
        bones,
        groups,
        animations,
        points,
        splits,
        vertex_buffer: None,
        index_buffer: None,
    };
    Ok((mesh, MeshBuffers { vertices, indices }))
}

fn points_end(header: &MeshHeader, points: &[Point]) -> usize {
    header.points_offset as usize
        + points
            .iter()
            .map(|p| 1 + p.name.len() + POINT_FIXED_SIZE)
            .sum::<usize>()
}

fn read_bones(c: &mut Cursor<'_>, header: &MeshHeader) -> DecodeResult<Vec<Bone>> {
    // parent + matrix + name length
    c.ensure((2 + 48 + 1) * header.n_bones as usize, "bones")?;
    let mut bones = Vec::with_capacity(header.n_bones as usize);
    for id in 1..=header.n_bones {
        let parent = c.u16("bones data")?;
        let rows = c.floats::<12>("bones data")?;
        let name = c.string("bones data")?;
        if parent >= id {
            return Err(format!("Invalid parent {} of bone {}.", parent, id));
        }
        let row = |r: usize| Vec4::new(rows[r * 3], rows[r * 3 + 1], rows[r * 3 + 2], 0.0);
        bones.push(Bone {
            id,
            parent,
            transform: Mat4::from_cols(row(0), row(1), row(2), row(3) + Vec4::W),
            name,
        });
    }
    Ok(bones)
}

fn read_groups(c: &mut Cursor<'_>, header: &MeshHeader) -> DecodeResult<Vec<BoneGroup>> {
    c.ensure((1 + 2 + 1) * header.n_groups as usize, "bone groups")?;
    let mut groups = Vec::with_capacity(header.n_groups as usize);
    for i in 0..header.n_groups {
        let name = c.string("bone groups data")?;
        let parent = c.u16("bone groups data")?;
        if parent >= header.n_groups || (parent == i && i != 0) {
            return Err(format!("Invalid parent {} of bone group {}.", parent, i));
        }
        let count = c.u8("bone groups data")? as usize;
        let bones = c.take(count, "bone groups data")?.to_vec();
        if let Some(&bone) = bones.iter().find(|&&b| b == 0 || b as u16 > header.n_bones) {
            return Err(format!("Invalid bone {} in bone group {}.", bone, i));
        }
        groups.push(BoneGroup {
            name,
            parent,
            bones,
        });
    }
    Ok(groups)
}

fn read_animations(c: &mut Cursor<'_>, header: &MeshHeader) -> DecodeResult<Vec<Animation>> {
    // name length + length + frame count
    c.ensure((1 + 4 + 2) * header.n_anims as usize, "animations")?;
    let mut animations = Vec::with_capacity(header.n_anims as usize);
    for i in 0..header.n_anims {
        let what = format!("animation {} data", i);
        let name = c.string(&what)?;
        let length = c.f32(&what)?;
        let n_frames = c.u16(&what)? as usize;
        c.ensure(n_frames * (4 + KEYFRAME_BONE_SIZE * header.n_bones as usize), &what)?;

        let mut frames = Vec::with_capacity(n_frames);
        for _ in 0..n_frames {
            let time = c.f32(&what)?;
            let mut bones = Vec::with_capacity(header.n_bones as usize);
            for _ in 0..header.n_bones {
                bones.push(KeyframeBone {
                    pos: c.vec3(&what)?,
                    rot: Quat::from_array(c.floats::<4>(&what)?),
                    scale: c.vec3(&what)?,
                });
            }
            frames.push(Keyframe { time, bones });
        }
        animations.push(Animation {
            name,
            length,
            frames,
        });
    }
    Ok(animations)
}

/// Decode a `.phy` vertex data file.
pub fn decode_vertex_data(bytes: &[u8]) -> Result<RawGeometry, String> {
    let header = read_header(bytes)?;
    if header.version != VERTEX_DATA_VERSION {
        return Err(format!("Invalid file version '{}'.", header.version));
    }
    if header.flags != MeshFlags::PHYSICS {
        return Err(format!("Invalid mesh flags '{}'.", header.flags.bits()));
    }

    let mut c = Cursor::new(bytes);
    c.seek(HEADER_SIZE, "file header")?;
    let verts = c.take(12 * header.n_verts as usize, "vertex data")?;
    let faces = c.take(6 * header.n_tris as usize, "triangle data")?;

    Ok(RawGeometry {
        radius: header.radius,
        verts: bytemuck::pod_collect_to_vec(verts),
        faces: bytemuck::pod_collect_to_vec(faces),
    })
}

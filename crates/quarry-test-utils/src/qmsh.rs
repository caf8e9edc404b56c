//! Builders for QMSH mesh and `.phy` vertex data files.

use glam::Vec3;
use quarry_assets::MeshFlags;
use quarry_assets::mesh::{HEADER_SIZE, MAX_VERSION, SIGNATURE, VERTEX_DATA_VERSION, vertex_size};

struct Bone {
    parent: u16,
    name: String,
}

struct Group {
    name: String,
    parent: u16,
    bones: Vec<u8>,
}

struct Animation {
    name: String,
    length: f32,
    frames: usize,
}

struct Point {
    name: String,
    bone: u16,
    kind: u16,
    pos: Vec3,
}

/// Synthesises a QMSH file.
///
/// Vertices are zero-filled at the size the flags call for. Bones get identity
/// transforms and keyframes are identity poses.
///
/// # Example
///
/// ```rust
/// use quarry_test_utils::QmshBuilder;
///
/// let bytes = QmshBuilder::new()
///     .triangles(2)
///     .submesh("body")
///     .point("hat", 0)
///     .build();
/// let mesh = quarry_assets::mesh::decode_metadata(&bytes).unwrap();
/// assert!(mesh.find_point("ha").is_some());
/// ```
pub struct QmshBuilder {
    version: u8,
    flags: MeshFlags,
    radius: f32,
    n_verts: u16,
    indices: Vec<u16>,
    submeshes: Vec<String>,
    bones: Vec<Bone>,
    groups: Vec<Group>,
    animations: Vec<Animation>,
    points: Vec<Point>,
    n_bones_override: Option<u16>,
}

impl Default for QmshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QmshBuilder {
    pub fn new() -> Self {
        Self {
            version: MAX_VERSION,
            flags: MeshFlags::empty(),
            radius: 1.0,
            n_verts: 0,
            indices: Vec::new(),
            submeshes: Vec::new(),
            bones: Vec::new(),
            groups: Vec::new(),
            animations: Vec::new(),
            points: Vec::new(),
            n_bones_override: None,
        }
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn flags(mut self, flags: MeshFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Add `count` separate triangles with three fresh vertices each.
    pub fn triangles(mut self, count: u16) -> Self {
        for _ in 0..count {
            let base = self.n_verts;
            self.indices.extend([base, base + 1, base + 2]);
            self.n_verts += 3;
        }
        self
    }

    /// Add a submesh covering every triangle.
    pub fn submesh(mut self, name: &str) -> Self {
        self.submeshes.push(name.to_string());
        self
    }

    /// Add a bone. Ids are assigned from 1 in insertion order.
    pub fn bone(mut self, parent: u16, name: &str) -> Self {
        self.bones.push(Bone {
            parent,
            name: name.to_string(),
        });
        self
    }

    pub fn group(mut self, name: &str, parent: u16, bones: &[u8]) -> Self {
        self.groups.push(Group {
            name: name.to_string(),
            parent,
            bones: bones.to_vec(),
        });
        self
    }

    pub fn animation(mut self, name: &str, length: f32, frames: usize) -> Self {
        self.animations.push(Animation {
            name: name.to_string(),
            length,
            frames,
        });
        self
    }

    /// Add an attachment point bound to `bone`.
    pub fn point(self, name: &str, bone: u16) -> Self {
        self.point_at(name, bone, Vec3::ZERO)
    }

    /// Add an attachment point translated to `pos`.
    pub fn point_at(mut self, name: &str, bone: u16, pos: Vec3) -> Self {
        self.points.push(Point {
            name: name.to_string(),
            bone,
            kind: 0,
            pos,
        });
        self
    }

    /// Write a bone count into the header that differs from the bones added.
    pub fn declared_bones(mut self, n_bones: u16) -> Self {
        self.n_bones_override = Some(n_bones);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let n_tris = (self.indices.len() / 3) as u16;
        let n_bones = self.n_bones_override.unwrap_or(self.bones.len() as u16);

        let mut body = Vec::new();
        body.resize(vertex_size(self.flags) as usize * self.n_verts as usize, 0);
        for index in &self.indices {
            body.extend_from_slice(&index.to_le_bytes());
        }
        for name in &self.submeshes {
            for value in [0, n_tris, 0, self.n_verts] {
                body.extend_from_slice(&value.to_le_bytes());
            }
            put_str(&mut body, name);
        }

        if self.flags.is_skinned() {
            for bone in &self.bones {
                body.extend_from_slice(&bone.parent.to_le_bytes());
                // 4x3 identity, row major
                for value in [1., 0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0.] {
                    put_f32(&mut body, value);
                }
                put_str(&mut body, &bone.name);
            }
            for group in &self.groups {
                put_str(&mut body, &group.name);
                body.extend_from_slice(&group.parent.to_le_bytes());
                body.push(group.bones.len() as u8);
                body.extend_from_slice(&group.bones);
            }
            for anim in &self.animations {
                put_str(&mut body, &anim.name);
                put_f32(&mut body, anim.length);
                body.extend_from_slice(&(anim.frames as u16).to_le_bytes());
                for frame in 0..anim.frames {
                    put_f32(&mut body, frame as f32 * anim.length / anim.frames.max(1) as f32);
                    for _ in 0..n_bones {
                        for value in [0., 0., 0., 0., 0., 0., 1., 1., 1., 1.] {
                            put_f32(&mut body, value);
                        }
                    }
                }
            }
        }

        let points_offset = (HEADER_SIZE + body.len()) as u32;
        for point in &self.points {
            put_str(&mut body, &point.name);
            let cols = glam::Mat4::from_translation(point.pos).to_cols_array();
            for value in cols {
                put_f32(&mut body, value);
            }
            body.extend_from_slice(&point.bone.to_le_bytes());
            body.extend_from_slice(&point.kind.to_le_bytes());
            for value in [1., 1., 1., 0., 0., 0.] {
                put_f32(&mut body, value);
            }
        }

        if self.flags.contains(MeshFlags::SPLIT) {
            for _ in &self.submeshes {
                for value in [0., 0., 0., self.radius, -1., -1., -1., 1., 1., 1.] {
                    put_f32(&mut body, value);
                }
            }
        }

        let counts = [
            self.n_verts,
            n_tris,
            self.submeshes.len() as u16,
            n_bones,
            self.animations.len() as u16,
            self.points.len() as u16,
            self.groups.len() as u16,
        ];
        let mut out = header(self.version, self.flags, counts, self.radius, points_offset);
        out.extend_from_slice(&body);
        out
    }
}

/// Build a `.phy` vertex data file.
pub fn vertex_data(radius: f32, verts: &[Vec3], faces: &[[u16; 3]]) -> Vec<u8> {
    let counts = [verts.len() as u16, faces.len() as u16, 0, 0, 0, 0, 0];
    let mut out = header(VERTEX_DATA_VERSION, MeshFlags::PHYSICS, counts, radius, 0);
    for vert in verts {
        for value in vert.to_array() {
            put_f32(&mut out, value);
        }
    }
    for face in faces.iter().flatten() {
        out.extend_from_slice(&face.to_le_bytes());
    }
    out
}

fn header(version: u8, flags: MeshFlags, counts: [u16; 7], radius: f32, points_offset: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE);
    out.extend_from_slice(&SIGNATURE);
    out.push(version);
    out.push(flags.bits());
    for count in counts {
        out.extend_from_slice(&count.to_le_bytes());
    }
    put_f32(&mut out, radius);
    for value in [-1., -1., -1., 1., 1., 1.] {
        put_f32(&mut out, value);
    }
    out.extend_from_slice(&points_offset.to_le_bytes());
    // camera position, target, up
    for value in [0., 0., 5., 0., 0., 0., 0., 1., 0.] {
        put_f32(&mut out, value);
    }
    out
}

fn put_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    out.push(value.len() as u8);
    out.extend_from_slice(value.as_bytes());
}

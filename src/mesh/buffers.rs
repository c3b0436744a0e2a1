// 网格缓冲区

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Vertex position, GPU-compatible.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Position3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Uv {
    pub u: f32,
    pub v: f32,
}

impl Uv {
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

/// Linear RGBA color, each component in `[0, 1]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const MAGENTA: Rgba = Rgba::new(1.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// Renderable geometry produced by one generation call.
///
/// The triangle list is shared: meshes with the same grid shape point at the
/// same cached index buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<Position3>,
    pub colors: Vec<Rgba>,
    pub uvs: Vec<Uv>,
    pub triangles: Arc<[u32]>,
}

impl Default for MeshBuffers {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            colors: Vec::new(),
            uvs: Vec::new(),
            triangles: Arc::from(Vec::<u32>::new()),
        }
    }
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw bytes of the position stream, ready for a vertex buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles[..])
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Position3, Position3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), p| {
            (
                Position3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Position3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }
}

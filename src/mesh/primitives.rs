//! Unit cube, box instances and mesh combining for obstacle geometry.

use std::sync::Arc;

use crate::error::{GenerationError, Result};
use crate::mesh::buffers::{MeshBuffers, Position3, Rgba, Uv};
use crate::mesh::triangle_cache::grid_triangles;
use crate::models::grid::GridSpec;
use crate::terrain::density::ObstacleCell;

type Vec3 = [f32; 3];

/// (outward normal, u axis) per cube face.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]),
];

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn corner(n: Vec3, t: Vec3, b: Vec3, st: f32, sb: f32) -> Position3 {
    Position3::new(
        0.5 * (n[0] + st * t[0] + sb * b[0]),
        0.5 * (n[1] + st * t[1] + sb * b[1]),
        0.5 * (n[2] + st * t[2] + sb * b[2]),
    )
}

/// Axis-aligned unit cube centred on the origin: 24 vertices (4 per face, so
/// each face gets its own UVs) and 36 indices, faces wound outward.
pub fn unit_cube() -> MeshBuffers {
    let mut vertices = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut triangles = Vec::with_capacity(36);

    for (n, t) in CUBE_FACES {
        // t x b == -n keeps (0, 1, 2) wound so its normal is n.
        let b = cross(t, n);
        let base = vertices.len() as u32;
        vertices.extend([
            corner(n, t, b, -1.0, -1.0),
            corner(n, t, b, -1.0, 1.0),
            corner(n, t, b, 1.0, 1.0),
            corner(n, t, b, 1.0, -1.0),
        ]);
        uvs.extend([
            Uv::new(0.0, 0.0),
            Uv::new(0.0, 1.0),
            Uv::new(1.0, 1.0),
            Uv::new(1.0, 0.0),
        ]);
        triangles.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshBuffers {
        colors: vec![Rgba::WHITE; vertices.len()],
        vertices,
        uvs,
        triangles: triangles.into(),
    }
}

/// One placed copy of the unit cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxInstance {
    pub center: Position3,
    pub scale: Position3,
    pub color: Rgba,
}

impl BoxInstance {
    /// Obstacle box for a solid cell: footprint 1x1, standing on y = 0.
    pub fn from_obstacle(cell: &ObstacleCell, color: Rgba) -> Self {
        let height = cell.height as f32;
        Self {
            center: Position3::new(cell.x as f32, height * 0.5, cell.y as f32),
            scale: Position3::new(1.0, height, 1.0),
            color,
        }
    }

    pub fn transform(&self, p: Position3) -> Position3 {
        Position3::new(
            self.center.x + p.x * self.scale.x,
            self.center.y + p.y * self.scale.y,
            self.center.z + p.z * self.scale.z,
        )
    }

    pub fn min(&self) -> Position3 {
        self.transform(Position3::new(-0.5, -0.5, -0.5))
    }

    pub fn max(&self) -> Position3 {
        self.transform(Position3::new(0.5, 0.5, 0.5))
    }
}

/// Bake every instance of `template` into a single mesh.
///
/// Fails with [`GenerationError::MeshTooLarge`] instead of truncating when
/// the result would not be addressable with 32-bit indices.
pub fn combine(template: &MeshBuffers, instances: &[BoxInstance]) -> Result<MeshBuffers> {
    let per_instance = template.vertex_count() as u64;
    let vertices = per_instance * instances.len() as u64;
    let limit = u64::from(u32::MAX);
    if vertices > limit {
        return Err(GenerationError::MeshTooLarge { vertices, limit });
    }

    let mut mesh = MeshBuffers {
        vertices: Vec::with_capacity(vertices as usize),
        colors: Vec::with_capacity(vertices as usize),
        uvs: Vec::with_capacity(vertices as usize),
        ..Default::default()
    };
    let mut triangles = Vec::with_capacity(template.triangles.len() * instances.len());

    for instance in instances {
        let base = mesh.vertices.len() as u32;
        mesh.vertices
            .extend(template.vertices.iter().map(|&p| instance.transform(p)));
        mesh.colors
            .extend(std::iter::repeat(instance.color).take(template.vertex_count()));
        mesh.uvs.extend_from_slice(&template.uvs);
        triangles.extend(template.triangles.iter().map(|&i| base + i));
    }

    mesh.triangles = Arc::from(triangles);
    Ok(mesh)
}

/// Flat quad under a density grid, covering every cell.
pub fn ground_plane(grid: &GridSpec) -> MeshBuffers {
    let (x0, z0) = (-0.5, -0.5);
    let x1 = grid.width as f32 - 0.5;
    let z1 = grid.height as f32 - 0.5;
    MeshBuffers {
        vertices: vec![
            Position3::new(x0, 0.0, z0),
            Position3::new(x1, 0.0, z0),
            Position3::new(x0, 0.0, z1),
            Position3::new(x1, 0.0, z1),
        ],
        colors: vec![Rgba::WHITE; 4],
        uvs: vec![
            Uv::new(0.0, 0.0),
            Uv::new(1.0, 0.0),
            Uv::new(0.0, 1.0),
            Uv::new(1.0, 1.0),
        ],
        triangles: grid_triangles(1, 1).into(),
    }
}

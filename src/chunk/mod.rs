//! 障碍物分块
//!
//! Groups solid cells of a density map into square chunks, each with its own
//! combined mesh and bounds, so the engine can attach one collider per chunk.
//!
//! ```text
//! DensityMap ──scan rows──▶ pending instances per chunk column
//!                                   │ band boundary
//!                                   ▼
//!                         combine ─▶ Chunk ─▶ ChunkSink
//! ```

mod partitioner;

#[cfg(test)]
mod tests;

pub use partitioner::ChunkPartitioner;

use std::ops::Range;

use crate::mesh::buffers::{MeshBuffers, Position3};
use crate::mesh::primitives::BoxInstance;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Position3,
    pub max: Position3,
}

impl Aabb {
    pub fn new(min: Position3, max: Position3) -> Self {
        Self { min, max }
    }

    pub fn of_box(instance: &BoxInstance) -> Self {
        Self::new(instance.min(), instance.max())
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            Position3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Position3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Half-open on the max side, so neighbouring boxes never both claim a point.
    pub fn contains(&self, p: Position3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }
}

/// A finalized group of obstacle cells.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `(column, row)` of the chunk in chunk units.
    pub index: (u32, u32),
    /// Cell columns covered by the chunk.
    pub cells_x: Range<u32>,
    /// Cell rows covered by the chunk.
    pub cells_y: Range<u32>,
    /// One box per solid cell, in scan order.
    pub instances: Vec<BoxInstance>,
    /// All boxes baked into one mesh, also usable as a mesh collider.
    pub mesh: MeshBuffers,
    pub bounds: Aabb,
}

impl Chunk {
    pub fn cell_count(&self) -> usize {
        self.instances.len()
    }

    pub fn covers_cell(&self, x: u32, y: u32) -> bool {
        self.cells_x.contains(&x) && self.cells_y.contains(&y)
    }

    /// Collision query: is `p` inside any of this chunk's boxes?
    pub fn contains_point(&self, p: Position3) -> bool {
        self.bounds.contains(p)
            && self
                .instances
                .iter()
                .any(|instance| Aabb::of_box(instance).contains(p))
    }
}

/// Receives chunks as they are finalized.
pub trait ChunkSink {
    fn accept(&mut self, chunk: Chunk);
}

impl ChunkSink for Vec<Chunk> {
    fn accept(&mut self, chunk: Chunk) {
        self.push(chunk);
    }
}

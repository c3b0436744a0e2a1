// 网格构建

pub mod assembler;
pub mod buffers;
pub mod primitives;
pub mod triangle_cache;

pub use assembler::{MeshAssembler, TopologyChange};
pub use buffers::{MeshBuffers, Position3, Rgba, Uv};
pub use primitives::{combine, ground_plane, unit_cube, BoxInstance};
pub use triangle_cache::TriangleCache;

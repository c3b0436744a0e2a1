#![warn(clippy::all, rust_2018_idioms)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod generator;
pub mod mesh;
pub mod models;
pub mod terrain;

pub use chunk::{Aabb, Chunk, ChunkPartitioner, ChunkSink};
pub use config::GeneratorConfig;
pub use error::{GenerationError, Result};
pub use generator::TerrainGenerator;
pub use mesh::{MeshBuffers, TopologyChange};
pub use models::grid::GridSpec;
pub use terrain::{CancellationToken, DensityParameters, DensitySampler, NoiseParameters};

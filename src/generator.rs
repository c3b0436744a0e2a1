//! Request/response entry points: callers hand in a grid and parameters and
//! get finished buffers back, on whatever schedule they like.

use std::sync::Arc;
use std::time::Instant;

use crate::chunk::{Chunk, ChunkPartitioner, ChunkSink};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::mesh::assembler::{MeshAssembler, TopologyChange};
use crate::mesh::buffers::MeshBuffers;
use crate::mesh::primitives::ground_plane;
use crate::mesh::triangle_cache::TriangleCache;
use crate::models::grid::GridSpec;
use crate::terrain::color_map::HeightColorMap;
use crate::terrain::density::{DensityParameters, DensitySampler};
use crate::terrain::gradient::GradientNoise;
use crate::terrain::height_field::{CancellationToken, HeightField, HeightFieldEvaluator};
use crate::terrain::noise::NoiseParameters;
use crate::terrain::permutation::PermutationTable;

/// Owns the state shared across generation calls: the permutation table and
/// the triangle cache. Cheap to share behind `&`; every call owns its output.
#[derive(Debug)]
pub struct TerrainGenerator {
    noise: GradientNoise,
    assembler: MeshAssembler,
    obstacle_colors: HeightColorMap,
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::new(Arc::new(PermutationTable::perlin()), Arc::new(TriangleCache::new()))
    }
}

impl TerrainGenerator {
    pub fn new(table: Arc<PermutationTable>, cache: Arc<TriangleCache>) -> Self {
        Self {
            noise: GradientNoise::new(table),
            assembler: MeshAssembler::new(cache, HeightColorMap::default()),
            obstacle_colors: HeightColorMap::grayscale(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let mut generator = Self::default();
        generator.set_color_map(config.palette.build());
        Ok(generator)
    }

    pub fn with_obstacle_colors(mut self, colors: HeightColorMap) -> Self {
        self.obstacle_colors = colors;
        self
    }

    pub fn set_color_map(&mut self, color_map: HeightColorMap) {
        self.assembler.set_color_map(color_map);
    }

    pub fn cache(&self) -> &Arc<TriangleCache> {
        self.assembler.cache()
    }

    pub fn permutation(&self) -> &Arc<PermutationTable> {
        self.noise.table()
    }

    /// Evaluate the height field alone, without building a mesh.
    pub fn height_field(&self, grid: &GridSpec, params: &NoiseParameters) -> Result<HeightField> {
        self.height_field_with_cancel(grid, params, &CancellationToken::new())
    }

    pub fn height_field_with_cancel(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
        cancel: &CancellationToken,
    ) -> Result<HeightField> {
        HeightFieldEvaluator::new(self.noise.clone()).evaluate_with_cancel(grid, params, cancel)
    }

    /// Full terrain mesh for `grid`.
    pub fn generate_height_field(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
    ) -> Result<MeshBuffers> {
        self.generate_height_field_with_cancel(grid, params, &CancellationToken::new())
    }

    /// Mesh for a height field evaluated earlier on `grid`.
    pub fn assemble_height_field(&self, field: &HeightField, grid: &GridSpec) -> Result<MeshBuffers> {
        self.assembler.assemble(field, grid)
    }

    /// Like [`Self::generate_height_field`], but abandons the request once
    /// `cancel` is set. Nothing partial is returned.
    pub fn generate_height_field_with_cancel(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
        cancel: &CancellationToken,
    ) -> Result<MeshBuffers> {
        let start = Instant::now();
        let field = self.height_field_with_cancel(grid, params, cancel)?;
        let mesh = self.assembler.assemble(&field, grid)?;

        log::info!(
            "Generated {}x{} height mesh ({} vertices, {} triangles)",
            field.x_amount(),
            field.y_amount(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        log::info!("Execution time: {}ms", start.elapsed().as_millis());
        Ok(mesh)
    }

    /// Regenerate into an existing mesh after a parameter change.
    ///
    /// `mesh` is only written once the new height field is complete, so a
    /// failed or cancelled request leaves the previous mesh untouched.
    pub fn regenerate_into(
        &mut self,
        grid: &GridSpec,
        params: &NoiseParameters,
        mesh: &mut MeshBuffers,
        cancel: &CancellationToken,
    ) -> Result<TopologyChange> {
        let start = Instant::now();
        let field = self.height_field_with_cancel(grid, params, cancel)?;
        let change = self.assembler.assemble_into(&field, grid, mesh)?;
        log::info!("Execution time: {}ms", start.elapsed().as_millis());
        Ok(change)
    }

    /// Point-query handle for the density variant.
    pub fn density_sampler(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
        density: &DensityParameters,
    ) -> Result<DensitySampler> {
        DensitySampler::new(self.noise.clone(), *grid, params, density.clone())
    }

    /// Threshold the density field and group solid cells into chunks.
    pub fn generate_obstacle_chunks(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
        density: &DensityParameters,
        chunk_size: u32,
    ) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        self.generate_obstacle_chunks_into(grid, params, density, chunk_size, &mut chunks)?;
        Ok(chunks)
    }

    /// Streaming form of [`Self::generate_obstacle_chunks`]; returns how many
    /// chunks reached `sink`.
    pub fn generate_obstacle_chunks_into(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
        density: &DensityParameters,
        chunk_size: u32,
        sink: &mut impl ChunkSink,
    ) -> Result<usize> {
        let start = Instant::now();
        let partitioner = ChunkPartitioner::new(chunk_size, self.obstacle_colors.clone());
        grid.validate()?;
        partitioner.validate(grid.width)?;

        let map = self.density_sampler(grid, params, density)?.density_map();
        let emitted = partitioner.partition_into(&map, sink)?;

        log::info!(
            "Generated {} obstacle chunks for {}x{} grid ({} solid cells, {:.1}% coverage)",
            emitted,
            grid.width,
            grid.height,
            map.solid_count(),
            map.solid_fraction(false) * 100.0
        );
        log::info!("Execution time: {}ms", start.elapsed().as_millis());
        Ok(emitted)
    }

    /// Flat ground under the density grid.
    pub fn ground_plane(&self, grid: &GridSpec) -> Result<MeshBuffers> {
        grid.validate()?;
        Ok(ground_plane(grid))
    }
}

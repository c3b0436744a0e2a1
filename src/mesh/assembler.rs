use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{GenerationError, Result};
use crate::mesh::buffers::{MeshBuffers, Position3, Rgba, Uv};
use crate::mesh::triangle_cache::TriangleCache;
use crate::models::grid::GridSpec;
use crate::terrain::color_map::HeightColorMap;
use crate::terrain::height_field::HeightField;

/// What [`MeshAssembler::assemble_into`] did to the caller's mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChange {
    /// Same grid shape as last time; only vertex data was rewritten.
    Unchanged,
    /// New grid shape; the caller must rebuild anything tied to topology.
    Rebuilt,
}

/// Turns height fields into renderable meshes.
///
/// Index buffers come from a shared [`TriangleCache`]; vertex, color and UV
/// streams are rebuilt on every call.
#[derive(Debug)]
pub struct MeshAssembler {
    cache: Arc<TriangleCache>,
    color_map: HeightColorMap,
    last_shape: Option<(u32, u32)>,
}

impl MeshAssembler {
    pub fn new(cache: Arc<TriangleCache>, color_map: HeightColorMap) -> Self {
        Self {
            cache,
            color_map,
            last_shape: None,
        }
    }

    pub fn color_map(&self) -> &HeightColorMap {
        &self.color_map
    }

    pub fn set_color_map(&mut self, color_map: HeightColorMap) {
        self.color_map = color_map;
    }

    pub fn cache(&self) -> &Arc<TriangleCache> {
        &self.cache
    }

    /// Build a fresh mesh for `field`, which must have been evaluated on `grid`.
    pub fn assemble(&self, field: &HeightField, grid: &GridSpec) -> Result<MeshBuffers> {
        let mut mesh = MeshBuffers::default();
        self.fill(field, grid, &mut mesh)?;
        Ok(mesh)
    }

    /// Rewrite `mesh` in place, reusing its allocations.
    ///
    /// Reports [`TopologyChange::Unchanged`] when the grid shape matches the
    /// previous call and `mesh` already held that shape's index buffer, so
    /// the caller can keep its plane/collider objects.
    pub fn assemble_into(
        &mut self,
        field: &HeightField,
        grid: &GridSpec,
        mesh: &mut MeshBuffers,
    ) -> Result<TopologyChange> {
        let previous = Arc::clone(&mesh.triangles);
        let shape = self.fill(field, grid, mesh)?;
        let same_buffer = Arc::ptr_eq(&previous, &mesh.triangles);
        let change = if self.last_shape == Some(shape) && same_buffer {
            TopologyChange::Unchanged
        } else {
            log::debug!("mesh topology changed to {}x{}", shape.0, shape.1);
            TopologyChange::Rebuilt
        };
        self.last_shape = Some(shape);
        Ok(change)
    }

    fn fill(&self, field: &HeightField, grid: &GridSpec, mesh: &mut MeshBuffers) -> Result<(u32, u32)> {
        let (x_amount, y_amount) = grid.vertex_shape()?;
        if field.grid() != *grid || field.len() != grid.vertex_count()? {
            return Err(GenerationError::config(format!(
                "height field was evaluated on {:?}, not {:?}",
                field.grid(),
                grid
            )));
        }

        let row_len = field.row_len();
        let subdivisions = grid.subdivisions as f32;
        let heights = field.heights();

        mesh.vertices.clear();
        mesh.vertices.par_extend(heights.par_iter().enumerate().map(|(i, &h)| {
            let x = (i % row_len) as f32;
            let y = (i / row_len) as f32;
            Position3::new(x / subdivisions, h as f32, y / subdivisions)
        }));

        mesh.colors.clear();
        mesh.colors.par_extend(
            (0..heights.len())
                .into_par_iter()
                .map(|i| self.vertex_color(field.normalized(i))),
        );

        mesh.uvs.clear();
        mesh.uvs.par_extend((0..heights.len()).into_par_iter().map(|i| {
            let x = (i % row_len) as f32;
            let y = (i / row_len) as f32;
            Uv::new(x / x_amount as f32, y / y_amount as f32)
        }));

        mesh.triangles = self.cache.get_or_build(x_amount, y_amount)?;

        Ok((x_amount, y_amount))
    }

    fn vertex_color(&self, normalized: f64) -> Rgba {
        self.color_map.interpolate(normalized as f32)
    }
}

use crate::chunk::{Aabb, Chunk, ChunkSink};
use crate::error::{GenerationError, Result};
use crate::mesh::buffers::MeshBuffers;
use crate::mesh::primitives::{combine, unit_cube, BoxInstance};
use crate::terrain::color_map::HeightColorMap;
use crate::terrain::density::{DensityMap, ObstacleCell};

/// Splits a density map into `chunk_size x chunk_size` cell chunks.
#[derive(Debug, Clone)]
pub struct ChunkPartitioner {
    chunk_size: u32,
    template: MeshBuffers,
    color_map: HeightColorMap,
}

impl ChunkPartitioner {
    pub fn new(chunk_size: u32, color_map: HeightColorMap) -> Self {
        Self {
            chunk_size,
            template: unit_cube(),
            color_map,
        }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// `chunk_size` must be positive and divide the grid width.
    pub fn validate(&self, width: u32) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(GenerationError::config("chunk size must be at least 1"));
        }
        if width % self.chunk_size != 0 {
            return Err(GenerationError::config(format!(
                "chunk size {} does not divide grid width {}",
                self.chunk_size, width
            )));
        }
        Ok(())
    }

    pub fn partition(&self, map: &DensityMap) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        self.partition_into(map, &mut chunks)?;
        Ok(chunks)
    }

    /// Scan cells row-major, collecting one box per solid cell into the
    /// pending list of its chunk column. When the scan completes the last row
    /// of a band, every pending chunk of that band is finalized, once.
    ///
    /// Returns the number of chunks handed to `sink`. Empty chunks are skipped.
    pub fn partition_into(&self, map: &DensityMap, sink: &mut impl ChunkSink) -> Result<usize> {
        let grid = map.grid();
        self.validate(grid.width)?;

        let c = self.chunk_size;
        let height_max = map.params().height_max;
        let mut pending: Vec<Vec<BoxInstance>> = vec![Vec::new(); (grid.width / c) as usize];
        let mut band_start = 0;
        let mut emitted = 0;

        for row in 0..grid.height {
            for col in 0..grid.width {
                let (Some(sample), Some(height)) = (map.sample(col, row), map.obstacle_height(col, row))
                else {
                    continue;
                };
                let cell = ObstacleCell {
                    x: col,
                    y: row,
                    sample,
                    height,
                };
                let color = self.color_map.interpolate((height / height_max) as f32);
                pending[(col / c) as usize].push(BoxInstance::from_obstacle(&cell, color));
            }

            let band_done = (row + 1) % c == 0 || row + 1 == grid.height;
            if !band_done {
                continue;
            }
            for (chunk_col, instances) in pending.iter_mut().enumerate() {
                if instances.is_empty() {
                    continue;
                }
                let instances = std::mem::take(instances);
                let chunk_col = chunk_col as u32;
                let chunk = self.finalize(
                    (chunk_col, band_start / c),
                    chunk_col * c..(chunk_col + 1) * c,
                    band_start..row + 1,
                    instances,
                )?;
                log::debug!(
                    "finalized chunk {:?} with {} obstacles",
                    chunk.index,
                    chunk.cell_count()
                );
                sink.accept(chunk);
                emitted += 1;
            }
            band_start = row + 1;
        }

        Ok(emitted)
    }

    fn finalize(
        &self,
        index: (u32, u32),
        cells_x: std::ops::Range<u32>,
        cells_y: std::ops::Range<u32>,
        instances: Vec<BoxInstance>,
    ) -> Result<Chunk> {
        let mesh = combine(&self.template, &instances)?;
        let bounds = instances
            .iter()
            .map(Aabb::of_box)
            .reduce(|a, b| a.union(&b))
            .ok_or_else(|| GenerationError::config("cannot finalize an empty chunk"))?;
        Ok(Chunk {
            index,
            cells_x,
            cells_y,
            instances,
            mesh,
            bounds,
        })
    }
}

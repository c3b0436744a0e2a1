use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::models::grid::GridSpec;
use crate::terrain::color_map::HeightColorMap;
use crate::terrain::density::{DensityMap, DensityParameters, DensitySampler};
use crate::terrain::gradient::GradientNoise;
use crate::terrain::noise::NoiseParameters;
use crate::terrain::permutation::PermutationTable;
use crate::GenerationError;

fn noise_map(width: u32, height: u32) -> DensityMap {
    let noise = GradientNoise::new(Arc::new(PermutationTable::perlin()));
    DensitySampler::new(
        noise,
        GridSpec::new(width, height, 1),
        &NoiseParameters::obstacles(),
        DensityParameters::default(),
    )
    .unwrap()
    .density_map()
}

/// Map whose solid cells are exactly `solid`, everything else open.
fn map_with(width: u32, height: u32, solid: &[(u32, u32)]) -> DensityMap {
    let mut samples = vec![1.0; (width * height) as usize];
    for &(x, y) in solid {
        samples[(y * width + x) as usize] = 0.0;
    }
    let params = DensityParameters {
        solid_border: false,
        ..Default::default()
    };
    DensityMap::from_samples(GridSpec::new(width, height, 1), params, samples).unwrap()
}

fn partitioner(chunk_size: u32) -> ChunkPartitioner {
    ChunkPartitioner::new(chunk_size, HeightColorMap::grayscale())
}

#[test]
fn test_every_solid_cell_in_exactly_one_chunk() {
    let map = noise_map(40, 30);
    let chunks = partitioner(10).partition(&map).unwrap();

    let mut owners: HashMap<(u32, u32), usize> = HashMap::new();
    for chunk in &chunks {
        for instance in &chunk.instances {
            let cell = (instance.center.x as u32, instance.center.z as u32);
            assert!(chunk.covers_cell(cell.0, cell.1));
            *owners.entry(cell).or_default() += 1;
        }
    }

    assert_eq!(owners.len(), map.solid_count());
    assert!(owners.values().all(|&n| n == 1));
    for cell in map.obstacles() {
        assert!(owners.contains_key(&(cell.x, cell.y)));
    }
}

#[test]
fn test_chunks_emitted_band_by_band() {
    let map = noise_map(20, 20);
    let chunks = partitioner(5).partition(&map).unwrap();
    // Solid border puts something in every chunk of the outer ring.
    assert!(chunks.len() >= 12);
    let indices: Vec<(u32, u32)> = chunks.iter().map(|c| (c.index.1, c.index.0)).collect();
    let mut sorted = indices.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(indices, sorted);
}

#[test]
fn test_empty_chunks_skipped() {
    let map = map_with(8, 8, &[(1, 1), (6, 5)]);
    let chunks = partitioner(4).partition(&map).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].index, (0, 0));
    assert_eq!(chunks[1].index, (1, 1));
    assert_eq!(chunks[1].cells_x, 4..8);
    assert_eq!(chunks[1].cells_y, 4..8);
}

#[test]
fn test_partial_last_band() {
    let map = map_with(6, 7, &[(0, 6), (5, 6), (2, 2)]);
    let chunks = partitioner(3).partition(&map).unwrap();
    assert_eq!(chunks.len(), 3);
    let last = &chunks[2];
    assert_eq!(last.index, (1, 2));
    assert_eq!(last.cells_y, 6..7);
    assert_eq!(chunks[1].index, (0, 2));
}

#[test]
fn test_chunk_mesh_and_bounds() {
    let map = map_with(4, 4, &[(0, 0), (1, 0)]);
    let chunks = partitioner(4).partition(&map).unwrap();
    let chunk = &chunks[0];
    assert_eq!(chunk.cell_count(), 2);
    assert_eq!(chunk.mesh.vertex_count(), 48);
    assert_eq!(chunk.mesh.triangles.len(), 72);

    // Sample 0 gives full height_max.
    assert_eq!(chunk.bounds.min, Position3::new(-0.5, 0.0, -0.5));
    assert_eq!(chunk.bounds.max, Position3::new(1.5, 3.0, 0.5));
    assert!(chunk.contains_point(Position3::new(1.2, 2.0, 0.0)));
    assert!(!chunk.contains_point(Position3::new(1.2, 3.5, 0.0)));
    assert!(!chunk.contains_point(Position3::new(0.0, 1.0, 1.0)));

    // Full-height obstacles take the top of the ramp.
    assert_eq!(chunk.mesh.colors[0], HeightColorMap::grayscale().interpolate(1.0));
}

#[test]
fn test_custom_sink_receives_chunks() {
    struct Counter(usize, usize);
    impl ChunkSink for Counter {
        fn accept(&mut self, chunk: Chunk) {
            self.0 += 1;
            self.1 += chunk.cell_count();
        }
    }

    let map = noise_map(30, 30);
    let mut counter = Counter(0, 0);
    let emitted = partitioner(6).partition_into(&map, &mut counter).unwrap();
    assert_eq!(emitted, counter.0);
    assert_eq!(counter.1, map.solid_count());
}

#[test]
fn test_invalid_chunk_size() {
    let map = noise_map(10, 10);
    for size in [0, 3] {
        assert!(matches!(
            partitioner(size).partition(&map),
            Err(GenerationError::Configuration(_))
        ));
    }
}

#[test]
fn test_aabb_union() {
    let a = Aabb::new(Position3::new(0.0, 0.0, 0.0), Position3::new(1.0, 1.0, 1.0));
    let b = Aabb::new(Position3::new(-1.0, 0.5, 2.0), Position3::new(0.5, 4.0, 3.0));
    let u = a.union(&b);
    assert_eq!(u.min, Position3::new(-1.0, 0.0, 0.0));
    assert_eq!(u.max, Position3::new(1.0, 4.0, 3.0));
}

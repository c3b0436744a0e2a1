// 手动验证地形生成系统的核心功能
use std::collections::HashSet;
use std::sync::Arc;

use heightforge::mesh::TriangleCache;
use heightforge::terrain::{
    DensityParameters, FractalNoise, GradientNoise, NoiseParameters, PermutationTable,
};
use heightforge::{GridSpec, TerrainGenerator};

fn perlin() -> GradientNoise {
    GradientNoise::new(Arc::new(PermutationTable::perlin()))
}

#[test]
fn test_noise_determinism() {
    println!("\n=== Testing Determinism ===");

    let generator = TerrainGenerator::default();
    let grid = GridSpec::new(32, 24, 2);
    let params = NoiseParameters::new(12345, 5.0, 5, 0.5, 2.0);

    let a = generator.generate_height_field(&grid, &params).unwrap();
    let b = generator.generate_height_field(&grid, &params).unwrap();
    assert_eq!(a.vertices, b.vertices, "Height generation not deterministic!");
    assert_eq!(a.colors, b.colors);

    let other = TerrainGenerator::default()
        .generate_height_field(&grid, &params)
        .unwrap();
    assert_eq!(a.vertices, other.vertices);

    println!("✓ Determinism test passed");
}

#[test]
fn test_boundedness() {
    println!("\n=== Testing Boundedness ===");

    let noise = perlin();
    let fractal = FractalNoise::new(noise.clone(), &NoiseParameters::rough()).unwrap();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for i in 0..200 {
        for j in 0..200 {
            let (x, y) = (i as f64 * 0.173 - 17.0, j as f64 * 0.291 - 29.0);
            let raw = noise.sample(x, y);
            assert!((0.0..=1.0).contains(&raw), "Noise {} out of range at ({}, {})", raw, x, y);
            let v = fractal.sample(x / 10.0, y / 10.0);
            assert!((0.0..=1.0).contains(&v), "Fractal {} out of range", v);
            min = min.min(v);
            max = max.max(v);
        }
    }
    println!("  Fractal range: [{:.4}, {:.4}]", min, max);

    let params = NoiseParameters::default().with_amplitude(25.0);
    let field = TerrainGenerator::default()
        .height_field(&GridSpec::new(50, 50, 1), &params)
        .unwrap();
    let (lo, hi) = field.range();
    assert!(lo >= 0.0 && hi <= 25.0);

    println!("✓ Boundedness test passed");
}

#[test]
fn test_overflowing_lacunarity_rejected() {
    let params = NoiseParameters {
        octaves: 40,
        lacunarity: 1e10,
        ..Default::default()
    };
    let result = TerrainGenerator::default().height_field(&GridSpec::new(4, 4, 1), &params);
    assert!(
        matches!(result, Err(heightforge::GenerationError::Configuration(_))),
        "Overflowing octave stack should be refused, got {:?}",
        result.map(|field| field.range())
    );
}

#[test]
fn test_continuity() {
    let noise = perlin();
    let eps = 1e-6;
    for i in 0..500 {
        let x = i as f64 * 0.137;
        let y = i as f64 * 0.071 + 3.0;
        let d = (noise.sample(x, y) - noise.sample(x + eps, y)).abs();
        assert!(d < 1e-4, "Discontinuity {} at ({}, {})", d, x, y);
    }
}

#[test]
fn test_lattice_points() {
    let noise = perlin();
    for x in -5..5 {
        for y in -5..5 {
            assert_eq!(noise.sample(x as f64, y as f64), 0.5);
        }
    }
}

#[test]
fn test_cache_idempotence() {
    let cache = Arc::new(TriangleCache::new());
    let generator = TerrainGenerator::new(Arc::new(PermutationTable::perlin()), Arc::clone(&cache));
    let grid = GridSpec::new(10, 7, 3);

    let first = generator
        .generate_height_field(&grid, &NoiseParameters::terrain())
        .unwrap();
    let second = generator
        .generate_height_field(&grid, &NoiseParameters::smooth())
        .unwrap();

    assert!(Arc::ptr_eq(&first.triangles, &second.triangles));
    assert_eq!(&first.triangles[..], &cache.get_or_build(30, 21).unwrap()[..]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_grid_coverage() {
    let mesh = TerrainGenerator::default()
        .generate_height_field(&GridSpec::new(4, 4, 1), &NoiseParameters::default())
        .unwrap();
    assert_eq!(mesh.vertex_count(), 25);
    assert_eq!(mesh.triangles.len(), 96);
    assert!(mesh.triangles.iter().all(|&i| i < 25));
}

#[test]
fn test_density_threshold_converges() {
    println!("\n=== Testing Density Coverage ===");

    let generator = TerrainGenerator::default();
    let grid = GridSpec::new(200, 200, 1);
    let density = DensityParameters {
        equalize: true,
        ..Default::default()
    };
    let map = generator
        .density_sampler(&grid, &NoiseParameters::obstacles(), &density)
        .unwrap()
        .density_map();

    let fraction = map.solid_fraction(true);
    println!("  Interior solid fraction: {:.4}", fraction);
    assert!(
        (fraction - 0.35).abs() < 0.01,
        "Solid fraction {} should be ~0.35",
        fraction
    );

    println!("✓ Density coverage test passed");
}

#[test]
fn test_chunk_completeness() {
    println!("\n=== Testing Chunk Completeness ===");

    let generator = TerrainGenerator::default();
    let grid = GridSpec::new(60, 45, 1);
    let params = NoiseParameters::obstacles();
    let density = DensityParameters::default();

    let chunks = generator
        .generate_obstacle_chunks(&grid, &params, &density, 15)
        .unwrap();
    let map = generator
        .density_sampler(&grid, &params, &density)
        .unwrap()
        .density_map();

    let mut seen = HashSet::new();
    for chunk in &chunks {
        assert!(chunk.cell_count() > 0, "Empty chunk {:?} emitted", chunk.index);
        for instance in &chunk.instances {
            let cell = (instance.center.x as u32, instance.center.z as u32);
            assert!(seen.insert(cell), "Cell {:?} appears in two chunks", cell);
        }
    }
    let expected: HashSet<_> = map.obstacles().map(|c| (c.x, c.y)).collect();
    assert_eq!(seen, expected);

    println!("  {} chunks, {} solid cells", chunks.len(), seen.len());
    println!("✓ Chunk completeness test passed");
}

#[test]
fn test_occupancy_matches_chunks() {
    let generator = TerrainGenerator::default();
    let grid = GridSpec::new(20, 20, 1);
    let params = NoiseParameters::obstacles();
    let density = DensityParameters::default();

    let sampler = generator.density_sampler(&grid, &params, &density).unwrap();
    let chunks = generator
        .generate_obstacle_chunks(&grid, &params, &density, 10)
        .unwrap();

    for y in 0..20 {
        for x in 0..20 {
            let p = heightforge::mesh::Position3::new(x as f32, 0.5, y as f32);
            let in_chunk = chunks.iter().any(|c| c.contains_point(p));
            assert_eq!(
                in_chunk,
                sampler.is_occupied([x as f64, 0.5, y as f64]),
                "Occupancy mismatch at ({}, {})",
                x,
                y
            );
        }
    }
}

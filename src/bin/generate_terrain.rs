use heightforge::{GeneratorConfig, GenerationError, TerrainGenerator};

fn main() -> Result<(), GenerationError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let generator = TerrainGenerator::from_config(&config)?;

    let field = generator.height_field(&config.grid, &config.noise)?;
    let mesh = generator.assemble_height_field(&field, &config.grid)?;
    let (min, max) = field.range();
    let avg = field.heights().iter().sum::<f64>() / field.len() as f64;

    println!("Height stats:");
    println!("  Grid: {}x{} quads", field.x_amount(), field.y_amount());
    println!("  Vertices: {}", mesh.vertex_count());
    println!("  Triangles: {}", mesh.triangle_count());
    println!("  Min: {:.3}", min);
    println!("  Max: {:.3}", max);
    println!("  Avg: {:.3}", avg);

    let chunks = generator.generate_obstacle_chunks(
        &config.grid,
        &config.obstacle_noise,
        &config.density,
        config.chunk_size,
    )?;
    let solid: usize = chunks.iter().map(|c| c.cell_count()).sum();
    let cells = config.grid.cell_count()?;

    println!("Obstacle stats:");
    println!("  Chunks: {}", chunks.len());
    println!(
        "  Solid cells: {} ({:.1}%)",
        solid,
        solid as f64 * 100.0 / cells as f64
    );
    println!(
        "  Open cells: {} ({:.1}%)",
        cells - solid,
        (cells - solid) as f64 * 100.0 / cells as f64
    );
    Ok(())
}

//! Density-map variant: one noise sample per cell decides whether the cell
//! holds an obstacle and how tall it is.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::models::grid::GridSpec;
use crate::terrain::gradient::GradientNoise;
use crate::terrain::noise::{FractalNoise, NoiseParameters};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityParameters {
    /// Cells whose sample is below this value are solid.
    pub percentage_blocks: f64,
    /// Obstacle height for a sample of 0.
    pub height_max: f64,
    /// How much a sample of 1 lowers the obstacle.
    pub height_range: f64,
    /// Force the outer ring of cells solid.
    pub solid_border: bool,
    /// Remap samples through their empirical distribution so that
    /// `percentage_blocks` is the fraction of solid interior cells.
    pub equalize: bool,
}

impl Default for DensityParameters {
    fn default() -> Self {
        Self {
            percentage_blocks: 0.35,
            height_max: 3.0,
            height_range: 2.0,
            solid_border: true,
            equalize: false,
        }
    }
}

impl DensityParameters {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.percentage_blocks) {
            return Err(GenerationError::config(format!(
                "percentage_blocks must be within [0, 1], got {}",
                self.percentage_blocks
            )));
        }
        if !self.height_max.is_finite() || !self.height_range.is_finite() {
            return Err(GenerationError::config("obstacle heights must be finite"));
        }
        if self.height_range < 0.0 {
            return Err(GenerationError::config(format!(
                "height_range must be non-negative, got {}",
                self.height_range
            )));
        }
        if self.height_max - self.height_range * self.percentage_blocks <= 0.0 {
            return Err(GenerationError::config(format!(
                "height_max {} leaves solid cells with no height (range {}, threshold {})",
                self.height_max, self.height_range, self.percentage_blocks
            )));
        }
        if self.percentage_blocks == 0.0 || self.percentage_blocks == 1.0 {
            log::warn!(
                "percentage_blocks is {}, interior cells will be uniform",
                self.percentage_blocks
            );
        }
        Ok(())
    }

    pub fn obstacle_height(&self, sample: f64) -> f64 {
        self.height_max - sample * self.height_range
    }
}

/// A solid cell and the height of the obstacle standing on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleCell {
    pub x: u32,
    pub y: u32,
    pub sample: f64,
    pub height: f64,
}

/// Per-cell density samples for a `width x height` grid, row-major.
#[derive(Debug, Clone)]
pub struct DensityMap {
    grid: GridSpec,
    params: DensityParameters,
    samples: Vec<f64>,
}

impl DensityMap {
    /// Wrap precomputed row-major samples.
    pub fn from_samples(grid: GridSpec, params: DensityParameters, samples: Vec<f64>) -> Result<Self> {
        if samples.len() != grid.cell_count()? {
            return Err(GenerationError::config(format!(
                "expected {} samples for a {}x{} grid, got {}",
                grid.cell_count()?,
                grid.width,
                grid.height,
                samples.len()
            )));
        }
        Ok(Self {
            grid,
            params,
            samples,
        })
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn params(&self) -> &DensityParameters {
        &self.params
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.grid.width || y >= self.grid.height {
            return None;
        }
        Some(self.samples[y as usize * self.grid.width as usize + x as usize])
    }

    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        self.sample(x, y)
            .is_some_and(|s| s < self.params.percentage_blocks)
    }

    pub fn obstacle_height(&self, x: u32, y: u32) -> Option<f64> {
        self.sample(x, y)
            .filter(|&s| s < self.params.percentage_blocks)
            .map(|s| self.params.obstacle_height(s))
    }

    /// Solid cells in row-major order.
    pub fn obstacles(&self) -> impl Iterator<Item = ObstacleCell> + '_ {
        let width = self.grid.width as usize;
        self.samples
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s < self.params.percentage_blocks)
            .map(move |(i, &sample)| ObstacleCell {
                x: (i % width) as u32,
                y: (i / width) as u32,
                sample,
                height: self.params.obstacle_height(sample),
            })
    }

    pub fn solid_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|&&s| s < self.params.percentage_blocks)
            .count()
    }

    /// Fraction of solid cells, optionally ignoring the border ring.
    pub fn solid_fraction(&self, interior_only: bool) -> f64 {
        let width = self.grid.width as usize;
        let (solid, total) = self
            .samples
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                !interior_only
                    || !self.grid.is_border((i % width) as u32, (i / width) as u32)
            })
            .fold((0usize, 0usize), |(solid, total), (_, &s)| {
                (
                    solid + usize::from(s < self.params.percentage_blocks),
                    total + 1,
                )
            });
        if total == 0 {
            0.0
        } else {
            solid as f64 / total as f64
        }
    }
}

/// Point queries against the density field without any mesh state.
///
/// Cell `(x, y)` is centred on the world-space point `(x, y)` and sampled at
/// `(x / width, y / height)`.
#[derive(Debug, Clone)]
pub struct DensitySampler {
    grid: GridSpec,
    params: DensityParameters,
    fractal: FractalNoise,
    /// Sorted raw samples of the cells that take part in equalization.
    distribution: Option<Vec<f64>>,
}

impl DensitySampler {
    pub fn new(
        noise: GradientNoise,
        grid: GridSpec,
        noise_params: &NoiseParameters,
        params: DensityParameters,
    ) -> Result<Self> {
        grid.cell_count()?;
        params.validate()?;
        let fractal = FractalNoise::new(noise, noise_params)?;

        let mut sampler = Self {
            grid,
            params,
            fractal,
            distribution: None,
        };
        if sampler.params.equalize {
            sampler.distribution = Some(sampler.raw_distribution());
        }
        Ok(sampler)
    }

    fn raw_distribution(&self) -> Vec<f64> {
        let width = self.grid.width;
        let mut samples: Vec<f64> = (0..self.grid.height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width)
                    .filter(move |&x| !(self.params.solid_border && self.grid.is_border(x, y)))
                    .map(move |x| self.raw_sample(x, y))
            })
            .collect();
        samples.par_sort_unstable_by(f64::total_cmp);
        samples
    }

    fn raw_sample(&self, x: u32, y: u32) -> f64 {
        let u = f64::from(x) / f64::from(self.grid.width);
        let v = f64::from(y) / f64::from(self.grid.height);
        self.fractal.sample(u, v)
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn params(&self) -> &DensityParameters {
        &self.params
    }

    /// Density of cell `(x, y)`; border cells read 0 when the border is solid.
    pub fn cell_density(&self, x: u32, y: u32) -> f64 {
        if self.params.solid_border && self.grid.is_border(x, y) {
            return 0.0;
        }
        let raw = self.raw_sample(x, y);
        match &self.distribution {
            Some(sorted) if !sorted.is_empty() => {
                sorted.partition_point(|&s| s < raw) as f64 / sorted.len() as f64
            }
            _ => raw,
        }
    }

    /// Density at a world position. Outside the grid reads as 0 (solid).
    pub fn sample_density(&self, world_x: f64, world_y: f64) -> f64 {
        match self.grid.cell_at(world_x, world_y) {
            Some((x, y)) => self.cell_density(x, y),
            None => 0.0,
        }
    }

    pub fn is_solid_at(&self, world_x: f64, world_y: f64) -> bool {
        self.sample_density(world_x, world_y) < self.params.percentage_blocks
    }

    /// Whether `position` (`[x, up, z]`) is inside an obstacle. Positions
    /// outside the grid are always occupied.
    pub fn is_occupied(&self, position: [f64; 3]) -> bool {
        let [x, up, z] = position;
        match self.grid.cell_at(x, z) {
            None => true,
            Some((cx, cy)) => {
                let sample = self.cell_density(cx, cy);
                sample < self.params.percentage_blocks
                    && up < self.params.obstacle_height(sample)
            }
        }
    }

    /// Evaluate every cell, rows in parallel.
    pub fn density_map(&self) -> DensityMap {
        let width = self.grid.width as usize;
        let mut samples = vec![0.0; width * self.grid.height as usize];
        samples
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, sample) in row.iter_mut().enumerate() {
                    *sample = self.cell_density(x as u32, y as u32);
                }
            });
        DensityMap {
            grid: self.grid,
            params: self.params.clone(),
            samples,
        }
    }
}

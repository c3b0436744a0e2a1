use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{GenerationError, Result};
use crate::models::grid::GridSpec;
use crate::terrain::gradient::GradientNoise;
use crate::terrain::noise::{FractalNoise, NoiseParameters};

/// Cooperative cancellation flag, checked between rows of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Row-major heights over the `(x_amount + 1) x (y_amount + 1)` vertex grid.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    grid: GridSpec,
    x_amount: u32,
    y_amount: u32,
    amplitude: f64,
    heights: Vec<f64>,
}

impl HeightField {
    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn x_amount(&self) -> u32 {
        self.x_amount
    }

    pub fn y_amount(&self) -> u32 {
        self.y_amount
    }

    /// Samples per row (`x_amount + 1`).
    pub fn row_len(&self) -> usize {
        self.x_amount as usize + 1
    }

    /// Amplitude the normalized noise was scaled by.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x > self.x_amount || y > self.y_amount {
            return None;
        }
        self.heights.get(y as usize * self.row_len() + x as usize).copied()
    }

    /// Height divided by amplitude, i.e. back in `[0, 1]`.
    pub fn normalized(&self, index: usize) -> f64 {
        if self.amplitude > 0.0 {
            self.heights[index] / self.amplitude
        } else {
            0.0
        }
    }

    /// `(min, max)` over all samples.
    pub fn range(&self) -> (f64, f64) {
        self.heights
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            })
    }
}

/// Evaluates the fractal noise stack at every vertex of a grid
pub struct HeightFieldEvaluator {
    noise: GradientNoise,
}

impl HeightFieldEvaluator {
    pub fn new(noise: GradientNoise) -> Self {
        Self { noise }
    }

    /// Generate the height field for `grid`.
    ///
    /// Cell `(x, y)` is sampled at `(x / x_amount, y / y_amount)`; each cell is
    /// independent, so rows are evaluated in parallel.
    pub fn evaluate(&self, grid: &GridSpec, params: &NoiseParameters) -> Result<HeightField> {
        self.evaluate_with_cancel(grid, params, &CancellationToken::new())
    }

    /// Like [`Self::evaluate`], but gives up with [`GenerationError::Cancelled`]
    /// once `cancel` is set. The partial buffer is dropped, never returned.
    pub fn evaluate_with_cancel(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
        cancel: &CancellationToken,
    ) -> Result<HeightField> {
        let (x_amount, y_amount) = grid.vertex_shape()?;
        let fractal = FractalNoise::new(self.noise.clone(), params)?;

        let row_len = x_amount as usize + 1;
        let mut heights = vec![0.0; grid.vertex_count()?];
        heights
            .par_chunks_mut(row_len)
            .enumerate()
            .try_for_each(|(y, row)| {
                if cancel.is_cancelled() {
                    return Err(GenerationError::Cancelled);
                }
                let v = y as f64 / f64::from(y_amount);
                for (x, height) in row.iter_mut().enumerate() {
                    let u = x as f64 / f64::from(x_amount);
                    *height = fractal.height(u, v);
                }
                Ok(())
            })?;

        Ok(HeightField {
            grid: *grid,
            x_amount,
            y_amount,
            amplitude: fractal.amplitude(),
            heights,
        })
    }

    /// Sequential reference evaluation over linear cell indices.
    pub fn evaluate_sequential(
        &self,
        grid: &GridSpec,
        params: &NoiseParameters,
    ) -> Result<HeightField> {
        let (x_amount, y_amount) = grid.vertex_shape()?;
        let fractal = FractalNoise::new(self.noise.clone(), params)?;

        let row_len = x_amount as usize + 1;
        let heights = (0..grid.vertex_count()?)
            .map(|i| {
                let u = (i % row_len) as f64 / f64::from(x_amount);
                let v = (i / row_len) as f64 / f64::from(y_amount);
                fractal.height(u, v)
            })
            .collect();

        Ok(HeightField {
            grid: *grid,
            x_amount,
            y_amount,
            amplitude: fractal.amplitude(),
            heights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::permutation::PermutationTable;

    fn evaluator() -> HeightFieldEvaluator {
        HeightFieldEvaluator::new(GradientNoise::new(Arc::new(PermutationTable::perlin())))
    }

    #[test]
    fn test_height_count_matches_grid_points() {
        let grid = GridSpec::new(16, 8, 2);
        let field = evaluator()
            .evaluate(&grid, &NoiseParameters::default())
            .unwrap();

        assert_eq!(field.len(), 33 * 17, "Height count should match vertex count");
        assert_eq!(field.row_len(), 33);
    }

    #[test]
    fn test_height_values_in_valid_range() {
        let params = NoiseParameters::terrain();
        let field = evaluator()
            .evaluate(&GridSpec::new(50, 50, 1), &params)
            .unwrap();

        for (i, &height) in field.heights().iter().enumerate() {
            assert!(
                (0.0..=params.amplitude).contains(&height),
                "Height {} at index {} outside [0, {}]",
                height,
                i,
                params.amplitude
            );
        }
    }

    #[test]
    fn test_heights_are_non_uniform() {
        let field = evaluator()
            .evaluate(&GridSpec::new(64, 64, 1), &NoiseParameters::default())
            .unwrap();

        let mean = field.heights().iter().sum::<f64>() / field.len() as f64;
        let variance = field
            .heights()
            .iter()
            .map(|h| (h - mean).powi(2))
            .sum::<f64>()
            / field.len() as f64;

        assert!(
            variance.sqrt() > 0.1,
            "Heights should vary. Std dev: {}, mean: {}",
            variance.sqrt(),
            mean
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let grid = GridSpec::new(37, 23, 3);
        let params = NoiseParameters::rough();
        let evaluator = evaluator();

        let parallel = evaluator.evaluate(&grid, &params).unwrap();
        let sequential = evaluator.evaluate_sequential(&grid, &params).unwrap();

        let bits = |f: &HeightField| f.heights().iter().map(|h| h.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&parallel), bits(&sequential));
    }

    #[test]
    fn test_get_reads_row_major() {
        let grid = GridSpec::new(4, 3, 1);
        let field = evaluator()
            .evaluate(&grid, &NoiseParameters::default())
            .unwrap();

        assert_eq!(field.get(2, 1), Some(field.heights()[5 + 2]));
        assert_eq!(field.get(4, 3), field.heights().last().copied());
        assert_eq!(field.get(5, 0), None);
    }

    #[test]
    fn test_cancelled_evaluation_returns_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = evaluator().evaluate_with_cancel(
            &GridSpec::new(32, 32, 1),
            &NoiseParameters::default(),
            &cancel,
        );
        assert!(matches!(result, Err(GenerationError::Cancelled)));
    }

    #[test]
    fn test_invalid_input_fails_before_evaluation() {
        let evaluator = evaluator();
        let params = NoiseParameters {
            octaves: 0,
            ..Default::default()
        };
        assert!(matches!(
            evaluator.evaluate(&GridSpec::new(4, 4, 1), &params),
            Err(GenerationError::Configuration(_))
        ));
        assert!(matches!(
            evaluator.evaluate(&GridSpec::new(0, 4, 1), &NoiseParameters::default()),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_amplitude_normalizes_to_zero() {
        let params = NoiseParameters::default().with_amplitude(0.0);
        let field = evaluator()
            .evaluate(&GridSpec::new(4, 4, 1), &params)
            .unwrap();
        assert_eq!(field.range(), (0.0, 0.0));
        assert_eq!(field.normalized(3), 0.0);
    }
}

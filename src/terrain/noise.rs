use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::gradient::GradientNoise;
use crate::error::{GenerationError, Result};

/// Half-width of the range per-octave offsets are drawn from.
pub const OCTAVE_OFFSET_RANGE: f64 = 1000.0;

/// Configuration for fractal (multi-octave) noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    /// Base frequency applied to normalized grid coordinates
    /// Typical range: 1.0 - 20.0
    pub frequency: f64,

    /// Final height scale; the normalized fractal value is multiplied by this
    pub amplitude: f64,

    /// Number of noise layers to combine (more = more detail)
    /// Typical range: 1 - 8
    pub octaves: u32,

    /// Amplitude multiplier between octaves
    /// Typical range: 0.3 - 0.7
    pub gain: f64,

    /// Frequency multiplier between octaves
    /// Typical range: 1.5 - 3.0
    pub lacunarity: f64,

    /// Seed for the per-octave offsets
    pub seed: u64,

    /// Global offset added to every octave, for scrolling over the noise
    pub offset: (f64, f64),
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            frequency: 4.0,
            amplitude: 10.0,
            octaves: 4,
            gain: 0.5,
            lacunarity: 2.0,
            seed: 42,
            offset: (0.0, 0.0),
        }
    }
}

impl NoiseParameters {
    pub fn new(seed: u64, frequency: f64, octaves: u32, gain: f64, lacunarity: f64) -> Self {
        Self {
            seed,
            frequency,
            octaves,
            gain,
            lacunarity,
            ..Default::default()
        }
    }

    /// Rolling terrain with a moderate amount of detail.
    pub fn terrain() -> Self {
        Self {
            frequency: 3.0,
            amplitude: 20.0,
            octaves: 6,
            ..Default::default()
        }
    }

    /// Smooth, large-scale features.
    pub fn smooth() -> Self {
        Self {
            frequency: 2.0,
            amplitude: 8.0,
            octaves: 3,
            gain: 0.6,
            ..Default::default()
        }
    }

    /// Rough, detailed features.
    pub fn rough() -> Self {
        Self {
            frequency: 6.0,
            amplitude: 12.0,
            octaves: 8,
            gain: 0.4,
            lacunarity: 2.5,
            ..Default::default()
        }
    }

    /// Single-octave field for obstacle density maps.
    pub fn obstacles() -> Self {
        Self {
            frequency: 15.0,
            amplitude: 1.0,
            octaves: 1,
            ..Default::default()
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(GenerationError::config("octaves must be at least 1"));
        }
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(GenerationError::config(format!(
                "frequency must be finite and positive, got {}",
                self.frequency
            )));
        }
        if !self.gain.is_finite() || self.gain <= 0.0 || self.gain > 1.0 {
            return Err(GenerationError::config(format!(
                "gain must be within (0, 1], got {}",
                self.gain
            )));
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(GenerationError::config(format!(
                "lacunarity must be finite and positive, got {}",
                self.lacunarity
            )));
        }
        if !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(GenerationError::config(format!(
                "amplitude must be finite and non-negative, got {}",
                self.amplitude
            )));
        }
        if !self.offset.0.is_finite() || !self.offset.1.is_finite() {
            return Err(GenerationError::config("offset must be finite"));
        }
        if self.amplitude == 0.0 {
            log::warn!("noise amplitude is 0, every height will be flat");
        }
        Ok(())
    }

    /// Per-octave domain offsets.
    ///
    /// ChaCha8 seeded with `seed_from_u64(seed)`; each octave draws x then y
    /// uniformly from `[-1000, 1000)` and adds the global offset.
    pub fn octave_offsets(&self) -> Vec<(f64, f64)> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..self.octaves)
            .map(|_| {
                let x = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
                let y = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
                (x + self.offset.0, y + self.offset.1)
            })
            .collect()
    }
}

/// One octave's frequency, weight and domain offset.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Octave {
    frequency: f64,
    amplitude: f64,
    offset: (f64, f64),
}

/// Fractional Brownian motion over [`GradientNoise`].
///
/// Octave offsets are drawn once at construction, so one `FractalNoise`
/// serves a whole generation call and every cell sees the same octave stack.
#[derive(Debug, Clone)]
pub struct FractalNoise {
    noise: GradientNoise,
    octaves: Vec<Octave>,
    max_sum: f64,
    amplitude: f64,
}

impl FractalNoise {
    pub fn new(noise: GradientNoise, params: &NoiseParameters) -> Result<Self> {
        params.validate()?;

        let mut amplitude = 1.0;
        let mut frequency = params.frequency;
        let mut max_sum = 0.0;
        let mut octaves = Vec::with_capacity(params.octaves as usize);
        for offset in params.octave_offsets() {
            octaves.push(Octave {
                frequency,
                amplitude,
                offset,
            });
            max_sum += amplitude;
            amplitude *= params.gain;
            frequency *= params.lacunarity;
        }

        // Large lacunarity or many octaves can push the stack past f64 range.
        let finite = octaves
            .iter()
            .all(|octave| octave.frequency.is_finite() && octave.amplitude.is_finite());
        if !finite || !max_sum.is_finite() {
            return Err(GenerationError::config(format!(
                "{} octaves with lacunarity {} overflow the octave frequency",
                params.octaves, params.lacunarity
            )));
        }

        Ok(Self {
            noise,
            octaves,
            max_sum,
            amplitude: params.amplitude,
        })
    }

    /// Normalized fractal value at `(u, v)`, in `[0, 1]`.
    pub fn sample(&self, u: f64, v: f64) -> f64 {
        // Gain underflow can drive every weight to zero.
        if self.max_sum <= 0.0 {
            return 0.0;
        }
        let sum: f64 = self
            .octaves
            .iter()
            .map(|octave| {
                let x = u * octave.frequency + octave.offset.0;
                let y = v * octave.frequency + octave.offset.1;
                self.noise.sample(x, y) * octave.amplitude
            })
            .sum();
        (sum / self.max_sum).clamp(0.0, 1.0)
    }

    /// `sample(u, v)` scaled by the configured amplitude.
    pub fn height(&self, u: f64, v: f64) -> f64 {
        self.sample(u, v) * self.amplitude
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn octave_count(&self) -> usize {
        self.octaves.len()
    }
}

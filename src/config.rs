use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::models::grid::GridSpec;
use crate::terrain::color_map::ColorPalette;
use crate::terrain::density::DensityParameters;
use crate::terrain::noise::NoiseParameters;

/// Everything a generation run needs, loadable from a RON file.
///
/// ```ron
/// (
///     grid: (width: 128, height: 128, subdivisions: 2),
///     noise: (frequency: 6.0, octaves: 5, seed: 7),
///     obstacle_noise: (frequency: 12.0),
///     density: (percentage_blocks: 0.3, equalize: true),
///     chunk_size: 16,
///     palette: Desert,
/// )
/// ```
///
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub grid: GridSpec,
    /// Height-field noise stack.
    pub noise: NoiseParameters,
    /// Noise behind the obstacle density map, single octave by default.
    #[serde(default = "NoiseParameters::obstacles")]
    pub obstacle_noise: NoiseParameters,
    pub density: DensityParameters,
    pub chunk_size: u32,
    pub palette: ColorPalette,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            noise: NoiseParameters::default(),
            obstacle_noise: NoiseParameters::obstacles(),
            density: DensityParameters::default(),
            chunk_size: 20,
            palette: ColorPalette::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading generator config from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GenerationError::config(e.to_string()))
    }

    /// Check every section up front so no generation starts on bad input.
    pub fn validate(&self) -> Result<()> {
        self.grid.vertex_shape()?;
        self.noise.validate()?;
        self.obstacle_noise.validate()?;
        self.density.validate()?;
        if self.chunk_size == 0 || self.grid.width % self.chunk_size != 0 {
            return Err(GenerationError::config(format!(
                "chunk_size {} must be positive and divide grid width {}",
                self.chunk_size, self.grid.width
            )));
        }
        if let ColorPalette::Custom(stops) = &self.palette {
            if stops.iter().all(|stop| stop.height.is_nan()) {
                return Err(GenerationError::config("custom palette has no usable color stops"));
            }
        }
        Ok(())
    }
}

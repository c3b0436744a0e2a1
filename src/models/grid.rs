use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Shape of a generation grid.
///
/// `width`/`height` are the world-space footprint in cells; `subdivisions`
/// splits every cell into `subdivisions x subdivisions` quads, so the vertex
/// grid resolution is independent of the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub width: u32,
    pub height: u32,
    pub subdivisions: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            subdivisions: 1,
        }
    }
}

impl GridSpec {
    pub fn new(width: u32, height: u32, subdivisions: u32) -> Self {
        Self {
            width,
            height,
            subdivisions,
        }
    }

    /// Quads along x: `width * subdivisions`.
    pub fn x_amount(&self) -> u64 {
        u64::from(self.width) * u64::from(self.subdivisions)
    }

    /// Quads along y: `height * subdivisions`.
    pub fn y_amount(&self) -> u64 {
        u64::from(self.height) * u64::from(self.subdivisions)
    }

    /// Rejects empty grids and zero subdivisions.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GenerationError::config(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.subdivisions == 0 {
            return Err(GenerationError::config("subdivisions must be at least 1"));
        }
        Ok(())
    }

    /// `(x_amount, y_amount)` as `u32`, provided the whole vertex grid
    /// `(x_amount + 1) * (y_amount + 1)` stays addressable by `u32` indices.
    pub fn vertex_shape(&self) -> Result<(u32, u32)> {
        self.validate()?;
        let (x_amount, y_amount) = (self.x_amount(), self.y_amount());
        let overflow = GenerationError::NumericOverflow { x_amount, y_amount };

        let vertices = (x_amount + 1).checked_mul(y_amount + 1).ok_or_else(|| {
            GenerationError::NumericOverflow { x_amount, y_amount }
        })?;
        if vertices > u64::from(u32::MAX) {
            return Err(overflow);
        }
        // Six indices per quad must also fit in memory on this platform.
        let indices = x_amount
            .checked_mul(y_amount)
            .and_then(|quads| quads.checked_mul(6))
            .filter(|&n| usize::try_from(n).is_ok());
        if indices.is_none() {
            return Err(overflow);
        }
        Ok((x_amount as u32, y_amount as u32))
    }

    /// Number of height samples in the vertex grid.
    pub fn vertex_count(&self) -> Result<usize> {
        let (x_amount, y_amount) = self.vertex_shape()?;
        Ok((x_amount as usize + 1) * (y_amount as usize + 1))
    }

    /// Number of cells in the density variant (`width * height`).
    pub fn cell_count(&self) -> Result<usize> {
        self.validate()?;
        usize::try_from(u64::from(self.width) * u64::from(self.height)).map_err(|_| {
            GenerationError::NumericOverflow {
                x_amount: u64::from(self.width),
                y_amount: u64::from(self.height),
            }
        })
    }

    /// Cell containing a world-space point, with cell `(x, y)` centred on
    /// the integer coordinate `(x, y)`. `None` outside the grid.
    pub fn cell_at(&self, world_x: f64, world_y: f64) -> Option<(u32, u32)> {
        let x = world_x.round();
        let y = world_y.round();
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        if x >= f64::from(self.width) || y >= f64::from(self.height) {
            return None;
        }
        Some((x as u32, y as u32))
    }

    /// Whether cell `(x, y)` lies on the outer ring of the grid.
    pub fn is_border(&self, x: u32, y: u32) -> bool {
        x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height
    }
}

use serde::{Deserialize, Serialize};

use crate::mesh::buffers::Rgba;

/// A color stop in a gradient, mapping a normalized height to a color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Normalized height value [0.0, 1.0]
    pub height: f32,

    /// Color at this height
    pub color: Rgba,
}

impl ColorStop {
    pub fn new(height: f32, color: [f32; 4]) -> Self {
        Self {
            height,
            color: color.into(),
        }
    }
}

/// Named color ramps, selectable from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ColorPalette {
    #[default]
    Earth,
    Grayscale,
    Desert,
    Custom(Vec<ColorStop>),
}

impl ColorPalette {
    pub fn build(&self) -> HeightColorMap {
        match self {
            ColorPalette::Earth => HeightColorMap::earth_style(),
            ColorPalette::Grayscale => HeightColorMap::grayscale(),
            ColorPalette::Desert => HeightColorMap::desert_style(),
            ColorPalette::Custom(stops) => HeightColorMap::new(stops.clone()),
        }
    }
}

/// Piecewise-linear color ramp over normalized height `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightColorMap {
    stops: Vec<ColorStop>,
}

impl Default for HeightColorMap {
    fn default() -> Self {
        Self::earth_style()
    }
}

impl HeightColorMap {
    /// Stops are sorted by height; NaN heights are dropped.
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.retain(|stop| !stop.height.is_nan());
        stops.sort_by(|a, b| a.height.total_cmp(&b.height));
        Self { stops }
    }

    /// Water -> sand -> grass -> rock -> snow
    pub fn earth_style() -> Self {
        Self::new(vec![
            // Deep water
            ColorStop::new(0.0, [0.05, 0.15, 0.45, 1.0]),
            // Shallow water
            ColorStop::new(0.3, [0.15, 0.4, 0.75, 1.0]),
            // Sand
            ColorStop::new(0.35, [0.8, 0.78, 0.55, 1.0]),
            // Grass
            ColorStop::new(0.45, [0.25, 0.6, 0.2, 1.0]),
            // Forest
            ColorStop::new(0.6, [0.15, 0.4, 0.15, 1.0]),
            // Rock
            ColorStop::new(0.75, [0.45, 0.4, 0.35, 1.0]),
            // Snow
            ColorStop::new(0.9, [0.95, 0.95, 0.95, 1.0]),
        ])
    }

    pub fn grayscale() -> Self {
        Self::new(vec![
            ColorStop::new(0.0, [0.0, 0.0, 0.0, 1.0]),
            ColorStop::new(1.0, [1.0, 1.0, 1.0, 1.0]),
        ])
    }

    /// Dune sand fading to red rock.
    pub fn desert_style() -> Self {
        Self::new(vec![
            ColorStop::new(0.0, [0.55, 0.4, 0.25, 1.0]),
            ColorStop::new(0.4, [0.85, 0.7, 0.45, 1.0]),
            ColorStop::new(0.7, [0.75, 0.45, 0.3, 1.0]),
            ColorStop::new(1.0, [0.5, 0.25, 0.2, 1.0]),
        ])
    }

    /// Color for a normalized height; values outside `[0, 1]` are clamped.
    pub fn interpolate(&self, height: f32) -> Rgba {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Rgba::MAGENTA,
        };
        let height = if height.is_nan() {
            0.0
        } else {
            height.clamp(0.0, 1.0)
        };

        if height <= first.height {
            return first.color;
        }
        if height >= last.height {
            return last.color;
        }

        // First stop strictly above `height`; both neighbours exist here.
        let upper = self.stops.partition_point(|stop| stop.height <= height);
        let lo = &self.stops[upper - 1];
        let hi = &self.stops[upper];
        let span = hi.height - lo.height;
        let t = if span > 0.0 {
            (height - lo.height) / span
        } else {
            0.0
        };
        lo.color.lerp(hi.color, t)
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }
}

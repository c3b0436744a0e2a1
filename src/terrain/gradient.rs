//! 2D gradient noise on a permutation-hashed integer lattice.

use std::sync::Arc;

use super::permutation::PermutationTable;

/// `1/sqrt(2)`, the nominal peak of the raw interpolated dot products.
const RAW_PEAK: f64 = 0.707_106_78;

/// Stateless Perlin-style noise kernel.
///
/// Cloning is cheap: the permutation table is shared.
#[derive(Debug, Clone)]
pub struct GradientNoise {
    table: Arc<PermutationTable>,
}

impl GradientNoise {
    pub fn new(table: Arc<PermutationTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<PermutationTable> {
        &self.table
    }

    /// Noise at `(x, y)`, in `[0, 1]`. Integer coordinates always give 0.5.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x_floor = x.floor();
        let y_floor = y.floor();
        // `as i64` then mask keeps negative floors on the right lattice cell.
        let xi = (x_floor as i64 & 255) as usize;
        let yi = (y_floor as i64 & 255) as usize;
        let fx = x - x_floor;
        let fy = y - y_floor;

        let bottom_left = dot(self.table.hash(xi, yi), fx, fy);
        let bottom_right = dot(self.table.hash(xi + 1, yi), fx - 1.0, fy);
        let top_left = dot(self.table.hash(xi, yi + 1), fx, fy - 1.0);
        let top_right = dot(self.table.hash(xi + 1, yi + 1), fx - 1.0, fy - 1.0);

        let u = fade(fx);
        let v = fade(fy);
        let value = lerp(
            lerp(bottom_left, bottom_right, u),
            lerp(top_left, top_right, u),
            v,
        );

        // Diagonal gradients can peak at 1.0 in a cell centre, above RAW_PEAK.
        ((value / RAW_PEAK + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Quintic fade `6t^5 - 15t^4 + 10t^3`.
#[inline]
pub fn fade(t: f64) -> f64 {
    ((6.0 * t - 15.0) * t + 10.0) * t * t * t
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Dot product of the corner gradient selected by the low two hash bits
/// with the offset `(dx, dy)`.
#[inline]
fn dot(hash: u8, dx: f64, dy: f64) -> f64 {
    match hash & 3 {
        0 => dx + dy,
        1 => -dx + dy,
        2 => -dx - dy,
        _ => dx - dy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise() -> GradientNoise {
        GradientNoise::new(Arc::new(PermutationTable::perlin()))
    }

    #[test]
    fn test_fade_endpoints() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lattice_points_are_half() {
        let noise = noise();
        for x in -20..20 {
            for y in -20..20 {
                assert_eq!(noise.sample(x as f64, y as f64), 0.5, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_output_range() {
        let noise = noise();
        for i in 0..200 {
            for j in 0..200 {
                let v = noise.sample(i as f64 * 0.137 - 13.0, j as f64 * 0.091 - 9.0);
                assert!((0.0..=1.0).contains(&v), "value {v} out of range");
            }
        }
    }

    #[test]
    fn test_continuous_across_cell_boundary() {
        let noise = noise();
        for y in [0.25, 1.5, 7.77, -3.3] {
            let left = noise.sample(3.999, y);
            let right = noise.sample(4.001, y);
            assert!((left - right).abs() < 0.01, "jump {left} -> {right} at y={y}");
        }
    }

    #[test]
    fn test_negative_coordinates_wrap_correctly() {
        let noise = noise();
        // The lattice repeats every 256 cells, including across zero.
        let a = noise.sample(-0.3, 0.7);
        let b = noise.sample(255.7, 0.7);
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_not_constant() {
        let noise = noise();
        let distinct = (0..100)
            .map(|i| noise.sample(i as f64 * 0.31 + 0.1, 0.4))
            .filter(|v| (v - 0.5).abs() > 0.01)
            .count();
        assert!(distinct > 50);
    }
}

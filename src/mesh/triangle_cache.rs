use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{GenerationError, Result};

/// Index buffers for regular vertex grids, keyed by `(x_amount, y_amount)`.
///
/// Entries are a pure function of their key, so they are never invalidated.
/// Two threads missing on the same key both compute the buffer; the first
/// insert wins and both get the stored one.
#[derive(Debug, Default)]
pub struct TriangleCache {
    entries: RwLock<HashMap<(u32, u32), Arc<[u32]>>>,
}

impl TriangleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index buffer for an `x_amount x y_amount` quad grid.
    ///
    /// Fails with [`GenerationError::NumericOverflow`] when the
    /// `(x_amount + 1) x (y_amount + 1)` vertex grid is not addressable by
    /// `u32` indices.
    pub fn get_or_build(&self, x_amount: u32, y_amount: u32) -> Result<Arc<[u32]>> {
        let key = (x_amount, y_amount);
        if let Some(triangles) = self.entries.read().get(&key) {
            log::debug!("triangle cache hit for {}x{}", x_amount, y_amount);
            return Ok(Arc::clone(triangles));
        }

        let vertices = (u64::from(x_amount) + 1) * (u64::from(y_amount) + 1);
        if vertices > u64::from(u32::MAX) {
            return Err(GenerationError::NumericOverflow {
                x_amount: u64::from(x_amount),
                y_amount: u64::from(y_amount),
            });
        }

        log::debug!("triangle cache miss for {}x{}", x_amount, y_amount);
        let built: Arc<[u32]> = grid_triangles(x_amount, y_amount).into();
        Ok(Arc::clone(self.entries.write().entry(key).or_insert(built)))
    }

    pub fn contains(&self, x_amount: u32, y_amount: u32) -> bool {
        self.entries.read().contains_key(&(x_amount, y_amount))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Two triangles per quad over a row-major `(x_amount + 1) x (y_amount + 1)`
/// vertex grid, wound so face normals point up (+y).
///
/// The vertex grid must fit in `u32`; callers check the shape first.
pub(crate) fn grid_triangles(x_amount: u32, y_amount: u32) -> Vec<u32> {
    let row = x_amount + 1;
    let mut triangles = Vec::with_capacity(x_amount as usize * y_amount as usize * 6);
    for y in 0..y_amount {
        for x in 0..x_amount {
            let vert = y * row + x;
            triangles.extend_from_slice(&[
                vert,
                vert + row,
                vert + 1,
                vert + 1,
                vert + row,
                vert + row + 1,
            ]);
        }
    }
    triangles
}

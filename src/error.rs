//! Error type shared by every generation entry point.

use thiserror::Error;

/// Why a generation request was refused or abandoned.
///
/// Validation errors are raised before any evaluation starts, so a failed
/// request never leaves partial buffers behind or touches the triangle cache.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Parameters outside their valid domain (zero octaves, empty grid, bad chunk size, ...).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The vertex grid would not fit into 32-bit index space.
    #[error("grid of {x_amount}x{y_amount} quads overflows the 32-bit vertex index space")]
    NumericOverflow { x_amount: u64, y_amount: u64 },

    /// Combined geometry exceeds what a 32-bit index buffer can address.
    #[error("mesh needs {vertices} vertices but the index format allows at most {limit}")]
    MeshTooLarge { vertices: u64, limit: u64 },

    /// The request was cancelled before the height field was complete.
    #[error("generation cancelled")]
    Cancelled,

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl GenerationError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

//! Error types for the DCGAN library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, DcganError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum DcganError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by libtorch
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Dataset files are missing or malformed
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Dataset has no samples to train on
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Tensor or array shape does not match what the model expects
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<i64>, actual: Vec<i64> },

    /// Batch too small for train-mode batch norm
    #[error("Batch of {size} image(s) is too small to train on, need at least {min}")]
    BatchTooSmall { size: usize, min: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Training diverged
    #[error("Non-finite loss at epoch {epoch}, step {step}: d_loss={d_loss}, g_loss={g_loss}")]
    NonFiniteLoss {
        epoch: usize,
        step: usize,
        d_loss: f64,
        g_loss: f64,
    },
}

impl DcganError {
    /// Build a shape mismatch error from anything convertible to dims
    pub fn shape_mismatch(expected: &[i64], actual: &[i64]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Whether the error was caused by numerical divergence
    pub fn is_divergence(&self) -> bool {
        matches!(self, Self::NonFiniteLoss { .. })
    }
}

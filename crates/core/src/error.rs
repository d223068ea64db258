//! Error types shared across the storefront recommendation platform
//!
//! The taxonomy separates failures that are fatal to an offline training run
//! (`Data`, `Config`) from failures the serving layer recovers from locally
//! (`ModelUnavailable`, `Store`). Serving code converts the latter into empty
//! results instead of propagating them to the API layer.

use thiserror::Error;

/// Platform-wide error type
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Malformed or empty training input. Fatal during training.
    #[error("invalid training data: {0}")]
    Data(String),

    /// Invalid hyperparameter or configuration value. Fatal during training.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Model artifact missing or corrupt at load time. The service starts
    /// with the affected model absent and degrades instead of crashing.
    #[error("model artifact unavailable at {path}: {reason}")]
    ModelUnavailable { path: String, reason: String },

    /// Store adapter query failed. Recovered per-method at the service layer.
    #[error("store query failed: {0}")]
    Store(#[from] sqlx::Error),

    /// Artifact encode/decode failed.
    #[error("artifact serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorefrontError {
    /// Construct a `Data` error from any message
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    /// Construct a `Config` error from any message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Construct a `ModelUnavailable` error for an artifact path
    pub fn model_unavailable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the serving layer degrades on rather than surfaces
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. } | Self::Store(_))
    }
}

//! Error handling for configuration loading and router construction
//!
//! Matching never fails; every error here surfaces while reading a route
//! table or registering it.

use std::io;
use thiserror::Error;
use trellis_core::RouterError;

/// Trellis error type covering all startup failure modes
#[derive(Debug, Error)]
pub enum TrellisError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Route registration errors
    #[error("Routing error: {0}")]
    Routing(#[from] RouterError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenient Result type for Trellis operations
pub type TrellisResult<T> = Result<T, TrellisError>;

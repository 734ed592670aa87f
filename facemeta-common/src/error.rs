//! Common error types for facemeta

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for facemeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the normalizer and the review service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested file or resource not found
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
}

//! Error types for facemeta-normalize

use crate::matfile::MatError;
use thiserror::Error;

/// Normalizer error
///
/// Field-level decode problems never surface here; they are replaced by
/// sentinels. These errors abort a run.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Archive could not be read or parsed
    #[error("Archive error: {0}")]
    Archive(#[from] MatError),

    /// Archive has no usable struct variable
    #[error("Archive has no struct variable '{0}'")]
    MissingVariable(String),

    /// Writing an output table failed
    #[error("Output error: {0}")]
    Output(#[from] facemeta_common::Error),
}

/// Result type for normalizer operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

//! # facemeta Common Library
//!
//! Shared code for the facemeta normalizer and review service:
//! - Normalized record schema, column sets and sentinel values
//! - Output table file names and table path resolution
//! - Configuration loading (TOML) and dataset root resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod record;

pub use error::{Error, Result};
pub use record::{Gender, NormalizedRecord};

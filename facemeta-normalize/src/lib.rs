//! # facemeta-normalize
//!
//! Decodes the IMDB and Wikipedia face-metadata archives (MATLAB Level-5
//! `.mat` files) into flat CSV tables.
//!
//! - [`matfile`]: MAT v5 container reader
//! - [`decode`]: per-field decoders with sentinel fallbacks
//! - [`partition`]: archive struct to normalized records
//! - [`output`]: CSV writers
//! - [`pipeline`]: the batch run

pub mod decode;
pub mod error;
pub mod matfile;
pub mod output;
pub mod partition;
pub mod pipeline;

pub use error::{NormalizeError, Result};
pub use partition::{DecodeStats, Partition, PartitionData};
pub use pipeline::{run, NormalizeOptions, NormalizeReport};

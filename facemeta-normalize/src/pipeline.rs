//! Batch normalization run
//!
//! Loads the primary partition (fatal on failure), then the optional secondary
//! partition (empty on failure), and writes the three flat tables.

use crate::error::Result;
use crate::output::{shuffle_rows, write_full_table, write_simplified_table};
use crate::partition::{load_partition, DecodeStats, Partition, PartitionData};
use facemeta_common::config::{PartitionConfig, PlausibilityLimits};
use facemeta_common::record::{
    NormalizedRecord, COMBINED_FULL_FILE, PRIMARY_FULL_FILE, SIMPLIFIED_FILE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Inputs of one normalization run
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub primary_archive: PathBuf,
    pub primary: PartitionConfig,
    /// `None` skips the secondary partition entirely
    pub secondary_archive: Option<PathBuf>,
    pub secondary: PartitionConfig,
    pub output_dir: PathBuf,
    pub limits: PlausibilityLimits,
    /// Shuffle seed for the simplified table; entropy-seeded when absent
    pub seed: Option<u64>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub primary: DecodeStats,
    pub secondary: DecodeStats,
    /// Rows in the combined table before filtering
    pub combined_rows: usize,
    /// Rows kept by the single-face filter
    pub kept_rows: usize,
    pub combined_table: PathBuf,
    pub primary_table: PathBuf,
    pub simplified_table: PathBuf,
}

fn load_secondary(archive: Option<&Path>, options: &NormalizeOptions) -> PartitionData {
    let Some(archive) = archive else {
        info!("Secondary partition disabled");
        return PartitionData::default();
    };
    if !archive.exists() {
        warn!(
            "Secondary archive {} not found; continuing with zero secondary records",
            archive.display()
        );
        return PartitionData::default();
    }
    match load_partition(archive, Partition::Secondary, &options.secondary, &options.limits) {
        Ok(data) => data,
        Err(e) => {
            warn!(
                "Secondary archive {} unreadable ({}); continuing with zero secondary records",
                archive.display(),
                e
            );
            PartitionData::default()
        }
    }
}

/// Records kept in the combined and simplified tables
pub fn single_face_records(records: &[NormalizedRecord]) -> Vec<&NormalizedRecord> {
    records.iter().filter(|r| r.is_single_face()).collect()
}

/// Run the whole normalization
pub fn run(options: &NormalizeOptions) -> Result<NormalizeReport> {
    let primary = load_partition(
        &options.primary_archive,
        Partition::Primary,
        &options.primary,
        &options.limits,
    )?;
    let secondary = load_secondary(options.secondary_archive.as_deref(), options);

    let primary_count = primary.records.len();
    let mut combined = primary.records;
    combined.extend(secondary.records);

    let kept = single_face_records(&combined);
    info!(
        "Single-face filter kept {} of {} records",
        kept.len(),
        combined.len()
    );

    fs::create_dir_all(&options.output_dir).map_err(facemeta_common::Error::from)?;
    let report = NormalizeReport {
        primary: primary.stats,
        secondary: secondary.stats,
        combined_rows: combined.len(),
        kept_rows: kept.len(),
        combined_table: options.output_dir.join(COMBINED_FULL_FILE),
        primary_table: options.output_dir.join(PRIMARY_FULL_FILE),
        simplified_table: options.output_dir.join(SIMPLIFIED_FILE),
    };

    let filtered: Vec<NormalizedRecord> = kept.iter().map(|r| (*r).clone()).collect();
    write_full_table(&report.combined_table, &filtered)?;
    write_full_table(&report.primary_table, &combined[..primary_count])?;

    let mut simplified = kept;
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    shuffle_rows(&mut simplified, &mut rng);
    write_simplified_table(&report.simplified_table, &simplified)?;

    Ok(report)
}

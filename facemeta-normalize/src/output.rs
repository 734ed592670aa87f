//! Flat table writers
//!
//! Tables are written to `<name>.tmp` and renamed into place, so an
//! interrupted run never leaves a half-written CSV behind.

use facemeta_common::record::{NormalizedRecord, FULL_COLUMNS, SIMPLIFIED_COLUMNS};
use facemeta_common::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn write_rows<const N: usize>(
    target: &Path,
    header: &[&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<usize> {
    let tmp = temp_path(target);
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(header)?;

    let mut count = 0;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, target)?;
    info!("Wrote {} rows to {}", count, target.display());
    Ok(count)
}

/// Write records with every column
pub fn write_full_table(target: &Path, records: &[NormalizedRecord]) -> Result<usize> {
    write_rows(target, &FULL_COLUMNS, records.iter().map(NormalizedRecord::full_row))
}

/// Write records with the simplified column set, in the given order
pub fn write_simplified_table(target: &Path, records: &[&NormalizedRecord]) -> Result<usize> {
    write_rows(
        target,
        &SIMPLIFIED_COLUMNS,
        records.iter().map(|r| r.simplified_row()),
    )
}

/// Uniform random permutation of the rows
pub fn shuffle_rows<T, R: Rng + ?Sized>(rows: &mut [T], rng: &mut R) {
    rows.shuffle(rng);
}

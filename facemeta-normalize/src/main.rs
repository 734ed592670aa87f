//! facemeta-normalize - Face metadata archive normalizer
//!
//! Decodes the primary (IMDB) and secondary (Wikipedia) `.mat` archives and
//! writes `meta_full.csv`, `imdb_meta_full.csv` and `meta.csv`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use facemeta_common::config::{resolve_root_folder, resolve_under, TomlConfig};
use facemeta_normalize::{run, NormalizeOptions};
use tracing::info;

/// Command-line arguments for facemeta-normalize
#[derive(Parser, Debug)]
#[command(name = "facemeta-normalize")]
#[command(about = "Normalize celebrity face metadata archives into CSV tables")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset root folder
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Primary archive (default: imdb_crop/imdb.mat under the root)
    #[arg(long)]
    primary: Option<PathBuf>,

    /// Secondary archive (default: wiki_crop/wiki.mat under the root)
    #[arg(long, conflicts_with = "no_secondary")]
    secondary: Option<PathBuf>,

    /// Skip the secondary partition
    #[arg(long)]
    no_secondary: bool,

    /// Output directory for the CSV tables (default: the root)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seed for the simplified-table shuffle
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting facemeta-normalize v{}", env!("CARGO_PKG_VERSION"));

    let root = resolve_root_folder(args.root.as_deref(), &config);
    info!("Dataset root: {}", root.display());

    let settings = config.normalize;
    let primary_archive = resolve_under(
        &root,
        args.primary.as_deref().unwrap_or(settings.primary.archive.as_path()),
    );
    let secondary_archive = if args.no_secondary {
        None
    } else {
        Some(resolve_under(
            &root,
            args.secondary.as_deref().unwrap_or(settings.secondary.archive.as_path()),
        ))
    };
    let output_dir = args
        .output_dir
        .or(settings.output_dir)
        .map(|dir| resolve_under(&root, &dir))
        .unwrap_or_else(|| root.clone());

    let options = NormalizeOptions {
        primary_archive,
        primary: settings.primary,
        secondary_archive,
        secondary: settings.secondary,
        output_dir,
        limits: settings.limits,
        seed: args.seed.or(settings.seed),
    };

    let report = run(&options).with_context(|| {
        format!(
            "Normalization failed for {}",
            options.primary_archive.display()
        )
    })?;

    info!("Primary: {}", report.primary);
    info!("Secondary: {}", report.secondary);
    info!(
        "Kept {} of {} combined records",
        report.kept_rows, report.combined_rows
    );
    info!("Wrote {}", report.combined_table.display());
    info!("Wrote {}", report.primary_table.display());
    info!("Wrote {}", report.simplified_table.display());

    Ok(())
}

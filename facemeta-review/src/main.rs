//! facemeta-review - Read-only browser for the normalized face metadata
//!
//! Loads one flat table (CSV) and serves it through a small JSON API and a
//! bundled web UI, together with the face images it references.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use facemeta_common::config::{resolve_root_folder, resolve_table_path, resolve_under, TomlConfig};
use facemeta_review::cache::TableCache;
use facemeta_review::images::ImageStore;
use facemeta_review::{build_router, AppState};
use tracing::info;

/// Command-line arguments for facemeta-review
#[derive(Parser, Debug)]
#[command(name = "facemeta-review")]
#[command(about = "Browse normalized face metadata and images")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset root folder
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Flat table to serve (default: imdb_meta_full.csv, else meta.csv)
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Directory the image paths are relative to (default: the root)
    #[arg(short, long)]
    image_root: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    bind: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Load the table on the first request instead of at startup
    #[arg(long)]
    lazy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Log build identification immediately after tracing init
    info!("Starting facemeta-review v{}", env!("CARGO_PKG_VERSION"));

    let root = resolve_root_folder(args.root.as_deref(), &config);
    let settings = config.review;

    let table_path = resolve_table_path(&root, args.table.as_deref().or(settings.table.as_deref()));
    let image_root = args
        .image_root
        .or(settings.image_root)
        .map(|dir| resolve_under(&root, &dir))
        .unwrap_or_else(|| root.clone());
    info!("Table: {}", table_path.display());
    info!("Image root: {}", image_root.display());

    let state = AppState::new(TableCache::new(table_path), ImageStore::new(image_root));
    if settings.preload && !args.lazy {
        let table = state.table.table().await;
        info!("Preloaded {} rows", table.len());
    }

    let app = build_router(state);

    let bind = args.bind.unwrap_or(settings.bind);
    let port = args.port.unwrap_or(settings.port);
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("facemeta-review listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

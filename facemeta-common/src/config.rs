//! Configuration loading and dataset root resolution
//!
//! Both binaries read the same optional TOML file. A missing config file is
//! not an error: every setting has a built-in default. Settings sources, in
//! priority order:
//! 1. Command-line arguments
//! 2. Environment variables (`FACEMETA_ROOT`, `FACEMETA_CONFIG`)
//! 3. TOML configuration file
//! 4. Built-in defaults

use crate::record::{PRIMARY_FULL_FILE, SIMPLIFIED_FILE};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the dataset root folder
pub const ROOT_ENV_VAR: &str = "FACEMETA_ROOT";

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "FACEMETA_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Dataset root folder (contains the archives, CSV tables and image folders)
    pub root_folder: Option<PathBuf>,

    pub logging: LoggingConfig,

    pub normalize: NormalizeConfig,

    pub review: ReviewConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Normalizer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Where the CSV tables are written (default: dataset root)
    pub output_dir: Option<PathBuf>,

    /// Seed for the simplified-table shuffle; unseeded when absent
    pub seed: Option<u64>,

    pub limits: PlausibilityLimits,

    #[serde(default = "PartitionConfig::primary")]
    pub primary: PartitionConfig,

    #[serde(default = "PartitionConfig::secondary")]
    pub secondary: PartitionConfig,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            seed: None,
            limits: PlausibilityLimits::default(),
            primary: PartitionConfig::primary(),
            secondary: PartitionConfig::secondary(),
        }
    }
}

/// Bounds used to reject implausible dates and ages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlausibilityLimits {
    /// Earliest accepted birth year (inclusive)
    pub dob_year_min: i32,
    /// Latest accepted birth year (inclusive)
    pub dob_year_max: i32,
    /// Capture years must be strictly greater than this
    pub photo_year_min: i32,
    /// Capture years must be strictly less than this
    pub photo_year_max: i32,
    /// Largest accepted age (inclusive)
    pub max_age: i32,
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        Self {
            dob_year_min: 1850,
            dob_year_max: 2025,
            photo_year_min: 1900,
            photo_year_max: 2023,
            max_age: 100,
        }
    }
}

/// One source partition (archive file + the struct variable inside it)
///
/// When a `[normalize.primary]` or `[normalize.secondary]` section is present
/// all three keys must be given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartitionConfig {
    /// Archive path, relative to the dataset root unless absolute
    pub archive: PathBuf,
    /// Name of the struct variable holding the per-field arrays
    pub variable: String,
    /// Prefix prepended to every stored path fragment
    pub path_prefix: String,
}

impl PartitionConfig {
    /// IMDB partition defaults
    pub fn primary() -> Self {
        Self {
            archive: PathBuf::from("imdb_crop/imdb.mat"),
            variable: "imdb".to_string(),
            path_prefix: "imdb_crop/".to_string(),
        }
    }

    /// Wikipedia partition defaults
    pub fn secondary() -> Self {
        Self {
            archive: PathBuf::from("wiki_crop/wiki.mat"),
            variable: "wiki".to_string(),
            path_prefix: "wiki_crop/".to_string(),
        }
    }
}

/// Review service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Listen address
    pub bind: String,
    /// Listen port
    pub port: u16,
    /// Flat table to serve (default: full table if present, else simplified)
    pub table: Option<PathBuf>,
    /// Image root directory (default: dataset root)
    pub image_root: Option<PathBuf>,
    /// Load the table at startup instead of on the first request
    pub preload: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            table: None,
            image_root: None,
            preload: true,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration
    ///
    /// An explicit path (CLI) must exist and parse. Otherwise the file named by
    /// `FACEMETA_CONFIG`, then `<config dir>/facemeta/config.toml`, is tried; if
    /// none exists the built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::NotFound(path.to_path_buf()));
            }
            return Self::load_file(path);
        }

        match discover_config_file() {
            Some(path) => Self::load_file(&path),
            None => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Locate a config file via `FACEMETA_CONFIG` or the platform config dir
fn discover_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        warn!("{} points to missing file {}", CONFIG_ENV_VAR, path.display());
    }

    dirs::config_dir()
        .map(|d| d.join("facemeta").join("config.toml"))
        .filter(|p| p.exists())
}

/// Resolve the dataset root folder
///
/// Priority: command-line argument, `FACEMETA_ROOT`, TOML `root_folder`,
/// current directory.
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    PathBuf::from(".")
}

/// Interpret `path` relative to `root` unless it is absolute
pub fn resolve_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Pick the flat table the review service should load
///
/// An explicit table wins. Otherwise the primary full table is used when it
/// exists, falling back to the simplified table.
pub fn resolve_table_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return resolve_under(root, path);
    }

    let full = root.join(PRIMARY_FULL_FILE);
    if full.exists() {
        full
    } else {
        root.join(SIMPLIFIED_FILE)
    }
}

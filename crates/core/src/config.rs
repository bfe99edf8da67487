//! Service configuration.

use std::{
    fs,
    path::{Path, PathBuf},
    thread::available_parallelism,
};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    io::ensure_dir,
    subsets::{SubsetDefinition, default_subsets, load_subsets},
};

/// Default stylesheet cache lifetime (one day).
pub const DEFAULT_CACHE_MAX_AGE: u64 = 86_400;

/// Default artifact cache lifetime (one year; artifacts are content-addressed).
pub const DEFAULT_FONT_MAX_AGE: u64 = 31_536_000;

/// Default share of CPUs given to the build pool.
pub const DEFAULT_WORKER_FRACTION: f64 = 0.5;

/// Runtime configuration, loadable from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source fonts (`*.ttf`, `*.otf`).
    pub font_dir: PathBuf,
    /// Built artifacts: `{cache_dir}/{key}.woff2`.
    pub cache_dir: PathBuf,
    /// Metadata records: `{meta_dir}/{family}/{key}.json`.
    pub meta_dir: PathBuf,
    /// JSON array of range specs; the built-in table when unset.
    pub subsets_file: Option<PathBuf>,
    /// Prefix for URLs in the font listing.
    pub base_url: String,
    /// Path under which artifacts are served.
    pub artifact_url_prefix: String,
    pub cache_max_age: u64,
    pub font_max_age: u64,
    /// Fraction of available CPUs used for subset builds.
    pub worker_fraction: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_dir: PathBuf::from("fonts"),
            cache_dir: PathBuf::from("data/cache"),
            meta_dir: PathBuf::from("data/meta"),
            subsets_file: None,
            base_url: String::new(),
            artifact_url_prefix: "/s".to_string(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            font_max_age: DEFAULT_FONT_MAX_AGE,
            worker_fraction: DEFAULT_WORKER_FRACTION,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |message: String| Error::Config { path: path.to_path_buf(), message };

        let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?;
        if config.worker_fraction.is_nan() || config.worker_fraction <= 0.0 {
            return Err(config_error(format!(
                "worker_fraction must be positive, got {}",
                config.worker_fraction
            )));
        }
        Ok(config)
    }

    /// Create the font, cache and metadata directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        ensure_dir(&self.font_dir)?;
        ensure_dir(&self.cache_dir)?;
        ensure_dir(&self.meta_dir)
    }

    /// The subset table this configuration selects.
    pub fn subsets(&self) -> Result<Vec<SubsetDefinition>> {
        match &self.subsets_file {
            Some(path) => load_subsets(path),
            None => Ok(default_subsets()),
        }
    }

    /// Worker count for the build pool: a fraction of the available CPUs, at least one.
    pub fn worker_count(&self) -> usize {
        let cpus = available_parallelism().map(|n| n.get()).unwrap_or(1);
        worker_count_for(cpus, self.worker_fraction)
    }
}

/// `floor(cpus * fraction)` with the fraction clamped to (0, 1], never below one.
pub fn worker_count_for(cpus: usize, fraction: f64) -> usize {
    let fraction =
        if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { DEFAULT_WORKER_FRACTION };
    ((cpus as f64 * fraction).floor() as usize).clamp(1, cpus.max(1))
}

//! TOML configuration for accelprobe.
//!
//! Every section is optional. The config file path comes from `--config`, the
//! `ACCELPROBE_CONFIG` environment variable, or the standard system location,
//! falling back to compiled-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::opencl::DeviceType;
use crate::probe::ProbeOptions;

pub const CONFIG_ENV: &str = "ACCELPROBE_CONFIG";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/accelprobe/accelprobe.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub opencl: OpenClConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProbeConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded accelprobe configuration");
        Ok(config)
    }

    /// Try `ACCELPROBE_CONFIG`, then `/etc/accelprobe/accelprobe.toml`, then defaults.
    ///
    /// A candidate that cannot be loaded is logged at `warn` and skipped.
    pub fn load_or_default() -> Self {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        for candidate in config_candidates(env_path) {
            if !candidate.explicit && !candidate.path.exists() {
                continue;
            }
            match Self::load(&candidate.path) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(
                    path = %candidate.path.display(),
                    error = %e,
                    "{}",
                    candidate.on_failure
                ),
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            platform_index: self.opencl.platform_index,
            device_type: self.opencl.device_type,
        }
    }
}

/// A config file location, in lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    path: PathBuf,
    /// Named by the user; tried even when the file is missing.
    explicit: bool,
    on_failure: &'static str,
}

fn config_candidates(env_path: Option<PathBuf>) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(path) = env_path {
        candidates.push(Candidate {
            path,
            explicit: true,
            on_failure: "ACCELPROBE_CONFIG set but file could not be loaded, trying fallback",
        });
    }
    candidates.push(Candidate {
        path: PathBuf::from(SYSTEM_CONFIG_PATH),
        explicit: false,
        on_failure: "system config file exists but could not be loaded, using defaults",
    });
    candidates
}

// ---------------------------------------------------------------------------
// OpenCL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenClConfig {
    /// Runtime libraries to try, in order. Empty means the built-in list.
    pub library_paths: Vec<PathBuf>,
    /// Index into the platform list reported by the ICD loader.
    pub platform_index: usize,
    pub device_type: DeviceType,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Console layout, streamed as each attribute is read.
    #[default]
    Text,
    /// One pretty-printed JSON document after the run completes.
    Json,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

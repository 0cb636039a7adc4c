//! Loads the optional YAML run config into typed structs.
//!
//! The file only carries run-shaping defaults (artifact directories and
//! fallback region/compartment lists); explicit CLI flags always win. This
//! is the only place untrusted YAML is parsed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub output: OutputSection,
    /// Regions to walk when `--region` is not given (empty: all subscribed).
    #[serde(default)]
    pub regions: Vec<String>,
    /// Compartment OCIDs to walk when `--compartment` is not given (empty:
    /// all compartments in the tenancy).
    #[serde(default)]
    pub compartments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_metrics_dir")]
    pub metrics_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            metrics_dir: default_metrics_dir(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_metrics_dir() -> PathBuf {
    PathBuf::from("Metrics")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("Logs")
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading run configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str(&content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

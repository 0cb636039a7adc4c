//! Resolved run configuration: what to inventory, where, and where the
//! artifacts go.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::{debug, info};

/// Profile used when the caller does not name one.
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// The resource kind being inventoried in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Workload {
    Instances,
    ObjectStorage,
    DbSystems,
    OkeClusters,
}

impl Workload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Workload::Instances => "instances",
            Workload::ObjectStorage => "object_storage",
            Workload::DbSystems => "db_systems",
            Workload::OkeClusters => "oke_clusters",
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a run needs, resolved from CLI flags and the optional YAML
/// run config. Empty region/compartment lists mean "discover all".
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub workload: Workload,
    pub profile: String,
    pub regions: Vec<String>,
    pub compartments: Vec<String>,
    pub metrics_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Run timestamp (`%Y%m%d%H%M%S`), shared by the workbook and log names.
    pub timestamp: String,
}

impl RunConfig {
    fn artifact_name(&self, extension: &str) -> String {
        format!(
            "{}_{}_{}.{}",
            self.profile, self.workload, self.timestamp, extension
        )
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.metrics_dir.join(self.artifact_name("xlsx"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(self.artifact_name("log"))
    }

    pub fn trace_loaded(&self) {
        info!(
            workload = %self.workload,
            profile = %self.profile,
            regions = self.regions.len(),
            compartments = self.compartments.len(),
            metrics_dir = %self.metrics_dir.display(),
            "Run configuration resolved"
        );
        debug!(?self, "Run configuration (full debug)");
    }
}

/// Looks a binary up on `PATH`, like `shutil.which`.
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| Path::new(candidate).is_file())
}

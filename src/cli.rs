//! CLI surface and run entrypoint.
//!
//! Argument parsing, pre-flight tool checks and the workload dispatch live
//! here; everything else (provider contract, collection loops, workbook) is
//! in the library modules. [`run`] is async and takes a resolved
//! [`RunConfig`], so integration tests can invoke it programmatically the
//! same way `main` does.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use crate::collect::{
    collect_buckets, collect_clusters, collect_db_systems, collect_instances, resolve_scopes,
};
use crate::config::{find_in_path, RunConfig, Workload, DEFAULT_PROFILE};
use crate::contract::SourceError;
use crate::kubernetes::KubectlInventory;
use crate::load_config::{load_config, FileConfig};
use crate::oci::OciCliSource;
use crate::workbook::SizingWorkbook;

/// CLI for oci-sizing: inventory one workload kind across a tenancy and
/// write an xlsx sizing report.
#[derive(Parser)]
#[clap(
    name = "oci-sizing",
    version,
    about = "Inventory OCI instances, buckets, DB systems or OKE clusters into an xlsx sizing report"
)]
pub struct Cli {
    /// Resource kind to inventory
    #[clap(long, value_enum)]
    pub workload: Workload,

    /// OCI CLI profile used for every provider call
    #[clap(long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Region names to walk (comma-separated; default: all subscribed)
    #[clap(long, value_delimiter = ',')]
    pub region: Vec<String>,

    /// Compartment OCIDs to walk (comma-separated; default: all in tenancy)
    #[clap(long, value_delimiter = ',')]
    pub compartment: Vec<String>,

    /// Optional YAML run config (output directories, default scopes)
    #[clap(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Merges the flags with the optional YAML config into a [`RunConfig`].
    /// Explicit flags win over config values.
    pub fn into_run_config(self) -> Result<RunConfig> {
        let file = match &self.config {
            Some(path) => load_config(path)?,
            None => FileConfig::default(),
        };
        let regions = if self.region.is_empty() {
            file.regions
        } else {
            self.region
        };
        let compartments = if self.compartment.is_empty() {
            file.compartments
        } else {
            self.compartment
        };
        Ok(RunConfig {
            workload: self.workload,
            profile: self.profile,
            regions,
            compartments,
            metrics_dir: file.output.metrics_dir,
            log_dir: file.output.log_dir,
            timestamp: Local::now().format("%Y%m%d%H%M%S").to_string(),
        })
    }
}

/// Verifies the external tools the selected workload shells out to exist
/// before any provider call is made.
pub fn preflight(workload: Workload) -> Result<()> {
    require_tool("oci")?;
    if workload == Workload::OkeClusters {
        require_tool("kubectl")?;
    }
    Ok(())
}

fn require_tool(name: &str) -> Result<()> {
    match find_in_path(name) {
        Some(path) => {
            info!(tool = name, path = %path.display(), "Found required tool");
            Ok(())
        }
        None => {
            error!(tool = name, "Required tool not found on PATH");
            bail!("required tool '{name}' not found on PATH")
        }
    }
}

/// Async run entrypoint for `main` and for integration tests.
pub async fn run(config: RunConfig) -> Result<()> {
    preflight(config.workload)?;

    let source = OciCliSource::new(config.profile.clone());
    let scopes = resolve_scopes(&source, &config.regions, &config.compartments)
        .await
        .map_err(|e| anyhow::Error::msg(format!("Failed to resolve regions/compartments: {e}")))?;

    std::fs::create_dir_all(&config.metrics_dir).with_context(|| {
        format!(
            "creating metrics directory {}",
            config.metrics_dir.display()
        )
    })?;
    let mut book = SizingWorkbook::new(config.workload);

    match config.workload {
        Workload::Instances => {
            collect_instances(&source, &scopes, &mut book)
                .await
                .map_err(collect_failure)?;
        }
        Workload::ObjectStorage => {
            collect_buckets(&source, &scopes, &mut book)
                .await
                .map_err(collect_failure)?;
        }
        Workload::DbSystems => {
            collect_db_systems(&source, &scopes, &mut book)
                .await
                .map_err(collect_failure)?;
        }
        Workload::OkeClusters => {
            let inventory = KubectlInventory::new(config.profile.clone());
            collect_clusters(&source, &inventory, &scopes, &mut book)
                .await
                .map_err(collect_failure)?;
        }
    }

    let path = config.workbook_path();
    book.finalize(&path)
        .with_context(|| format!("saving workbook {}", path.display()))?;
    info!(workbook = %path.display(), "Sizing report written");
    Ok(())
}

fn collect_failure(e: SourceError) -> anyhow::Error {
    anyhow::Error::msg(format!("Collection failed: {e}"))
}

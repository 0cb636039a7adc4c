//! Live OKE cluster inventory via a kubeconfig round-trip.
//!
//! For each cluster a short-lived kubeconfig is generated with
//! `oci ce cluster create-kubeconfig` into a temp file, `kubectl` is asked
//! for the cluster's PVCs and nodes as JSON, and the kubeconfig is removed
//! again on every path (the temp file deletes itself on drop).

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::contract::{ClusterInventory, ClusterLiveInventory, SourceError};

const GIB_BYTES: f64 = 1024.0 * 1024.0 * 1024.0;

static QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)(Ki|Mi|Gi|Ti|Pi|k|M|G|T|P)?$").unwrap());

/// Parses a Kubernetes storage quantity ("10Gi", "500Mi", a bare byte
/// count, …) into GiB. Returns `None` for anything unparseable.
pub fn storage_quantity_to_gib(raw: &str) -> Option<f64> {
    let caps = QUANTITY.captures(raw.trim())?;
    let value: f64 = caps[1].parse().ok()?;
    let gib = match caps.get(2).map(|m| m.as_str()) {
        None => value / GIB_BYTES,
        Some("Ki") => value / (1024.0 * 1024.0),
        Some("Mi") => value / 1024.0,
        Some("Gi") => value,
        Some("Ti") => value * 1024.0,
        Some("Pi") => value * 1024.0 * 1024.0,
        Some("k") => value * 1e3 / GIB_BYTES,
        Some("M") => value * 1e6 / GIB_BYTES,
        Some("G") => value * 1e9 / GIB_BYTES,
        Some("T") => value * 1e12 / GIB_BYTES,
        Some("P") => value * 1e15 / GIB_BYTES,
        Some(_) => return None,
    };
    Some(gib)
}

#[derive(Debug, Deserialize)]
struct KubeList<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Pvc {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: PvcSpec,
}

#[derive(Debug, Default, Deserialize)]
struct PvcSpec {
    #[serde(default)]
    resources: PvcResources,
}

#[derive(Debug, Default, Deserialize)]
struct PvcResources {
    #[serde(default)]
    requests: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct Node {
    #[serde(default)]
    metadata: ObjectMeta,
}

/// Counted/sized persistent volume claims for one cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PvcInventory {
    /// `namespace/name`, only for claims that carry a name.
    pub names: Vec<String>,
    pub size_gb: f64,
}

/// Parses `kubectl get pvc -A -o json` output.
pub fn parse_pvc_inventory(json: &str) -> Result<PvcInventory, SourceError> {
    let list: KubeList<Pvc> = serde_json::from_str(json)?;
    let mut inventory = PvcInventory::default();
    for pvc in &list.items {
        let Some(name) = pvc.metadata.name.as_deref() else {
            continue;
        };
        let namespace = pvc.metadata.namespace.as_deref().unwrap_or("default");
        inventory.names.push(format!("{namespace}/{name}"));
        if let Some(request) = pvc.spec.resources.requests.get("storage") {
            inventory.size_gb += storage_quantity_to_gib(request).unwrap_or(0.0);
        }
    }
    Ok(inventory)
}

/// Parses `kubectl get nodes -o json` output into node names.
pub fn parse_node_names(json: &str) -> Result<Vec<String>, SourceError> {
    let list: KubeList<Node> = serde_json::from_str(json)?;
    Ok(list
        .items
        .into_iter()
        .filter_map(|node| node.metadata.name)
        .collect())
}

/// [`ClusterInventory`] backed by the `oci` and `kubectl` binaries.
pub struct KubectlInventory {
    profile: String,
}

impl KubectlInventory {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn create_kubeconfig(
        &self,
        region: &str,
        cluster_id: &str,
        path: &Path,
    ) -> Result<(), SourceError> {
        let output = Command::new("oci")
            .args(["ce", "cluster", "create-kubeconfig"])
            .arg("--cluster-id")
            .arg(cluster_id)
            .arg("--file")
            .arg(path)
            .arg("--region")
            .arg(region)
            .args(["--token-version", "2.0.0"])
            .args(["--kube-endpoint", "PRIVATE_ENDPOINT"])
            .arg("--profile")
            .arg(&self.profile)
            .output()
            .map_err(|e| format!("failed to launch oci: {e}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "oci ce cluster create-kubeconfig exited with {}: {}",
                output.status,
                stderr.trim()
            )
            .into());
        }
        info!(path = %path.display(), cluster = %cluster_id, "Kubeconfig created");
        Ok(())
    }
}

fn kubectl_json(kubeconfig: &Path, args: &[&str]) -> Result<String, SourceError> {
    let output = Command::new("kubectl")
        .arg("--kubeconfig")
        .arg(kubeconfig)
        .args(args)
        .args(["-o", "json"])
        .output()
        .map_err(|e| format!("failed to launch kubectl: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "kubectl {} exited with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        )
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl ClusterInventory for KubectlInventory {
    async fn cluster_inventory(
        &self,
        region: &str,
        cluster_id: &str,
    ) -> Result<ClusterLiveInventory, SourceError> {
        // Deleted on drop, success or not.
        let kubeconfig = tempfile::Builder::new()
            .prefix("kubeconfig_")
            .tempfile()
            .map_err(|e| format!("failed to create kubeconfig temp file: {e}"))?;

        self.create_kubeconfig(region, cluster_id, kubeconfig.path())?;

        let pvcs = parse_pvc_inventory(&kubectl_json(
            kubeconfig.path(),
            &["get", "pvc", "-A"],
        )?)?;

        // A node query failure degrades nodes to zero without discarding
        // the PVC inventory.
        let node_names = match kubectl_json(kubeconfig.path(), &["get", "nodes"])
            .and_then(|json| parse_node_names(&json))
        {
            Ok(names) => names,
            Err(e) => {
                warn!(cluster = %cluster_id, error = %e, "Could not fetch nodes");
                Vec::new()
            }
        };

        Ok(ClusterLiveInventory {
            node_names,
            pvc_names: pvcs.names,
            pvc_size_gb: pvcs.size_gb,
        })
    }
}

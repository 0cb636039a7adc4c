//! Typed detail records, one family per workload.
//!
//! Each record is one row in the workload's detail sheet. Normalization from
//! the provider's records happens in the constructors here: storage sums,
//! volume counts, byte-to-GB conversion, and degraded defaults when a
//! secondary lookup failed. TB figures are methods, derived from the row's
//! own GB figure (see [`crate::rollup`]).

use crate::contract::{
    BucketStats, ClusterLiveInventory, ClusterRecord, DbSystemRecord, DefinedTags, FreeformTags,
    InstanceRecord, InstanceStorage,
};
use crate::rollup::{round2, tb_from_gb};
use crate::workbook::Cell;

const GIB_BYTES: f64 = 1024.0 * 1024.0 * 1024.0;

/// Instances and DB systems in this state are excluded from enumeration.
pub fn is_terminated(lifecycle_state: &str) -> bool {
    lifecycle_state == "TERMINATED"
}

/// Clusters in this state are excluded from enumeration.
pub fn is_deleted(lifecycle_state: &str) -> bool {
    lifecycle_state == "DELETED"
}

/// Tag maps render verbatim into a single cell as JSON.
fn render_defined_tags(tags: &DefinedTags) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| String::from("{}"))
}

fn render_freeform_tags(tags: &FreeformTags) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| String::from("{}"))
}

/// One discovered compute instance with its attached storage.
#[derive(Debug, Clone)]
pub struct InstanceDetail {
    pub compartment_id: String,
    pub instance_id: String,
    pub instance_name: String,
    pub region: String,
    pub availability_domain: String,
    pub shape: String,
    pub state: String,
    pub volume_count: u64,
    pub size_gb: f64,
    pub boot_volume_name: Option<String>,
    pub block_volume_names: Vec<String>,
    pub defined_tags: DefinedTags,
    pub freeform_tags: FreeformTags,
}

impl InstanceDetail {
    pub fn from_record(
        region: &str,
        compartment_id: &str,
        record: InstanceRecord,
        storage: InstanceStorage,
    ) -> Self {
        let boot_gb = storage
            .boot_volume
            .as_ref()
            .map(|v| v.size_gb)
            .unwrap_or(0.0);
        let block_gb: f64 = storage.block_volumes.iter().map(|v| v.size_gb).sum();
        let volume_count =
            u64::from(boot_gb > 0.0) + storage.block_volumes.len() as u64;
        Self {
            compartment_id: compartment_id.to_string(),
            instance_id: record.id,
            instance_name: record.display_name,
            region: region.to_string(),
            availability_domain: record.availability_domain,
            shape: record.shape,
            state: record.lifecycle_state,
            volume_count,
            size_gb: boot_gb + block_gb,
            boot_volume_name: storage.boot_volume.map(|v| v.name),
            block_volume_names: storage.block_volumes.into_iter().map(|v| v.name).collect(),
            defined_tags: record.defined_tags,
            freeform_tags: record.freeform_tags,
        }
    }

    pub fn size_tb(&self) -> f64 {
        tb_from_gb(self.size_gb)
    }

    pub fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.compartment_id),
            Cell::text(&self.instance_id),
            Cell::text(&self.instance_name),
            Cell::text(&self.region),
            Cell::text(&self.availability_domain),
            Cell::text(&self.shape),
            Cell::text(&self.state),
            Cell::Int(self.volume_count),
            Cell::Float(self.size_gb),
            Cell::Float(self.size_tb()),
            Cell::text(self.boot_volume_name.as_deref().unwrap_or("")),
            Cell::Text(self.block_volume_names.join(", ")),
            Cell::Text(render_defined_tags(&self.defined_tags)),
            Cell::Text(render_freeform_tags(&self.freeform_tags)),
        ]
    }
}

/// One discovered object storage bucket.
#[derive(Debug, Clone)]
pub struct BucketDetail {
    pub namespace: String,
    pub compartment_id: String,
    pub bucket_name: String,
    pub region: String,
    pub storage_tier: String,
    pub object_count: u64,
    pub size_gb: f64,
    pub defined_tags: DefinedTags,
    pub freeform_tags: FreeformTags,
}

impl BucketDetail {
    /// `stats` is `None` when the per-bucket stat lookup failed; the bucket
    /// is still reported, with its metrics degraded to zero.
    pub fn from_record(
        region: &str,
        namespace: &str,
        compartment_id: &str,
        bucket_name: &str,
        stats: Option<BucketStats>,
    ) -> Self {
        let stats = stats.unwrap_or_default();
        let size_gb = stats
            .approximate_size
            .map(|bytes| round2(bytes as f64 / GIB_BYTES))
            .unwrap_or(0.0);
        Self {
            namespace: namespace.to_string(),
            compartment_id: compartment_id.to_string(),
            bucket_name: bucket_name.to_string(),
            region: region.to_string(),
            storage_tier: stats.storage_tier.unwrap_or_default(),
            object_count: stats.approximate_count.unwrap_or(0),
            size_gb,
            defined_tags: stats.defined_tags,
            freeform_tags: stats.freeform_tags,
        }
    }

    pub fn size_tb(&self) -> f64 {
        tb_from_gb(self.size_gb)
    }

    pub fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.namespace),
            Cell::text(&self.compartment_id),
            Cell::text(&self.bucket_name),
            Cell::text(&self.region),
            Cell::text(&self.storage_tier),
            Cell::Int(self.object_count),
            Cell::Float(self.size_gb),
            Cell::Float(self.size_tb()),
            Cell::Text(render_defined_tags(&self.defined_tags)),
            Cell::Text(render_freeform_tags(&self.freeform_tags)),
        ]
    }
}

/// One discovered DB system.
#[derive(Debug, Clone)]
pub struct DbSystemDetail {
    pub compartment_id: String,
    pub db_system_id: String,
    pub display_name: String,
    pub region: String,
    pub availability_domain: String,
    pub shape: String,
    pub lifecycle_state: String,
    pub node_count: u64,
    pub db_version: String,
    pub database_edition: String,
    pub storage_gb: f64,
    pub defined_tags: DefinedTags,
    pub freeform_tags: FreeformTags,
}

impl DbSystemDetail {
    pub fn from_record(region: &str, compartment_id: &str, record: DbSystemRecord) -> Self {
        Self {
            compartment_id: compartment_id.to_string(),
            db_system_id: record.id,
            display_name: record.display_name,
            region: region.to_string(),
            availability_domain: record.availability_domain,
            shape: record.shape,
            lifecycle_state: record.lifecycle_state,
            node_count: record.node_count.unwrap_or(0),
            db_version: record.version.unwrap_or_default(),
            database_edition: record.database_edition.unwrap_or_default(),
            storage_gb: record.data_storage_size_in_gbs.unwrap_or(0.0),
            defined_tags: record.defined_tags,
            freeform_tags: record.freeform_tags,
        }
    }

    pub fn storage_tb(&self) -> f64 {
        tb_from_gb(self.storage_gb)
    }

    pub fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.compartment_id),
            Cell::text(&self.db_system_id),
            Cell::text(&self.display_name),
            Cell::text(&self.region),
            Cell::text(&self.availability_domain),
            Cell::text(&self.shape),
            Cell::text(&self.lifecycle_state),
            Cell::Int(self.node_count),
            Cell::text(&self.db_version),
            Cell::text(&self.database_edition),
            Cell::Float(self.storage_gb),
            Cell::Float(self.storage_tb()),
            Cell::Text(render_defined_tags(&self.defined_tags)),
            Cell::Text(render_freeform_tags(&self.freeform_tags)),
        ]
    }
}

/// One discovered OKE cluster with its live node/PVC inventory.
#[derive(Debug, Clone)]
pub struct ClusterDetail {
    pub region: String,
    pub compartment_id: String,
    pub cluster_id: String,
    pub cluster_name: String,
    pub kubernetes_version: String,
    pub node_names: Vec<String>,
    pub pvc_names: Vec<String>,
    pub pvc_gb: f64,
}

impl ClusterDetail {
    /// `inventory` is `None` when the live lookup failed; the cluster is
    /// still reported with node/PVC metrics degraded to zero.
    pub fn from_record(
        region: &str,
        compartment_id: &str,
        record: ClusterRecord,
        inventory: Option<ClusterLiveInventory>,
    ) -> Self {
        let inventory = inventory.unwrap_or_default();
        Self {
            region: region.to_string(),
            compartment_id: compartment_id.to_string(),
            cluster_id: record.id,
            cluster_name: record.name,
            kubernetes_version: record.kubernetes_version.unwrap_or_default(),
            node_names: inventory.node_names,
            pvc_names: inventory.pvc_names,
            pvc_gb: inventory.pvc_size_gb,
        }
    }

    pub fn node_count(&self) -> u64 {
        self.node_names.len() as u64
    }

    pub fn pvc_count(&self) -> u64 {
        self.pvc_names.len() as u64
    }

    pub fn pvc_tb(&self) -> f64 {
        tb_from_gb(self.pvc_gb)
    }

    pub fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.region),
            Cell::text(&self.compartment_id),
            Cell::text(&self.cluster_id),
            Cell::text(&self.cluster_name),
            Cell::text(&self.kubernetes_version),
            Cell::Int(self.node_count()),
            Cell::Int(self.pvc_count()),
            Cell::Float(self.pvc_gb),
            Cell::Float(self.pvc_tb()),
            Cell::Text(self.pvc_names.join(", ")),
            Cell::Text(self.node_names.join(", ")),
        ]
    }
}

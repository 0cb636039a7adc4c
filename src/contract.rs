//! # contract: provider-facing interfaces for the sizing run
//!
//! This module defines the two traits the collection pipeline depends on and
//! the record types they exchange:
//!
//! - [`CloudSource`]: identity lookups (subscribed regions, tenancy
//!   compartments) plus the per-workload list and stat operations. List
//!   results are returned whole; pagination is the collaborator's concern.
//! - [`ClusterInventory`]: live node/PVC inventory for one OKE cluster,
//!   injected separately so the aggregation pipeline can be exercised
//!   without generating credentials or spawning control-plane queries.
//!
//! Both traits are async and annotated for `mockall`, so integration tests
//! drive the whole pipeline against deterministic mocks. All errors are
//! boxed trait objects; the collection loop decides what is recoverable.
//!
//! Record types deserialize directly from the OCI CLI's kebab-case JSON.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type shared by the provider traits (boxed error, caller decides
/// whether the failure is scope- or item-level).
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Defined tags: namespace -> key -> value, copied verbatim.
pub type DefinedTags = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Freeform tags: flat key -> value, copied verbatim.
pub type FreeformTags = BTreeMap<String, String>;

/// One compartment in the tenancy subtree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Compartment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Compartment {
    /// A compartment referenced only by its OCID (explicit scope lists).
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// One compute instance, as listed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstanceRecord {
    pub id: String,
    pub display_name: String,
    pub availability_domain: String,
    pub shape: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub defined_tags: DefinedTags,
    #[serde(default)]
    pub freeform_tags: FreeformTags,
}

/// A boot or block volume attached to an instance.
#[derive(Debug, Clone)]
pub struct AttachedVolume {
    pub name: String,
    pub size_gb: f64,
}

/// Everything the storage lookup could resolve for one instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceStorage {
    pub boot_volume: Option<AttachedVolume>,
    pub block_volumes: Vec<AttachedVolume>,
}

/// One object storage bucket, as listed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BucketRecord {
    pub name: String,
}

/// Per-bucket stat lookup result (approximate size and count are the
/// provider's own estimates).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BucketStats {
    #[serde(default)]
    pub storage_tier: Option<String>,
    #[serde(default)]
    pub approximate_count: Option<u64>,
    #[serde(default)]
    pub approximate_size: Option<u64>,
    #[serde(default)]
    pub defined_tags: DefinedTags,
    #[serde(default)]
    pub freeform_tags: FreeformTags,
}

/// One DB system, as listed. All size metrics already ride on the listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbSystemRecord {
    pub id: String,
    pub display_name: String,
    pub availability_domain: String,
    pub shape: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub node_count: Option<u64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub database_edition: Option<String>,
    #[serde(default)]
    pub data_storage_size_in_gbs: Option<f64>,
    #[serde(default)]
    pub defined_tags: DefinedTags,
    #[serde(default)]
    pub freeform_tags: FreeformTags,
}

/// One OKE cluster, as listed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterRecord {
    pub id: String,
    pub name: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub kubernetes_version: Option<String>,
}

/// Live inventory of one cluster's nodes and persistent volume claims.
/// PVC names are `namespace/name`; sizes are the parsed storage requests.
#[derive(Debug, Clone, Default)]
pub struct ClusterLiveInventory {
    pub node_names: Vec<String>,
    pub pvc_names: Vec<String>,
    pub pvc_size_gb: f64,
}

/// Identity plus per-workload list/stat operations against the cloud
/// provider. Implemented by the `oci` CLI adapter and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CloudSource: Send + Sync {
    /// All regions the tenancy is subscribed to.
    async fn subscribed_regions(&self) -> Result<Vec<String>, SourceError>;

    /// All active compartments in the tenancy subtree.
    async fn tenancy_compartments(&self) -> Result<Vec<Compartment>, SourceError>;

    async fn list_instances(
        &self,
        region: &str,
        compartment_id: &str,
    ) -> Result<Vec<InstanceRecord>, SourceError>;

    /// Boot and block volumes attached to one instance. Individual volume
    /// lookups that fail are skipped by the implementation; a failure to
    /// list the attachments themselves is returned to the caller.
    async fn instance_storage(
        &self,
        region: &str,
        compartment_id: &str,
        instance: &InstanceRecord,
    ) -> Result<InstanceStorage, SourceError>;

    /// The tenancy's object storage namespace for a region.
    async fn object_storage_namespace(&self, region: &str) -> Result<String, SourceError>;

    async fn list_buckets(
        &self,
        region: &str,
        namespace: &str,
        compartment_id: &str,
    ) -> Result<Vec<BucketRecord>, SourceError>;

    async fn bucket_stats(
        &self,
        region: &str,
        namespace: &str,
        bucket_name: &str,
    ) -> Result<BucketStats, SourceError>;

    async fn list_db_systems(
        &self,
        region: &str,
        compartment_id: &str,
    ) -> Result<Vec<DbSystemRecord>, SourceError>;

    async fn list_clusters(
        &self,
        region: &str,
        compartment_id: &str,
    ) -> Result<Vec<ClusterRecord>, SourceError>;
}

/// Live Kubernetes inventory for one cluster. Kept separate from
/// [`CloudSource`] so the control-plane round-trip (credential generation,
/// external query tool) can be mocked independently.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    async fn cluster_inventory(
        &self,
        region: &str,
        cluster_id: &str,
    ) -> Result<ClusterLiveInventory, SourceError>;
}

//! Running totals for sizing scopes and for the whole run.
//!
//! Every workload uses the same double-entry scheme: while a compartment is
//! being enumerated, each surviving detail record is absorbed into exactly
//! one scope-level totals value and exactly once into the run-level totals
//! value. Summaries and grand totals are therefore accumulated incrementally
//! rather than recomputed from the written rows.
//!
//! Terabyte figures are never stored and never summed. They are derived from
//! the corresponding gigabyte figure on demand, at the detail level and at
//! the summary level independently, so rounding error cannot compound across
//! many small records.

use crate::inventory::{BucketDetail, ClusterDetail, DbSystemDetail, InstanceDetail};

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derives a TB figure from a GB figure. The only way a TB value may be
/// produced anywhere in the crate.
pub fn tb_from_gb(gb: f64) -> f64 {
    round2(gb / 1024.0)
}

/// Count and attached-storage sum for a set of compute instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceTotals {
    pub count: u64,
    pub size_gb: f64,
}

impl InstanceTotals {
    pub fn absorb(&mut self, detail: &InstanceDetail) {
        self.count += 1;
        self.size_gb += detail.size_gb;
    }

    pub fn size_tb(&self) -> f64 {
        tb_from_gb(self.size_gb)
    }
}

/// Count and storage sum for a set of object storage buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketTotals {
    pub count: u64,
    pub storage_gb: f64,
}

impl BucketTotals {
    pub fn absorb(&mut self, detail: &BucketDetail) {
        self.count += 1;
        self.storage_gb += detail.size_gb;
    }

    pub fn storage_tb(&self) -> f64 {
        tb_from_gb(self.storage_gb)
    }
}

/// Count and data-storage sum for a set of DB systems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbSystemTotals {
    pub count: u64,
    pub storage_gb: f64,
}

impl DbSystemTotals {
    pub fn absorb(&mut self, detail: &DbSystemDetail) {
        self.count += 1;
        self.storage_gb += detail.storage_gb;
    }

    pub fn storage_tb(&self) -> f64 {
        tb_from_gb(self.storage_gb)
    }
}

/// Cluster, node and PVC tallies for a set of OKE clusters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterTotals {
    pub count: u64,
    pub node_count: u64,
    pub pvc_count: u64,
    pub pvc_gb: f64,
}

impl ClusterTotals {
    pub fn absorb(&mut self, detail: &ClusterDetail) {
        self.count += 1;
        self.node_count += detail.node_count();
        self.pvc_count += detail.pvc_count();
        self.pvc_gb += detail.pvc_gb;
    }

    pub fn pvc_tb(&self) -> f64 {
        tb_from_gb(self.pvc_gb)
    }
}

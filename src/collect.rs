//! Per-workload collection loops: resolve scopes, enumerate one region and
//! one compartment at a time, roll detail records up into scope summaries
//! and run totals, and flush rows to the workbook.
//!
//! Error policy, shared by all four workloads: once a loop has started,
//! nothing is fatal except a workbook write failure. A failed listing skips
//! its compartment (or region, for the object storage namespace) and
//! contributes zero everywhere; a failed secondary lookup degrades that one
//! item's metric to zero while the item stays counted. A scope with no
//! surviving records gets no summary row.

use tracing::{error, info};

use crate::contract::{
    CloudSource, ClusterInventory, Compartment, InstanceStorage, SourceError,
};
use crate::inventory::{
    is_deleted, is_terminated, BucketDetail, ClusterDetail, DbSystemDetail, InstanceDetail,
};
use crate::rollup::{round2, BucketTotals, ClusterTotals, DbSystemTotals, InstanceTotals};
use crate::workbook::{Cell, SizingWorkbook};

/// The regions and compartments one run walks.
#[derive(Debug, Clone)]
pub struct RunScopes {
    pub regions: Vec<String>,
    pub compartments: Vec<Compartment>,
}

/// Resolves the target scopes: explicit lists win, otherwise every
/// subscribed region and every compartment in the tenancy subtree.
pub async fn resolve_scopes<S: CloudSource>(
    source: &S,
    regions: &[String],
    compartments: &[String],
) -> Result<RunScopes, SourceError> {
    let regions = if regions.is_empty() {
        source.subscribed_regions().await?
    } else {
        regions.to_vec()
    };
    let compartments = if compartments.is_empty() {
        source.tenancy_compartments().await?
    } else {
        compartments.iter().map(Compartment::from_id).collect()
    };
    info!(
        regions = regions.len(),
        compartments = compartments.len(),
        "Resolved run scopes"
    );
    Ok(RunScopes {
        regions,
        compartments,
    })
}

/// One region/compartment scope's accumulated totals.
#[derive(Debug, Clone)]
pub struct ScopeSummary<T> {
    pub region: String,
    pub compartment_id: String,
    pub totals: T,
}

/// What a workload run produced, for the caller and for tests. The workbook
/// rows are written as a side effect while this is being accumulated.
#[derive(Debug, Clone)]
pub struct InstanceReport {
    pub summaries: Vec<ScopeSummary<InstanceTotals>>,
    pub totals: InstanceTotals,
}

#[derive(Debug, Clone)]
pub struct BucketReport {
    pub summaries: Vec<BucketScopeSummary>,
    pub totals: BucketTotals,
}

/// Bucket scopes also carry the region's object storage namespace.
#[derive(Debug, Clone)]
pub struct BucketScopeSummary {
    pub region: String,
    pub namespace: String,
    pub compartment_id: String,
    pub totals: BucketTotals,
}

#[derive(Debug, Clone)]
pub struct DbSystemReport {
    pub summaries: Vec<ScopeSummary<DbSystemTotals>>,
    pub totals: DbSystemTotals,
}

#[derive(Debug, Clone)]
pub struct ClusterReport {
    pub summaries: Vec<ScopeSummary<ClusterTotals>>,
    pub totals: ClusterTotals,
}

pub async fn collect_instances<S: CloudSource>(
    source: &S,
    scopes: &RunScopes,
    book: &mut SizingWorkbook,
) -> Result<InstanceReport, SourceError> {
    book.initialize()?;
    let mut totals = InstanceTotals::default();
    let mut summaries = Vec::new();

    for region in &scopes.regions {
        info!(region = %region, "Processing region");
        for compartment in &scopes.compartments {
            info!(compartment = %compartment.id, "Processing compartment");
            let records = match source.list_instances(region, &compartment.id).await {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        region = %region,
                        compartment = %compartment.id,
                        error = %e,
                        "Failed to list instances, skipping compartment"
                    );
                    continue;
                }
            };
            info!(count = records.len(), "Found instance(s)");

            let mut scope = InstanceTotals::default();
            let mut details = Vec::new();
            for record in records {
                if is_terminated(&record.lifecycle_state) {
                    continue;
                }
                info!(instance = %record.id, name = %record.display_name, "Processing instance");
                let storage = match source
                    .instance_storage(region, &compartment.id, &record)
                    .await
                {
                    Ok(storage) => storage,
                    Err(e) => {
                        error!(
                            instance = %record.id,
                            error = %e,
                            "Failed to fetch volume data, sizing degraded to zero"
                        );
                        InstanceStorage::default()
                    }
                };
                let detail = InstanceDetail::from_record(region, &compartment.id, record, storage);
                scope.absorb(&detail);
                totals.absorb(&detail);
                details.push(detail);
            }
            if details.is_empty() {
                continue;
            }

            let rows: Vec<_> = details.iter().map(InstanceDetail::row).collect();
            book.append_details(&rows)?;
            let summary = ScopeSummary {
                region: region.clone(),
                compartment_id: compartment.id.clone(),
                totals: scope,
            };
            book.append_summary(&instance_summary_row(&summary))?;
            summaries.push(summary);
        }
    }

    let label = book.spec().grand_total_label;
    book.append_grand_total(&grand_total_row(
        label,
        1,
        &metric_cells(totals.count, totals.size_gb, totals.size_tb()),
    ))?;
    info!(
        instances = totals.count,
        size_gb = round2(totals.size_gb),
        size_tb = totals.size_tb(),
        "Grand total"
    );
    Ok(InstanceReport { summaries, totals })
}

pub async fn collect_buckets<S: CloudSource>(
    source: &S,
    scopes: &RunScopes,
    book: &mut SizingWorkbook,
) -> Result<BucketReport, SourceError> {
    book.initialize()?;
    let mut totals = BucketTotals::default();
    let mut summaries = Vec::new();

    for region in &scopes.regions {
        info!(region = %region, "Processing region");
        let namespace = match source.object_storage_namespace(region).await {
            Ok(namespace) => namespace,
            Err(e) => {
                error!(region = %region, error = %e, "Failed to fetch namespace, skipping region");
                continue;
            }
        };
        for compartment in &scopes.compartments {
            let records = match source
                .list_buckets(region, &namespace, &compartment.id)
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        region = %region,
                        compartment = %compartment.id,
                        error = %e,
                        "Failed to list buckets, skipping compartment"
                    );
                    continue;
                }
            };
            info!(
                compartment = %compartment.id,
                count = records.len(),
                "Found bucket(s)"
            );

            let mut scope = BucketTotals::default();
            let mut details = Vec::new();
            for record in records {
                let stats = match source.bucket_stats(region, &namespace, &record.name).await {
                    Ok(stats) => Some(stats),
                    Err(e) => {
                        error!(
                            bucket = %record.name,
                            error = %e,
                            "Failed to fetch bucket stats, sizing degraded to zero"
                        );
                        None
                    }
                };
                let detail = BucketDetail::from_record(
                    region,
                    &namespace,
                    &compartment.id,
                    &record.name,
                    stats,
                );
                scope.absorb(&detail);
                totals.absorb(&detail);
                details.push(detail);
            }
            if details.is_empty() {
                continue;
            }

            let rows: Vec<_> = details.iter().map(BucketDetail::row).collect();
            book.append_details(&rows)?;
            let summary = BucketScopeSummary {
                region: region.clone(),
                namespace: namespace.clone(),
                compartment_id: compartment.id.clone(),
                totals: scope,
            };
            book.append_summary(&bucket_summary_row(&summary))?;
            summaries.push(summary);
        }
    }

    let label = book.spec().grand_total_label;
    book.append_grand_total(&grand_total_row(
        label,
        2,
        &metric_cells(totals.count, totals.storage_gb, totals.storage_tb()),
    ))?;
    info!(
        buckets = totals.count,
        storage_gb = round2(totals.storage_gb),
        storage_tb = totals.storage_tb(),
        "Grand total"
    );
    Ok(BucketReport { summaries, totals })
}

pub async fn collect_db_systems<S: CloudSource>(
    source: &S,
    scopes: &RunScopes,
    book: &mut SizingWorkbook,
) -> Result<DbSystemReport, SourceError> {
    book.initialize()?;
    let mut totals = DbSystemTotals::default();
    let mut summaries = Vec::new();

    for region in &scopes.regions {
        info!(region = %region, "Processing region");
        for compartment in &scopes.compartments {
            info!(compartment = %compartment.id, "Processing compartment");
            let records = match source.list_db_systems(region, &compartment.id).await {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        region = %region,
                        compartment = %compartment.id,
                        error = %e,
                        "Failed to list DB systems, skipping compartment"
                    );
                    continue;
                }
            };
            info!(count = records.len(), "Found DB system(s)");

            let mut scope = DbSystemTotals::default();
            let mut details = Vec::new();
            for record in records {
                if is_terminated(&record.lifecycle_state) {
                    continue;
                }
                let detail = DbSystemDetail::from_record(region, &compartment.id, record);
                scope.absorb(&detail);
                totals.absorb(&detail);
                details.push(detail);
            }
            if details.is_empty() {
                continue;
            }

            let rows: Vec<_> = details.iter().map(DbSystemDetail::row).collect();
            book.append_details(&rows)?;
            let summary = ScopeSummary {
                region: region.clone(),
                compartment_id: compartment.id.clone(),
                totals: scope,
            };
            book.append_summary(&db_system_summary_row(&summary))?;
            summaries.push(summary);
        }
    }

    let label = book.spec().grand_total_label;
    book.append_grand_total(&grand_total_row(
        label,
        1,
        &metric_cells(totals.count, totals.storage_gb, totals.storage_tb()),
    ))?;
    info!(
        db_systems = totals.count,
        storage_gb = round2(totals.storage_gb),
        storage_tb = totals.storage_tb(),
        "Grand total"
    );
    Ok(DbSystemReport { summaries, totals })
}

pub async fn collect_clusters<S: CloudSource, I: ClusterInventory>(
    source: &S,
    inventory: &I,
    scopes: &RunScopes,
    book: &mut SizingWorkbook,
) -> Result<ClusterReport, SourceError> {
    book.initialize()?;
    let mut totals = ClusterTotals::default();
    let mut summaries = Vec::new();

    for region in &scopes.regions {
        info!(region = %region, "Processing region");
        for compartment in &scopes.compartments {
            let records = match source.list_clusters(region, &compartment.id).await {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        region = %region,
                        compartment = %compartment.id,
                        error = %e,
                        "Failed to list clusters, skipping compartment"
                    );
                    continue;
                }
            };
            info!(
                compartment = %compartment.id,
                count = records.len(),
                "Found cluster(s)"
            );

            let mut scope = ClusterTotals::default();
            let mut details = Vec::new();
            for record in records {
                if is_deleted(&record.lifecycle_state) {
                    continue;
                }
                info!(cluster = %record.id, name = %record.name, "Fetching live cluster inventory");
                let live = match inventory.cluster_inventory(region, &record.id).await {
                    Ok(live) => Some(live),
                    Err(e) => {
                        error!(
                            cluster = %record.name,
                            error = %e,
                            "Failed to fetch cluster inventory, node/PVC metrics degraded to zero"
                        );
                        None
                    }
                };
                let detail = ClusterDetail::from_record(region, &compartment.id, record, live);
                scope.absorb(&detail);
                totals.absorb(&detail);
                details.push(detail);
            }
            if details.is_empty() {
                continue;
            }

            let rows: Vec<_> = details.iter().map(ClusterDetail::row).collect();
            book.append_details(&rows)?;
            let summary = ScopeSummary {
                region: region.clone(),
                compartment_id: compartment.id.clone(),
                totals: scope,
            };
            book.append_summary(&cluster_summary_row(&summary))?;
            summaries.push(summary);
        }
    }

    let metrics = [
        Cell::Int(totals.count),
        Cell::Int(totals.node_count),
        Cell::Int(totals.pvc_count),
        Cell::Float(round2(totals.pvc_gb)),
        Cell::Float(totals.pvc_tb()),
    ];
    let label = book.spec().grand_total_label;
    book.append_grand_total(&grand_total_row(label, 1, &metrics))?;
    info!(
        clusters = totals.count,
        nodes = totals.node_count,
        pvcs = totals.pvc_count,
        pvc_gb = round2(totals.pvc_gb),
        pvc_tb = totals.pvc_tb(),
        "Grand total"
    );
    Ok(ClusterReport { summaries, totals })
}

fn metric_cells(count: u64, gb: f64, tb: f64) -> [Cell; 3] {
    [Cell::Int(count), Cell::Float(round2(gb)), Cell::Float(tb)]
}

/// Label in the first column, blank scope columns, then the metric cells.
fn grand_total_row(label: &str, blank_scope_columns: usize, metrics: &[Cell]) -> Vec<Cell> {
    let mut row = vec![Cell::text(label)];
    row.extend(std::iter::repeat(Cell::text("")).take(blank_scope_columns));
    row.extend(metrics.iter().cloned());
    row
}

fn instance_summary_row(summary: &ScopeSummary<InstanceTotals>) -> Vec<Cell> {
    vec![
        Cell::text(&summary.region),
        Cell::text(&summary.compartment_id),
        Cell::Int(summary.totals.count),
        Cell::Float(round2(summary.totals.size_gb)),
        Cell::Float(summary.totals.size_tb()),
    ]
}

fn bucket_summary_row(summary: &BucketScopeSummary) -> Vec<Cell> {
    vec![
        Cell::text(&summary.region),
        Cell::text(&summary.namespace),
        Cell::text(&summary.compartment_id),
        Cell::Int(summary.totals.count),
        Cell::Float(round2(summary.totals.storage_gb)),
        Cell::Float(summary.totals.storage_tb()),
    ]
}

fn db_system_summary_row(summary: &ScopeSummary<DbSystemTotals>) -> Vec<Cell> {
    vec![
        Cell::text(&summary.region),
        Cell::text(&summary.compartment_id),
        Cell::Int(summary.totals.count),
        Cell::Float(round2(summary.totals.storage_gb)),
        Cell::Float(summary.totals.storage_tb()),
    ]
}

fn cluster_summary_row(summary: &ScopeSummary<ClusterTotals>) -> Vec<Cell> {
    vec![
        Cell::text(&summary.region),
        Cell::text(&summary.compartment_id),
        Cell::Int(summary.totals.count),
        Cell::Int(summary.totals.node_count),
        Cell::Int(summary.totals.pvc_count),
        Cell::Float(round2(summary.totals.pvc_gb)),
        Cell::Float(summary.totals.pvc_tb()),
    ]
}

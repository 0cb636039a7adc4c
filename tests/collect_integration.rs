use oci_sizing::collect::{
    collect_buckets, collect_clusters, collect_db_systems, collect_instances, resolve_scopes,
    RunScopes,
};
use oci_sizing::config::Workload;
use oci_sizing::contract::{
    AttachedVolume, BucketRecord, BucketStats, ClusterLiveInventory, ClusterRecord, Compartment,
    DbSystemRecord, InstanceRecord, InstanceStorage, MockCloudSource, MockClusterInventory,
};
use oci_sizing::workbook::SizingWorkbook;
use tempfile::tempdir;

fn run_scopes(regions: &[&str], compartments: &[&str]) -> RunScopes {
    RunScopes {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        compartments: compartments.iter().map(|c| Compartment::from_id(*c)).collect(),
    }
}

fn instance_record(id: &str, state: &str) -> InstanceRecord {
    InstanceRecord {
        id: id.into(),
        display_name: format!("vm-{id}"),
        availability_domain: "AD-1".into(),
        shape: "VM.Standard.E4.Flex".into(),
        lifecycle_state: state.into(),
        defined_tags: Default::default(),
        freeform_tags: Default::default(),
    }
}

fn boot_only_storage(size_gb: f64) -> InstanceStorage {
    InstanceStorage {
        boot_volume: Some(AttachedVolume {
            name: "boot".into(),
            size_gb,
        }),
        block_volumes: vec![],
    }
}

fn db_record(id: &str, state: &str, storage_gb: f64) -> DbSystemRecord {
    DbSystemRecord {
        id: id.into(),
        display_name: format!("db-{id}"),
        availability_domain: "AD-1".into(),
        shape: "VM.Standard2.2".into(),
        lifecycle_state: state.into(),
        node_count: Some(1),
        version: Some("19.0.0.0".into()),
        database_edition: Some("ENTERPRISE_EDITION".into()),
        data_storage_size_in_gbs: Some(storage_gb),
        defined_tags: Default::default(),
        freeform_tags: Default::default(),
    }
}

fn cluster_record(id: &str, state: &str) -> ClusterRecord {
    ClusterRecord {
        id: id.into(),
        name: format!("oke-{id}"),
        lifecycle_state: state.into(),
        kubernetes_version: Some("v1.29.1".into()),
    }
}

#[tokio::test]
async fn one_failing_volume_lookup_degrades_only_that_instance() {
    let mut source = MockCloudSource::new();
    source.expect_list_instances().returning(|_, _| {
        Ok((1..=5)
            .map(|i| instance_record(&format!("inst-{i}"), "RUNNING"))
            .collect())
    });
    source.expect_instance_storage().returning(|_, _, instance| {
        if instance.id == "inst-3" {
            Err("volume service unavailable".into())
        } else {
            Ok(boot_only_storage(50.0))
        }
    });

    let scopes = run_scopes(&["eu-frankfurt-1"], &["ocid1.compartment.oc1..c1"]);
    let mut book = SizingWorkbook::new(Workload::Instances);
    let report = collect_instances(&source, &scopes, &mut book)
        .await
        .expect("collection succeeds");

    // All five rows are present, the degraded one contributes zero GB.
    assert_eq!(book.detail_row_count(), 5);
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].totals.count, 5);
    assert_eq!(report.summaries[0].totals.size_gb, 200.0);
    assert_eq!(report.totals, report.summaries[0].totals);
    assert!(book.grand_total_written());

    let dir = tempdir().unwrap();
    book.finalize(&dir.path().join("instances.xlsx")).unwrap();
}

#[tokio::test]
async fn empty_compartments_get_no_summary_and_no_detail_rows() {
    let mut source = MockCloudSource::new();
    source
        .expect_list_instances()
        .returning(|_, compartment_id| {
            if compartment_id == "ocid1.compartment.oc1..busy" {
                Ok(vec![instance_record("inst-1", "RUNNING")])
            } else {
                Ok(vec![])
            }
        });
    source
        .expect_instance_storage()
        .returning(|_, _, _| Ok(boot_only_storage(100.0)));

    let scopes = run_scopes(
        &["eu-frankfurt-1"],
        &["ocid1.compartment.oc1..busy", "ocid1.compartment.oc1..idle"],
    );
    let mut book = SizingWorkbook::new(Workload::Instances);
    let report = collect_instances(&source, &scopes, &mut book)
        .await
        .unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(
        report.summaries[0].compartment_id,
        "ocid1.compartment.oc1..busy"
    );
    assert_eq!(book.detail_row_count(), 1);
    assert_eq!(book.summary_row_count(), 1);
}

#[tokio::test]
async fn terminated_resources_are_excluded_everywhere() {
    let mut source = MockCloudSource::new();
    source.expect_list_instances().returning(|_, _| {
        Ok(vec![
            instance_record("inst-1", "RUNNING"),
            instance_record("inst-2", "TERMINATED"),
            instance_record("inst-3", "STOPPED"),
        ])
    });
    source.expect_instance_storage().returning(|_, _, instance| {
        assert_ne!(
            instance.id, "inst-2",
            "terminated instances must not reach the volume lookup"
        );
        Ok(boot_only_storage(10.0))
    });

    let scopes = run_scopes(&["eu-frankfurt-1"], &["ocid1.compartment.oc1..c1"]);
    let mut book = SizingWorkbook::new(Workload::Instances);
    let report = collect_instances(&source, &scopes, &mut book)
        .await
        .unwrap();

    assert_eq!(report.totals.count, 2);
    assert_eq!(book.detail_row_count(), 2);
}

#[tokio::test]
async fn failed_listing_skips_the_compartment_but_not_its_siblings() {
    let mut source = MockCloudSource::new();
    source
        .expect_list_db_systems()
        .returning(|_, compartment_id| {
            if compartment_id == "ocid1.compartment.oc1..denied" {
                Err("NotAuthorizedOrNotFound".into())
            } else {
                Ok(vec![db_record("db-1", "AVAILABLE", 256.0)])
            }
        });

    let scopes = run_scopes(
        &["eu-frankfurt-1"],
        &["ocid1.compartment.oc1..denied", "ocid1.compartment.oc1..ok"],
    );
    let mut book = SizingWorkbook::new(Workload::DbSystems);
    let report = collect_db_systems(&source, &scopes, &mut book)
        .await
        .unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].compartment_id, "ocid1.compartment.oc1..ok");
    assert_eq!(report.totals.count, 1);
    assert_eq!(report.totals.storage_gb, 256.0);
}

#[tokio::test]
async fn grand_total_reconciles_across_regions_and_compartments() {
    let mut source = MockCloudSource::new();
    source
        .expect_list_db_systems()
        .returning(|region, compartment_id| {
            let storage = match (region, compartment_id) {
                ("eu-frankfurt-1", "c1") => 100.0,
                ("eu-frankfurt-1", "c2") => 250.0,
                ("uk-london-1", "c1") => 75.5,
                _ => return Ok(vec![]),
            };
            Ok(vec![
                db_record("db-a", "AVAILABLE", storage),
                db_record("db-b", "AVAILABLE", storage),
            ])
        });

    let scopes = run_scopes(&["eu-frankfurt-1", "uk-london-1"], &["c1", "c2"]);
    let mut book = SizingWorkbook::new(Workload::DbSystems);
    let report = collect_db_systems(&source, &scopes, &mut book)
        .await
        .unwrap();

    assert_eq!(report.summaries.len(), 3);
    let summed_count: u64 = report.summaries.iter().map(|s| s.totals.count).sum();
    let summed_gb: f64 = report.summaries.iter().map(|s| s.totals.storage_gb).sum();
    assert_eq!(report.totals.count, summed_count);
    assert_eq!(report.totals.storage_gb, summed_gb);
    assert_eq!(report.totals.count, 6);
    assert_eq!(report.totals.storage_gb, 851.0);
}

#[tokio::test]
async fn bucket_sizes_convert_from_bytes_and_tb_derives_from_summed_gb() {
    let mut source = MockCloudSource::new();
    source
        .expect_object_storage_namespace()
        .returning(|_| Ok("tenancyns".to_string()));
    source.expect_list_buckets().returning(|_, _, _| {
        Ok(vec![
            BucketRecord { name: "b1".into() },
            BucketRecord { name: "b2".into() },
            BucketRecord { name: "b3".into() },
        ])
    });
    source
        .expect_bucket_stats()
        .returning(|_, _, bucket_name| {
            let bytes = match bucket_name {
                "b1" => 1_073_741_824,
                "b2" => 2_147_483_648,
                _ => 0,
            };
            Ok(BucketStats {
                storage_tier: Some("Standard".into()),
                approximate_count: Some(12),
                approximate_size: Some(bytes),
                defined_tags: Default::default(),
                freeform_tags: Default::default(),
            })
        });

    let scopes = run_scopes(&["eu-frankfurt-1"], &["ocid1.compartment.oc1..c1"]);
    let mut book = SizingWorkbook::new(Workload::ObjectStorage);
    let report = collect_buckets(&source, &scopes, &mut book).await.unwrap();

    assert_eq!(book.detail_row_count(), 3);
    let summary = &report.summaries[0];
    assert_eq!(summary.namespace, "tenancyns");
    assert_eq!(summary.totals.count, 3);
    assert_eq!(summary.totals.storage_gb, 3.0);
    assert_eq!(summary.totals.storage_tb(), 0.0);
}

#[tokio::test]
async fn failed_bucket_stats_still_counts_the_bucket_at_zero() {
    let mut source = MockCloudSource::new();
    source
        .expect_object_storage_namespace()
        .returning(|_| Ok("tenancyns".to_string()));
    source.expect_list_buckets().returning(|_, _, _| {
        Ok(vec![
            BucketRecord { name: "good".into() },
            BucketRecord { name: "flaky".into() },
        ])
    });
    source
        .expect_bucket_stats()
        .returning(|_, _, bucket_name| {
            if bucket_name == "flaky" {
                Err("stats timed out".into())
            } else {
                Ok(BucketStats {
                    storage_tier: Some("Standard".into()),
                    approximate_count: Some(5),
                    approximate_size: Some(5 * 1_073_741_824),
                    defined_tags: Default::default(),
                    freeform_tags: Default::default(),
                })
            }
        });

    let scopes = run_scopes(&["eu-frankfurt-1"], &["ocid1.compartment.oc1..c1"]);
    let mut book = SizingWorkbook::new(Workload::ObjectStorage);
    let report = collect_buckets(&source, &scopes, &mut book).await.unwrap();

    assert_eq!(book.detail_row_count(), 2);
    assert_eq!(report.totals.count, 2);
    assert_eq!(report.totals.storage_gb, 5.0);
}

#[tokio::test]
async fn namespace_failure_skips_the_region_only() {
    let mut source = MockCloudSource::new();
    source.expect_object_storage_namespace().returning(|region| {
        if region == "eu-frankfurt-1" {
            Err("namespace unavailable".into())
        } else {
            Ok("tenancyns".to_string())
        }
    });
    source
        .expect_list_buckets()
        .returning(|region, _, _| {
            assert_eq!(region, "uk-london-1");
            Ok(vec![BucketRecord { name: "b1".into() }])
        });
    source.expect_bucket_stats().returning(|_, _, _| {
        Ok(BucketStats {
            approximate_size: Some(1_073_741_824),
            ..Default::default()
        })
    });

    let scopes = run_scopes(
        &["eu-frankfurt-1", "uk-london-1"],
        &["ocid1.compartment.oc1..c1"],
    );
    let mut book = SizingWorkbook::new(Workload::ObjectStorage);
    let report = collect_buckets(&source, &scopes, &mut book).await.unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].region, "uk-london-1");
    assert_eq!(report.totals.count, 1);
}

#[tokio::test]
async fn cluster_inventory_failure_degrades_that_cluster_to_zero() {
    let mut source = MockCloudSource::new();
    source.expect_list_clusters().returning(|_, _| {
        Ok(vec![
            cluster_record("oke-1", "ACTIVE"),
            cluster_record("oke-2", "ACTIVE"),
            cluster_record("oke-3", "DELETED"),
        ])
    });

    let mut inventory = MockClusterInventory::new();
    inventory
        .expect_cluster_inventory()
        .returning(|_, cluster_id| {
            if cluster_id == "oke-2" {
                Err("private endpoint unreachable".into())
            } else {
                Ok(ClusterLiveInventory {
                    node_names: vec!["node-1".into(), "node-2".into(), "node-3".into()],
                    pvc_names: vec!["prod/data-0".into(), "prod/data-1".into()],
                    pvc_size_gb: 200.0,
                })
            }
        });

    let scopes = run_scopes(&["eu-frankfurt-1"], &["ocid1.compartment.oc1..c1"]);
    let mut book = SizingWorkbook::new(Workload::OkeClusters);
    let report = collect_clusters(&source, &inventory, &scopes, &mut book)
        .await
        .unwrap();

    // The deleted cluster is gone; the unreachable one counts with zeros.
    assert_eq!(report.totals.count, 2);
    assert_eq!(report.totals.node_count, 3);
    assert_eq!(report.totals.pvc_count, 2);
    assert_eq!(report.totals.pvc_gb, 200.0);
    assert_eq!(book.detail_row_count(), 2);
}

#[tokio::test]
async fn resolve_scopes_discovers_defaults_from_identity() {
    let mut source = MockCloudSource::new();
    source
        .expect_subscribed_regions()
        .returning(|| Ok(vec!["eu-frankfurt-1".into(), "uk-london-1".into()]));
    source.expect_tenancy_compartments().returning(|| {
        Ok(vec![Compartment {
            id: "ocid1.compartment.oc1..c1".into(),
            name: Some("prod".into()),
        }])
    });

    let scopes = resolve_scopes(&source, &[], &[]).await.unwrap();
    assert_eq!(scopes.regions.len(), 2);
    assert_eq!(scopes.compartments.len(), 1);
}

#[tokio::test]
async fn resolve_scopes_honors_explicit_lists_without_identity_calls() {
    // No expectations set: any identity call would panic the mock.
    let source = MockCloudSource::new();
    let scopes = resolve_scopes(
        &source,
        &["eu-frankfurt-1".to_string()],
        &["ocid1.compartment.oc1..c1".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(scopes.regions, vec!["eu-frankfurt-1".to_string()]);
    assert_eq!(scopes.compartments[0].id, "ocid1.compartment.oc1..c1");
}

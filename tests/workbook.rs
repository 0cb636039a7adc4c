use oci_sizing::config::Workload;
use oci_sizing::contract::{ClusterRecord, DbSystemRecord, InstanceRecord, InstanceStorage};
use oci_sizing::inventory::{BucketDetail, ClusterDetail, DbSystemDetail, InstanceDetail};
use oci_sizing::workbook::{sheet_spec, Cell, SizingWorkbook};
use tempfile::tempdir;

fn summary_row() -> Vec<Cell> {
    vec![
        Cell::text("eu-frankfurt-1"),
        Cell::text("ocid1.compartment.oc1..aaaa"),
        Cell::Int(2),
        Cell::Float(150.0),
        Cell::Float(0.15),
    ]
}

#[test]
fn initialize_twice_is_a_no_op() {
    let mut book = SizingWorkbook::new(Workload::Instances);
    book.initialize().expect("first initialize");
    book.append_summary(&summary_row()).unwrap();
    book.initialize().expect("second initialize");
    assert_eq!(book.summary_row_count(), 1);

    let dir = tempdir().unwrap();
    book.finalize(&dir.path().join("report.xlsx")).unwrap();
}

#[test]
fn row_counters_track_appends() {
    let mut book = SizingWorkbook::new(Workload::DbSystems);
    assert_eq!(book.detail_row_count(), 0);
    let detail_row = vec![Cell::text("a"), Cell::text("b")];
    book.append_details(&[detail_row.clone(), detail_row]).unwrap();
    assert_eq!(book.detail_row_count(), 2);
    assert_eq!(book.summary_row_count(), 0);

    book.append_summary(&summary_row()).unwrap();
    assert_eq!(book.summary_row_count(), 1);

    assert!(!book.grand_total_written());
    book.append_grand_total(&[
        Cell::text("Total DB Systems"),
        Cell::text(""),
        Cell::Int(2),
        Cell::Float(150.0),
        Cell::Float(0.15),
    ])
    .unwrap();
    assert!(book.grand_total_written());
    // The grand total is not an ordinary summary row.
    assert_eq!(book.summary_row_count(), 1);
}

#[test]
fn finalize_writes_the_file_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.xlsx");
    let mut book = SizingWorkbook::new(Workload::ObjectStorage);
    book.append_summary(&[
        Cell::text("eu-frankfurt-1"),
        Cell::text("tenancyns"),
        Cell::text("ocid1.compartment.oc1..aaaa"),
        Cell::Int(3),
        Cell::Float(3.0),
        Cell::Float(0.0),
    ])
    .unwrap();
    book.finalize(&path).unwrap();

    let metadata = std::fs::metadata(&path).expect("workbook file exists");
    assert!(metadata.len() > 0);
}

#[test]
fn finalize_without_any_rows_still_produces_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    let book = SizingWorkbook::new(Workload::OkeClusters);
    book.finalize(&path).unwrap();
    assert!(path.is_file());
}

// Every detail row must line up with its sheet's header set.
#[test]
fn detail_row_widths_match_the_sheet_headers() {
    let instance = InstanceDetail::from_record(
        "eu-frankfurt-1",
        "ocid1.compartment.oc1..aaaa",
        InstanceRecord {
            id: "ocid1.instance.oc1..inst".into(),
            display_name: "vm-1".into(),
            availability_domain: "AD-1".into(),
            shape: "VM.Standard.E4.Flex".into(),
            lifecycle_state: "RUNNING".into(),
            defined_tags: Default::default(),
            freeform_tags: Default::default(),
        },
        InstanceStorage::default(),
    );
    assert_eq!(
        instance.row().len(),
        sheet_spec(Workload::Instances).detail_headers.len()
    );

    let bucket = BucketDetail::from_record(
        "eu-frankfurt-1",
        "tenancyns",
        "ocid1.compartment.oc1..aaaa",
        "bucket-1",
        None,
    );
    assert_eq!(
        bucket.row().len(),
        sheet_spec(Workload::ObjectStorage).detail_headers.len()
    );

    let db_system = DbSystemDetail::from_record(
        "eu-frankfurt-1",
        "ocid1.compartment.oc1..aaaa",
        DbSystemRecord {
            id: "ocid1.dbsystem.oc1..db".into(),
            display_name: "db-1".into(),
            availability_domain: "AD-1".into(),
            shape: "VM.Standard2.2".into(),
            lifecycle_state: "AVAILABLE".into(),
            node_count: Some(2),
            version: Some("19.0.0.0".into()),
            database_edition: Some("ENTERPRISE_EDITION".into()),
            data_storage_size_in_gbs: Some(256.0),
            defined_tags: Default::default(),
            freeform_tags: Default::default(),
        },
    );
    assert_eq!(
        db_system.row().len(),
        sheet_spec(Workload::DbSystems).detail_headers.len()
    );

    let cluster = ClusterDetail::from_record(
        "eu-frankfurt-1",
        "ocid1.compartment.oc1..aaaa",
        ClusterRecord {
            id: "ocid1.cluster.oc1..oke".into(),
            name: "oke-1".into(),
            lifecycle_state: "ACTIVE".into(),
            kubernetes_version: Some("v1.29.1".into()),
        },
        None,
    );
    assert_eq!(
        cluster.row().len(),
        sheet_spec(Workload::OkeClusters).detail_headers.len()
    );
}

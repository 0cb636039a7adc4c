//! One-shot inventory of OCI compute instances, object storage buckets, DB
//! systems and OKE clusters, rolled up per region and compartment into an
//! xlsx sizing report with a grand-total row.
//!
//! # Usage
//! The binary drives [`cli::run`]. The provider contract, collection loops,
//! rollup math and workbook writer are public so tests can drive the whole
//! pipeline against mock sources.

pub mod cli;
pub mod collect;
pub mod config;
pub mod contract;
pub mod inventory;
pub mod kubernetes;
pub mod load_config;
pub mod oci;
pub mod rollup;
pub mod workbook;

//! [`CloudSource`] backed by the `oci` CLI in JSON output mode.
//!
//! Every operation is one `oci … --output json` invocation; list calls pass
//! `--all` so the CLI drains the provider's pagination before returning.
//! Responses arrive wrapped in a `{"data": …}` envelope with kebab-case
//! field names, which the record types in [`crate::contract`] deserialize
//! directly. An empty stdout (how the CLI reports an empty listing) maps to
//! an empty result.

use std::process::Command;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::contract::{
    AttachedVolume, BucketRecord, BucketStats, CloudSource, ClusterRecord, Compartment,
    DbSystemRecord, InstanceRecord, InstanceStorage, SourceError,
};

pub struct OciCliSource {
    profile: String,
}

impl OciCliSource {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn invoke(&self, region: Option<&str>, args: &[&str]) -> Result<Value, SourceError> {
        let mut cmd = Command::new("oci");
        cmd.args(args);
        cmd.args(["--output", "json"]);
        cmd.arg("--profile").arg(&self.profile);
        if let Some(region) = region {
            cmd.arg("--region").arg(region);
        }
        debug!(command = ?args, region = ?region, "Invoking oci CLI");
        let output = cmd
            .output()
            .map_err(|e| format!("failed to launch oci: {e}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "oci {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )
            .into());
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            // The CLI prints nothing for an empty listing.
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn list<T: DeserializeOwned>(
        &self,
        region: Option<&str>,
        args: &[&str],
    ) -> Result<Vec<T>, SourceError> {
        let value = self.invoke(region, args)?;
        match value.get("data") {
            Some(data) => Ok(serde_json::from_value(data.clone())?),
            None => Ok(Vec::new()),
        }
    }

    fn get<T: DeserializeOwned>(
        &self,
        region: Option<&str>,
        args: &[&str],
    ) -> Result<T, SourceError> {
        let value = self.invoke(region, args)?;
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| SourceError::from("oci response missing 'data' field"))?;
        Ok(serde_json::from_value(data)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RegionSubscription {
    region_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BootVolumeAttachment {
    boot_volume_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct VolumeAttachment {
    volume_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct VolumeInfo {
    display_name: String,
    size_in_gbs: f64,
}

#[async_trait]
impl CloudSource for OciCliSource {
    async fn subscribed_regions(&self) -> Result<Vec<String>, SourceError> {
        let subscriptions: Vec<RegionSubscription> =
            self.list(None, &["iam", "region-subscription", "list"])?;
        Ok(subscriptions
            .into_iter()
            .map(|s| s.region_name)
            .collect())
    }

    async fn tenancy_compartments(&self) -> Result<Vec<Compartment>, SourceError> {
        self.list(
            None,
            &[
                "iam",
                "compartment",
                "list",
                "--compartment-id-in-subtree",
                "true",
                "--lifecycle-state",
                "ACTIVE",
                "--all",
            ],
        )
    }

    async fn list_instances(
        &self,
        region: &str,
        compartment_id: &str,
    ) -> Result<Vec<InstanceRecord>, SourceError> {
        self.list(
            Some(region),
            &[
                "compute",
                "instance",
                "list",
                "--compartment-id",
                compartment_id,
                "--all",
            ],
        )
    }

    async fn instance_storage(
        &self,
        region: &str,
        compartment_id: &str,
        instance: &InstanceRecord,
    ) -> Result<InstanceStorage, SourceError> {
        let mut storage = InstanceStorage::default();

        let boot_attachments: Vec<BootVolumeAttachment> = self.list(
            Some(region),
            &[
                "compute",
                "boot-volume-attachment",
                "list",
                "--availability-domain",
                &instance.availability_domain,
                "--compartment-id",
                compartment_id,
                "--instance-id",
                &instance.id,
                "--all",
            ],
        )?;
        if let Some(attachment) = boot_attachments.first() {
            match self.get::<VolumeInfo>(
                Some(region),
                &[
                    "bv",
                    "boot-volume",
                    "get",
                    "--boot-volume-id",
                    &attachment.boot_volume_id,
                ],
            ) {
                Ok(volume) => {
                    storage.boot_volume = Some(AttachedVolume {
                        name: volume.display_name,
                        size_gb: volume.size_in_gbs,
                    });
                }
                Err(e) => {
                    warn!(
                        instance = %instance.id,
                        boot_volume = %attachment.boot_volume_id,
                        error = %e,
                        "Could not fetch boot volume, skipping it"
                    );
                }
            }
        }

        let attachments: Vec<VolumeAttachment> = self.list(
            Some(region),
            &[
                "compute",
                "volume-attachment",
                "list",
                "--compartment-id",
                compartment_id,
                "--instance-id",
                &instance.id,
                "--all",
            ],
        )?;
        for attachment in &attachments {
            match self.get::<VolumeInfo>(
                Some(region),
                &["bv", "volume", "get", "--volume-id", &attachment.volume_id],
            ) {
                Ok(volume) => storage.block_volumes.push(AttachedVolume {
                    name: volume.display_name,
                    size_gb: volume.size_in_gbs,
                }),
                Err(e) => {
                    warn!(
                        instance = %instance.id,
                        volume = %attachment.volume_id,
                        error = %e,
                        "Could not fetch block volume, skipping it"
                    );
                }
            }
        }

        Ok(storage)
    }

    async fn object_storage_namespace(&self, region: &str) -> Result<String, SourceError> {
        self.get(Some(region), &["os", "ns", "get"])
    }

    async fn list_buckets(
        &self,
        region: &str,
        namespace: &str,
        compartment_id: &str,
    ) -> Result<Vec<BucketRecord>, SourceError> {
        self.list(
            Some(region),
            &[
                "os",
                "bucket",
                "list",
                "--namespace-name",
                namespace,
                "--compartment-id",
                compartment_id,
                "--all",
            ],
        )
    }

    async fn bucket_stats(
        &self,
        region: &str,
        namespace: &str,
        bucket_name: &str,
    ) -> Result<BucketStats, SourceError> {
        self.get(
            Some(region),
            &[
                "os",
                "bucket",
                "get",
                "--namespace-name",
                namespace,
                "--bucket-name",
                bucket_name,
                "--fields",
                "approximateSize",
                "--fields",
                "approximateCount",
            ],
        )
    }

    async fn list_db_systems(
        &self,
        region: &str,
        compartment_id: &str,
    ) -> Result<Vec<DbSystemRecord>, SourceError> {
        self.list(
            Some(region),
            &[
                "db",
                "system",
                "list",
                "--compartment-id",
                compartment_id,
                "--all",
            ],
        )
    }

    async fn list_clusters(
        &self,
        region: &str,
        compartment_id: &str,
    ) -> Result<Vec<ClusterRecord>, SourceError> {
        self.list(
            Some(region),
            &[
                "ce",
                "cluster",
                "list",
                "--compartment-id",
                compartment_id,
                "--all",
            ],
        )
    }
}

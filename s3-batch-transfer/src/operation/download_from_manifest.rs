/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

mod input;
pub use input::{DownloadFromManifestInput, DownloadFromManifestInputBuilder};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;

use crate::client::Handle;
use crate::error::Error;
use crate::manifest::BatchManifest;
use crate::operation::download::{download_object, key_file_name, ObjectDownload};
use crate::operation::download_objects::worker::DownloadObjectJob;
use crate::operation::download_objects::{BatchSettings, DownloadObjects, DownloadObjectsHandle};

/// Operation struct for re-downloading a recorded upload batch
#[derive(Clone, Default, Debug)]
pub(crate) struct DownloadFromManifest;

impl DownloadFromManifest {
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        input: DownloadFromManifestInput,
    ) -> Result<DownloadObjectsHandle, Error> {
        let manifest = fetch_manifest(&handle, &input).await?;
        tracing::info!(
            "manifest s3://{}/{} records {} files of {} uploaded at {}",
            input.bucket(),
            input.manifest_key(),
            manifest.files.len(),
            manifest.directory,
            manifest.upload_date
        );

        let jobs = manifest_jobs(&manifest, input.destination())?;
        let label = format!("Downloading {}", manifest.directory);
        let settings = BatchSettings {
            bucket: input.bucket,
            overwrite: input.overwrite,
            dry_run: input.dry_run,
        };
        Ok(DownloadObjects::spawn(handle, settings, &label, jobs))
    }
}

/// Every manifest entry placed below `root`, failing on the first entry that cannot be placed
fn manifest_jobs(
    manifest: &BatchManifest,
    root: &std::path::Path,
) -> Result<Vec<DownloadObjectJob>, Error> {
    manifest
        .files
        .iter()
        .map(|entry| {
            let local_path = manifest.local_path_for(entry, root)?;
            Ok(DownloadObjectJob::new(
                entry.file_name.as_str(),
                entry.size,
                root,
                Ok(local_path),
            ))
        })
        .collect()
}

/// Download the manifest to a temporary file, then read and validate it
async fn fetch_manifest(
    handle: &Handle,
    input: &DownloadFromManifestInput,
) -> Result<BatchManifest, Error> {
    let temp_path = temp_manifest_path(input.manifest_key());
    let download = ObjectDownload {
        client: handle.config.client(),
        bucket: input.bucket(),
        key: input.manifest_key(),
        destination: &temp_path,
    };
    download_object(handle, &download, true, None, None).await?;

    let data = fs::read(&temp_path).await;
    if let Err(err) = fs::remove_file(&temp_path).await {
        tracing::debug!("could not remove {}: {err}", temp_path.display());
    }
    BatchManifest::from_slice(&data?)
}

fn temp_manifest_path(key: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{}-{}-{}",
        std::process::id(),
        Utc::now().timestamp_micros(),
        key_file_name(key)
    ))
}

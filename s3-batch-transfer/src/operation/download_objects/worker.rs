/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_channel::{Receiver, Sender};
use chrono::Utc;

use super::{DownloadObjectsContext, DownloadObjectsInput};
use crate::error::{self, Error};
use crate::operation::download::{download_object, key_file_name, ObjectDownload};
use crate::operation::list_objects::paginator::ListObjectsPaginator;
use crate::operation::{resolve_below, Disposition, DEFAULT_DELIMITER};
use crate::types::{LocalPathPolicy, TransferOutcome, TransferResult, WorkItem};

#[derive(Debug)]
pub(crate) struct DownloadObjectJob {
    pub(crate) item: WorkItem,
    key: String,
    /// Where the object goes, or why it cannot be placed
    local_path: Result<PathBuf, String>,
    /// Key already claiming the same local path, this one is not downloaded
    shadowed_by: Option<String>,
}

impl DownloadObjectJob {
    pub(crate) fn new(
        key: impl Into<String>,
        size_bytes: u64,
        root_dir: &Path,
        local_path: Result<PathBuf, String>,
    ) -> Self {
        let key = key.into();
        let relative = match &local_path {
            Ok(path) => path
                .strip_prefix(root_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
            Err(_) => key.clone(),
        };
        Self {
            item: WorkItem::new(key.clone(), relative, size_bytes),
            key,
            local_path,
            shadowed_by: None,
        }
    }

    fn destination(&self) -> String {
        match &self.local_path {
            Ok(path) => path.display().to_string(),
            Err(_) => String::new(),
        }
    }
}

/// List every object under the prefix and derive its local path.
///
/// Folder marker keys (ending in `/`) are not objects to download and are dropped.
pub(super) async fn enumerate(
    client: aws_sdk_s3::Client,
    input: &DownloadObjectsInput,
) -> Result<Vec<DownloadObjectJob>, Error> {
    let mut paginator = ListObjectsPaginator::new(
        client,
        input.bucket(),
        input.key_prefix().map(str::to_owned),
        None,
        false,
    );

    let root_dir = input.destination();
    let mut jobs = Vec::new();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    while let Some(page) = paginator.next_page().await {
        for object in page?.contents() {
            let Some(key) = object.key() else { continue };
            if key.ends_with(DEFAULT_DELIMITER) {
                tracing::debug!("skipping folder object {key}");
                continue;
            }

            let local_path = match input.path_policy() {
                LocalPathPolicy::KeepPath => local_key_path(root_dir, key, input.key_prefix()),
                LocalPathPolicy::Flatten => flattened_path(root_dir, key),
            };
            let size = u64::try_from(object.size().unwrap_or_default()).unwrap_or_default();
            let mut job = DownloadObjectJob::new(key, size, root_dir, local_path);

            // the first key listed for a local path wins
            if let Ok(path) = &job.local_path {
                match claimed.get(path) {
                    Some(previous) => {
                        tracing::warn!(
                            "{key} and {previous} both map to {}, skipping {key}",
                            path.display()
                        );
                        job.shadowed_by = Some(previous.clone());
                    }
                    None => {
                        claimed.insert(path.clone(), key.to_owned());
                    }
                }
            }
            jobs.push(job);
        }
    }

    Ok(jobs)
}

// feed jobs to the workers in listing order
pub(crate) async fn distribute_work(
    jobs: Vec<DownloadObjectJob>,
    work_tx: Sender<DownloadObjectJob>,
) -> Result<(), Error> {
    for job in jobs {
        if work_tx.send(job).await.is_err() {
            tracing::error!("all receiver ends have been dropped, unable to send a job!");
            break;
        }
    }
    Ok(())
}

// worker to download an object
pub(super) async fn download_objects(
    ctx: DownloadObjectsContext,
    work_rx: Receiver<DownloadObjectJob>,
) -> Result<(), Error> {
    while let Ok(job) = work_rx.recv().await {
        tracing::debug!(
            "worker recv'd request for key {:?} ({} bytes)",
            job.key,
            job.item.size_bytes()
        );
        let started_at = Utc::now();
        let state = ctx.state();
        let destination = job.destination();

        let result = match download_single_obj(&ctx, &job).await {
            Ok(Disposition::Transferred(bytes)) => {
                tracing::debug!("worker finished downloading key {:?}", job.key);
                TransferResult::new(job.item, destination, TransferOutcome::Success, bytes, started_at)
            }
            Ok(Disposition::Skipped) => {
                TransferResult::new(job.item, destination, TransferOutcome::Skipped, 0, started_at)
            }
            Err(err) => {
                tracing::error!(
                    "error downloading {}: {}",
                    job.key,
                    aws_smithy_types::error::display::DisplayErrorContext(&err)
                );
                TransferResult::failed(job.item, destination, started_at, &err)
            }
        };

        state.tally.lock()?.record(result);
    }

    tracing::trace!("req channel closed, worker finished");
    Ok(())
}

async fn download_single_obj(
    ctx: &DownloadObjectsContext,
    job: &DownloadObjectJob,
) -> Result<Disposition, Error> {
    let settings = &ctx.state().settings;
    let batch = ctx.state().batch;
    let local_path = match &job.local_path {
        Ok(path) => path,
        Err(reason) => return Err(error::invalid_input(reason.clone())),
    };

    if let Some(previous) = &job.shadowed_by {
        tracing::info!(
            "skipping {}, {} already downloads to {}",
            job.key,
            previous,
            local_path.display()
        );
        let sink = ctx.handle().config.progress_sink();
        sink.advance(batch.id(), job.item.size_bytes());
        return Ok(Disposition::Skipped);
    }

    if settings.dry_run {
        tracing::info!(
            "[dry run] would download s3://{}/{} to {}",
            settings.bucket,
            job.key,
            local_path.display()
        );
        let sink = ctx.handle().config.progress_sink();
        sink.advance(batch.id(), job.item.size_bytes());
        return Ok(Disposition::Skipped);
    }

    let download = ObjectDownload {
        client: ctx.client(),
        bucket: &settings.bucket,
        key: &job.key,
        destination: local_path,
    };
    let disposition = download_object(
        ctx.handle(),
        &download,
        settings.overwrite,
        Some(job.item.size_bytes()),
        Some(batch),
    )
    .await?;
    if disposition == Disposition::Skipped {
        tracing::info!("skipping {}, already exists", local_path.display());
    }
    Ok(disposition)
}

/// If the prefix is not empty AND the key contains the delimiter, strip the prefix from the key.
///
/// # Examples
///
/// ```ignore
/// let actual = strip_key_prefix("notes/2021/1.txt", Some("notes/2021/"));
/// assert_eq!("1.txt", actual);
///
/// // If the prefix is not the full name of the folder, the folder name will be truncated.
/// let actual = strip_key_prefix("top-level/sub-folder/1.txt", Some("top-"));
/// assert_eq!("level/sub-folder/1.txt", actual);
/// ```
fn strip_key_prefix<'a>(key: &'a str, prefix: Option<&str>) -> &'a str {
    let prefix = prefix.unwrap_or("");

    if key.is_empty()
        || prefix.is_empty()
        || !key.starts_with(prefix)
        || !key.contains(DEFAULT_DELIMITER)
    {
        return key;
    }

    let stripped = &key[prefix.len()..];
    if prefix.ends_with(DEFAULT_DELIMITER) {
        return stripped;
    }
    stripped.strip_prefix(DEFAULT_DELIMITER).unwrap_or(stripped)
}

/// Derive the local path for a key, keeping its path below the prefix
fn local_key_path(root_dir: &Path, key: &str, prefix: Option<&str>) -> Result<PathBuf, String> {
    let stripped = strip_key_prefix(key, prefix);
    let relative_path = if DEFAULT_DELIMITER == std::path::MAIN_SEPARATOR_STR {
        stripped.to_owned()
    } else {
        stripped.replace(DEFAULT_DELIMITER, std::path::MAIN_SEPARATOR_STR)
    };
    validate_path(root_dir, &relative_path, key)
}

/// Derive the local path for a key from its file name alone
fn flattened_path(root_dir: &Path, key: &str) -> Result<PathBuf, String> {
    validate_path(root_dir, key_file_name(key), key)
}

// the resolved path may not leave the destination directory
fn validate_path(root_dir: &Path, relative_path: &str, key: &str) -> Result<PathBuf, String> {
    resolve_below(root_dir, Path::new(relative_path)).ok_or_else(|| {
        format!(
            "Unable to download key: '{key}', its relative path resolves outside the target destination directory"
        )
    })
}

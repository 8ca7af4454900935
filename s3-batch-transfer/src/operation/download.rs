/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Operation builders
pub mod builders;

mod input;
pub use input::{DownloadInput, DownloadInputBuilder};

use crate::client::Handle;
use crate::error::{self, Error};
use crate::operation::{Disposition, DEFAULT_DELIMITER};
use crate::profile::TransferProfile;
use crate::progress::{BatchProgress, ProgressReporter};
use crate::types::{TransferOutcome, TransferResult, WorkItem};

/// Operation struct for single object download
#[derive(Clone, Default, Debug)]
pub(crate) struct Download;

impl Download {
    /// Execute a single `Download` transfer operation
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        input: DownloadInput,
    ) -> Result<TransferResult, Error> {
        let started_at = Utc::now();
        let destination = resolve_destination(input.destination(), input.key()).await;
        let download = ObjectDownload {
            client: handle.config.client(),
            bucket: input.bucket(),
            key: input.key(),
            destination: &destination,
        };

        let disposition = download_object(&handle, &download, input.overwrite(), None, None).await?;
        let (outcome, size_bytes, bytes) = match disposition {
            Disposition::Transferred(bytes) => (TransferOutcome::Success, bytes, bytes),
            Disposition::Skipped => {
                tracing::info!("skipping {}, already exists", destination.display());
                let size = fs::metadata(&destination).await?.len();
                (TransferOutcome::Skipped, size, 0)
            }
        };

        let item = WorkItem::new(input.key(), key_file_name(input.key()), size_bytes);
        Ok(TransferResult::new(
            item,
            destination.display().to_string(),
            outcome,
            bytes,
            started_at,
        ))
    }
}

/// An existing directory as destination receives the key's file name
async fn resolve_destination(destination: &Path, key: &str) -> PathBuf {
    match fs::metadata(destination).await {
        Ok(meta) if meta.is_dir() => destination.join(key_file_name(key)),
        _ => destination.to_path_buf(),
    }
}

/// Last segment of `key`
pub(crate) fn key_file_name(key: &str) -> &str {
    key.trim_end_matches(DEFAULT_DELIMITER)
        .rsplit(DEFAULT_DELIMITER)
        .next()
        .unwrap_or(key)
}

/// Download one object to one local file, reporting progress as bytes arrive.
///
/// `size_hint` is the object size when already known from a listing, otherwise it is
/// read with `HeadObject`. When `batch` is given, a skipped object still advances it by
/// the object size.
pub(crate) async fn download_object(
    handle: &Handle,
    download: &ObjectDownload<'_>,
    overwrite: bool,
    size_hint: Option<u64>,
    batch: Option<BatchProgress>,
) -> Result<Disposition, Error> {
    let config = &handle.config;
    if !overwrite && download.local_exists().await? {
        if let Some(batch) = batch {
            config
                .progress_sink()
                .advance(batch.id(), size_hint.unwrap_or_default());
        }
        return Ok(Disposition::Skipped);
    }

    let size_bytes = match size_hint {
        Some(size) => size,
        None => download.content_length().await?,
    };
    let profile = handle.download_profile(size_bytes);
    let mut progress = ProgressReporter::new(
        config.progress_sink().clone(),
        download.key,
        size_bytes,
        config.progress_unit(),
        batch,
    );

    match download.send(size_bytes, profile, &mut progress).await {
        Ok(bytes) => Ok(Disposition::Transferred(bytes)),
        Err(err) => {
            progress.abandon();
            Err(err)
        }
    }
}

/// Download of one object key to one local file
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectDownload<'a> {
    pub(crate) client: &'a aws_sdk_s3::Client,
    pub(crate) bucket: &'a str,
    pub(crate) key: &'a str,
    pub(crate) destination: &'a Path,
}

impl ObjectDownload<'_> {
    pub(crate) async fn local_exists(&self) -> Result<bool, Error> {
        Ok(fs::try_exists(self.destination).await?)
    }

    /// Size of the remote object
    pub(crate) async fn content_length(&self) -> Result<u64, Error> {
        let head = self
            .client
            .head_object()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await?;
        let length = head.content_length().unwrap_or_default();
        u64::try_from(length).map_err(|_| {
            error::invalid_input(format!("object {} reported size {length}", self.key))
        })
    }

    /// Write the object to the destination, returning the number of bytes received.
    ///
    /// Parent directories are created. On failure the partially written file is removed.
    pub(crate) async fn send(
        &self,
        size_bytes: u64,
        profile: Option<TransferProfile>,
        progress: &mut ProgressReporter,
    ) -> Result<u64, Error> {
        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        let result = match profile {
            None => fs::File::create(self.destination)
                .await
                .map(|_| 0)
                .map_err(Error::from),
            Some(profile) if profile.is_multipart(size_bytes) => {
                self.ranged_download(size_bytes, profile, progress).await
            }
            Some(_) => self.streamed_download(progress).await,
        };

        if result.is_err() {
            if let Err(err) = fs::remove_file(self.destination).await {
                tracing::debug!(
                    "could not remove partial download {}: {err}",
                    self.destination.display()
                );
            }
        }
        result
    }

    async fn streamed_download(&self, progress: &mut ProgressReporter) -> Result<u64, Error> {
        let resp = self
            .client
            .get_object()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await?;

        let mut dest = fs::File::create(self.destination).await?;
        let mut body = resp.body;
        let mut received = 0;
        while let Some(chunk) = body.try_next().await? {
            dest.write_all(&chunk).await?;
            received += chunk.len() as u64;
            progress.on_bytes(chunk.len() as u64);
        }
        dest.flush().await?;
        Ok(received)
    }

    async fn ranged_download(
        &self,
        size_bytes: u64,
        profile: TransferProfile,
        progress: &mut ProgressReporter,
    ) -> Result<u64, Error> {
        // size the file first so every part can be written at its offset
        let dest = fs::File::create(self.destination).await?;
        dest.set_len(size_bytes).await?;
        drop(dest);

        let mut in_flight = stream::iter(profile.part_ranges(size_bytes))
            .map(|(offset, length)| self.download_part(offset, length))
            .buffer_unordered(profile.part_concurrency());

        let mut received = 0;
        while let Some(length) = in_flight.try_next().await? {
            received += length;
            progress.on_bytes(length);
        }
        Ok(received)
    }

    async fn download_part(&self, offset: u64, length: u64) -> Result<u64, Error> {
        let range = format!("bytes={}-{}", offset, offset + length - 1);
        let resp = self
            .client
            .get_object()
            .bucket(self.bucket)
            .key(self.key)
            .range(&range)
            .send()
            .await?;

        let mut dest = fs::OpenOptions::new()
            .write(true)
            .open(self.destination)
            .await?;
        dest.seek(SeekFrom::Start(offset)).await?;

        let mut body = resp.body;
        let mut received = 0;
        while let Some(chunk) = body.try_next().await? {
            dest.write_all(&chunk).await?;
            received += chunk.len() as u64;
        }
        dest.flush().await?;

        if received != length {
            return Err(Error::new(
                error::ErrorKind::TransferFailed,
                format!("range {range} of {} returned {received} bytes", self.key),
            ));
        }
        tracing::trace!("downloaded {range} of {}", self.key);
        Ok(received)
    }
}

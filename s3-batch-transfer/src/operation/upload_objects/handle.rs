/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::task;

use super::{UploadObjectsContext, UploadObjectsOutput};
use crate::error::Error;
use crate::manifest::{BatchManifest, ManifestEntry};
use crate::operation::{log_summary, partition_results};
use crate::types::TransferResult;

/// Handle for `UploadObjects` operation
///
/// # Cancellation
///
/// Dropping the handle cancels every in-flight upload at its next await point. A
/// multipart upload interrupted this way is not aborted on the server. Call
/// [`Self::abort`] to stop the batch and wait for the workers to wind down.
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadObjectsHandle {
    /// All child tasks spawned for this upload
    pub(crate) tasks: task::JoinSet<Result<(), Error>>,
    /// The context used to drive an upload to completion
    pub(crate) ctx: UploadObjectsContext,
}

impl UploadObjectsHandle {
    /// Consume the handle and wait for every file of the batch to reach a terminal state.
    ///
    /// Individual transfer failures are reported in
    /// [`failed_transfers`](UploadObjectsOutput::failed_transfers), they never fail the batch.
    /// Once all uploads are done the batch manifest is written if one was requested; a
    /// manifest write failure is logged and leaves [`UploadObjectsOutput::manifest`] empty.
    #[tracing::instrument(skip_all, level = "debug", name = "join-upload-objects")]
    pub async fn join(mut self) -> Result<UploadObjectsOutput, Error> {
        while let Some(join_result) = self.tasks.join_next().await {
            if let Err(err) = join_result? {
                tracing::warn!("upload worker exited early: {err}");
            }
        }

        let state = self.ctx.state();
        let sink = self.ctx.handle().config.progress_sink();
        sink.complete(state.batch.id());

        let (results, bytes_transferred) = state.tally.lock()?.take();
        let manifest = match state.input.manifest_key() {
            Some(key) if !state.input.dry_run() => self.write_manifest(key, &results).await,
            _ => None,
        };

        let (successful, skipped, failed) = partition_results(results);
        log_summary(
            "upload",
            successful.len(),
            skipped.len(),
            failed.len(),
            bytes_transferred,
            state.started.elapsed(),
        );

        let output = UploadObjectsOutput::builder()
            .set_successful_transfers(successful)
            .set_skipped_transfers(skipped)
            .set_failed_transfers(failed)
            .total_bytes_transferred(bytes_transferred)
            .set_manifest(manifest);
        Ok(output.build())
    }

    /// Stop the batch. Uploads in flight are cancelled and nothing further is started.
    pub async fn abort(mut self) -> Result<(), Error> {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        let sink = self.ctx.handle().config.progress_sink();
        sink.complete(self.ctx.state().batch.id());
        Ok(())
    }

    async fn write_manifest(&self, key: &str, results: &[TransferResult]) -> Option<BatchManifest> {
        let state = self.ctx.state();
        let manifest = build_manifest(
            state.base_directory.display().to_string(),
            state.input.append_suffix().unwrap_or_default(),
            results,
        )?
        .with_key_base(state.key_base.as_str());

        let body = match manifest.to_json() {
            Ok(body) => body,
            Err(err) => {
                tracing::error!("failed to serialize the batch manifest: {err}");
                return None;
            }
        };

        let put = self
            .ctx
            .client()
            .put_object()
            .bucket(state.input.bucket())
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await;

        match put {
            Ok(_) => {
                tracing::info!(
                    "wrote manifest of {} files to s3://{}/{}",
                    manifest.files.len(),
                    state.input.bucket(),
                    key
                );
                Some(manifest)
            }
            Err(err) => {
                tracing::error!(
                    "failed to write manifest to s3://{}/{}: {}",
                    state.input.bucket(),
                    key,
                    DisplayErrorContext(&err)
                );
                None
            }
        }
    }
}

/// Manifest of every object present at the end of the batch, `None` when there are none
fn build_manifest(
    directory: String,
    append_suffix: &str,
    results: &[TransferResult],
) -> Option<BatchManifest> {
    let mut present: Vec<&TransferResult> = results
        .iter()
        .filter(|r| r.error().is_none())
        .collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.destination().cmp(b.destination()));

    let mut manifest = BatchManifest::new(directory, append_suffix);
    for result in present {
        manifest.push(ManifestEntry::new(
            result.destination(),
            result.item().size_bytes(),
            result.finished_at(),
        ));
    }
    Some(manifest)
}

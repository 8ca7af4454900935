/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio::task;

use super::{DownloadObjectsContext, DownloadObjectsOutput};
use crate::error::Error;
use crate::operation::{log_summary, partition_results};

/// Handle for `DownloadObjects` operation
///
/// Dropping the handle cancels every in-flight download. Partially written files of
/// cancelled downloads are left on disk.
#[derive(Debug)]
#[non_exhaustive]
pub struct DownloadObjectsHandle {
    /// All child tasks spawned for this download
    pub(crate) tasks: task::JoinSet<Result<(), Error>>,
    /// The context used to drive a download to completion
    pub(crate) ctx: DownloadObjectsContext,
}

impl DownloadObjectsHandle {
    /// Consume the handle and wait for every object of the batch to reach a terminal state.
    ///
    /// Individual download failures are reported in
    /// [`failed_transfers`](DownloadObjectsOutput::failed_transfers).
    #[tracing::instrument(skip_all, level = "debug", name = "join-download-objects")]
    pub async fn join(mut self) -> Result<DownloadObjectsOutput, Error> {
        while let Some(join_result) = self.tasks.join_next().await {
            if let Err(err) = join_result? {
                tracing::warn!("download worker exited early: {err}");
            }
        }

        let state = self.ctx.state();
        let sink = self.ctx.handle().config.progress_sink();
        sink.complete(state.batch.id());

        let (results, bytes_transferred) = state.tally.lock()?.take();
        let (successful, skipped, failed) = partition_results(results);
        log_summary(
            "download",
            successful.len(),
            skipped.len(),
            failed.len(),
            bytes_transferred,
            state.started.elapsed(),
        );

        let output = DownloadObjectsOutput::builder()
            .set_successful_transfers(successful)
            .set_skipped_transfers(skipped)
            .set_failed_transfers(failed)
            .total_bytes_transferred(bytes_transferred);
        Ok(output.build())
    }

    /// Stop the batch. Downloads in flight are cancelled and nothing further is started.
    pub async fn abort(mut self) -> Result<(), Error> {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        let sink = self.ctx.handle().config.progress_sink();
        sink.complete(self.ctx.state().batch.id());
        Ok(())
    }
}

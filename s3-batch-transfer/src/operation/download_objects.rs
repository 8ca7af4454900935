/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

mod input;
/// Input type for downloading multiple objects from Amazon S3
pub use input::{DownloadObjectsInput, DownloadObjectsInputBuilder};
mod output;
/// Output type for downloading multiple objects from Amazon S3
pub use output::{DownloadObjectsOutput, DownloadObjectsOutputBuilder};

mod handle;
pub use handle::DownloadObjectsHandle;

pub(crate) mod worker;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::Instrument;

use crate::metrics::unit::ByteUnit;
use crate::progress::BatchProgress;

use super::{BatchTally, TransferContext};
use worker::DownloadObjectJob;

/// Operation struct for downloading multiple objects from Amazon S3
#[derive(Clone, Default, Debug)]
pub(crate) struct DownloadObjects;

impl DownloadObjects {
    /// Execute a single `DownloadObjects` transfer operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: DownloadObjectsInput,
    ) -> Result<DownloadObjectsHandle, crate::error::Error> {
        let jobs = worker::enumerate(handle.config.client().clone(), &input).await?;
        let label = format!(
            "Downloading s3://{}/{}",
            input.bucket(),
            input.key_prefix().unwrap_or_default()
        );
        let settings = BatchSettings {
            bucket: input.bucket,
            overwrite: input.overwrite,
            dry_run: input.dry_run,
        };
        Ok(Self::spawn(handle, settings, &label, jobs))
    }

    /// Start the worker pool over an already enumerated batch
    pub(crate) fn spawn(
        handle: Arc<crate::client::Handle>,
        settings: BatchSettings,
        label: &str,
        jobs: Vec<DownloadObjectJob>,
    ) -> DownloadObjectsHandle {
        let total_bytes: u64 = jobs.iter().map(|j| j.item.size_bytes()).sum();
        tracing::info!(
            "downloading {} objects ({}) from s3://{}{}",
            jobs.len(),
            ByteUnit::display(total_bytes),
            settings.bucket,
            if settings.dry_run { " (dry run)" } else { "" }
        );

        let batch = BatchProgress::start(handle.config.progress_sink().as_ref(), label, total_bytes);
        let concurrency = handle.num_workers();
        let ctx = DownloadObjectsContext::new(
            handle,
            DownloadObjectsState {
                settings,
                batch,
                started: Instant::now(),
                tally: Mutex::new(BatchTally::default()),
            },
        );

        // spawn all work into the same JoinSet such that when the set is dropped all tasks are cancelled.
        let mut tasks = JoinSet::new();
        let (work_tx, work_rx) = async_channel::bounded(concurrency);

        tasks.spawn(worker::distribute_work(jobs, work_tx));

        for i in 0..concurrency {
            let worker = worker::download_objects(ctx.clone(), work_rx.clone())
                .instrument(tracing::debug_span!("object-downloader", worker = i));
            tasks.spawn(worker);
        }

        DownloadObjectsHandle { tasks, ctx }
    }
}

/// Per batch switches shared by every worker
#[derive(Debug, Clone)]
pub(crate) struct BatchSettings {
    pub(crate) bucket: String,
    pub(crate) overwrite: bool,
    pub(crate) dry_run: bool,
}

/// DownloadObjects operation specific state
#[derive(Debug)]
pub(crate) struct DownloadObjectsState {
    settings: BatchSettings,
    batch: BatchProgress,
    started: Instant,
    tally: Mutex<BatchTally>,
}

pub(crate) type DownloadObjectsContext = TransferContext<DownloadObjectsState>;

impl DownloadObjectsContext {
    fn new(handle: Arc<crate::client::Handle>, state: DownloadObjectsState) -> Self {
        Self {
            handle,
            state: Arc::new(state),
        }
    }
}

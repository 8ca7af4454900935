/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Operation builders
pub mod builders;

mod input;
pub use input::{UploadObjectsInput, UploadObjectsInputBuilder};

mod handle;
pub use handle::UploadObjectsHandle;

mod output;
pub use output::{UploadObjectsOutput, UploadObjectsOutputBuilder};
use tokio::task::JoinSet;
use tracing::Instrument;

mod worker;

use crate::metrics::unit::ByteUnit;
use crate::progress::BatchProgress;

use super::{BatchTally, TransferContext};

/// Operation struct for uploading multiple objects to Amazon S3
#[derive(Clone, Default, Debug)]
pub(crate) struct UploadObjects;

impl UploadObjects {
    /// Execute a single `UploadObjects` transfer operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: UploadObjectsInput,
    ) -> Result<UploadObjectsHandle, crate::error::Error> {
        // enumerate everything up front, the total size is the denominator of the batch progress
        let enumerate_input = input.clone();
        let enumerated =
            tokio::task::spawn_blocking(move || worker::enumerate(&enumerate_input)).await??;

        let total_bytes: u64 = enumerated.jobs.iter().map(|j| j.item.size_bytes()).sum();
        tracing::info!(
            "uploading {} files ({}) from {} to s3://{}{}",
            enumerated.jobs.len(),
            ByteUnit::display(total_bytes),
            input.source().display(),
            input.bucket(),
            if input.dry_run() { " (dry run)" } else { "" }
        );

        let batch = BatchProgress::start(
            handle.config.progress_sink().as_ref(),
            &format!("Uploading {}", input.source().display()),
            total_bytes,
        );

        let concurrency = handle.num_workers();
        let ctx = UploadObjectsContext::new(
            handle,
            UploadObjectsState {
                input,
                base_directory: enumerated.base_directory,
                key_base: enumerated.key_base,
                batch,
                started: Instant::now(),
                tally: Mutex::new(BatchTally::default()),
            },
        );

        // spawn all work into the same JoinSet such that when the set is dropped all tasks are cancelled.
        let mut tasks = JoinSet::new();
        let (work_tx, work_rx) = async_channel::bounded(concurrency);

        // spawn worker to distribute work in enumeration order
        tasks.spawn(worker::distribute_work(enumerated.jobs, work_tx));

        for i in 0..concurrency {
            let worker = worker::upload_objects(ctx.clone(), work_rx.clone())
                .instrument(tracing::debug_span!("object-uploader", worker = i));
            tasks.spawn(worker);
        }

        Ok(UploadObjectsHandle { tasks, ctx })
    }
}

/// UploadObjects operation specific state
#[derive(Debug)]
pub(crate) struct UploadObjectsState {
    input: UploadObjectsInput,
    /// Local directory keys are derived relative to, recorded in the manifest
    base_directory: PathBuf,
    /// Prefix object keys were derived below, recorded in the manifest
    key_base: String,
    batch: BatchProgress,
    started: Instant,
    tally: Mutex<BatchTally>,
}

type UploadObjectsContext = TransferContext<UploadObjectsState>;

impl UploadObjectsContext {
    fn new(handle: Arc<crate::client::Handle>, state: UploadObjectsState) -> Self {
        Self {
            handle,
            state: Arc::new(state),
        }
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::unit::ByteUnit;
use crate::metrics::Throughput;
use crate::types::{TransferOutcome, TransferResult};

/// Single object upload
pub(crate) mod upload;

/// Types for single object download operation
pub mod download;

/// Types for multiple object upload operation
pub mod upload_objects;

/// Types for multiple object download operation
pub mod download_objects;

/// Types for downloading the objects recorded in a batch manifest
pub mod download_from_manifest;

/// Types for listing buckets
pub mod list_buckets;

/// Types for listing objects under a prefix
pub mod list_objects;

/// Separator between the segments of an object key
pub(crate) const DEFAULT_DELIMITER: &str = "/";

/// Container for maintaining context required to carry out a single operation/transfer.
///
/// `State` is whatever additional operation specific state is required for the operation.
#[derive(Debug)]
pub(crate) struct TransferContext<State> {
    handle: Arc<crate::client::Handle>,
    state: Arc<State>,
}

impl<State> TransferContext<State> {
    /// The S3 client to use for SDK operations
    pub(crate) fn client(&self) -> &aws_sdk_s3::Client {
        self.handle.config.client()
    }

    pub(crate) fn handle(&self) -> &Arc<crate::client::Handle> {
        &self.handle
    }

    pub(crate) fn state(&self) -> &State {
        &self.state
    }
}

impl<State> Clone for TransferContext<State> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            state: self.state.clone(),
        }
    }
}

/// What happened to a single object transfer that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// The object was transferred, with the number of bytes moved
    Transferred(u64),
    /// The destination already existed
    Skipped,
}

/// Results of one batch, shared between its workers behind a single lock
#[derive(Debug, Default)]
pub(crate) struct BatchTally {
    results: Vec<TransferResult>,
    bytes_transferred: u64,
}

impl BatchTally {
    pub(crate) fn record(&mut self, result: TransferResult) {
        self.bytes_transferred += result.bytes_transferred();
        self.results.push(result);
    }

    pub(crate) fn take(&mut self) -> (Vec<TransferResult>, u64) {
        (
            std::mem::take(&mut self.results),
            std::mem::take(&mut self.bytes_transferred),
        )
    }
}

/// Split results into (successful, skipped, failed) keeping their completion order
pub(crate) fn partition_results(
    results: Vec<TransferResult>,
) -> (Vec<TransferResult>, Vec<TransferResult>, Vec<TransferResult>) {
    let mut successful = Vec::new();
    let mut skipped = Vec::new();
    let mut failed = Vec::new();
    for result in results {
        match result.outcome() {
            TransferOutcome::Success => successful.push(result),
            TransferOutcome::Skipped => skipped.push(result),
            TransferOutcome::Failed => failed.push(result),
        }
    }
    (successful, skipped, failed)
}

/// Log the final summary line of a batch
pub(crate) fn log_summary(
    operation: &str,
    successful: usize,
    skipped: usize,
    failed: usize,
    bytes_transferred: u64,
    elapsed: Duration,
) {
    let throughput = Throughput::new(bytes_transferred, elapsed);
    if failed > 0 {
        tracing::warn!(
            "{operation} finished with failures: {successful} succeeded, {skipped} skipped, {failed} failed, {} in {:.2?} ({})",
            ByteUnit::display(bytes_transferred),
            elapsed,
            throughput
        );
    } else {
        tracing::info!(
            "{operation} finished: {successful} succeeded, {skipped} skipped, {} in {:.2?} ({})",
            ByteUnit::display(bytes_transferred),
            elapsed,
            throughput
        );
    }
}

/// A local path as a `/` separated key prefix.
///
/// Roots, `.` and leading `..` components are dropped, e.g. `./data/../logs/` becomes `logs`
/// and `/var/backups` becomes `var/backups`.
pub(crate) fn normalized_base(path: &Path) -> String {
    use path_clean::PathClean;

    path.clean()
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(DEFAULT_DELIMITER)
}

/// `relative` resolved below `root`, `None` if it is empty or would escape `root`
pub(crate) fn resolve_below(root: &Path, relative: &Path) -> Option<PathBuf> {
    use path_clean::PathClean;

    let relative = relative.clean();
    match relative.components().next() {
        Some(Component::Normal(_)) => Some(root.join(relative)),
        _ => None,
    }
}

/// Append `suffix` to the first segment of `base`, e.g. `data/2024` + `_prod` is `data_prod/2024`
pub(crate) fn suffixed_base(base: &str, suffix: &str) -> String {
    if base.is_empty() || suffix.is_empty() {
        return base.to_owned();
    }
    match base.split_once(DEFAULT_DELIMITER) {
        Some((first, rest)) => format!("{first}{suffix}{DEFAULT_DELIMITER}{rest}"),
        None => format!("{base}{suffix}"),
    }
}

/// Append `suffix` to the first segment of `key` if the key has at least two segments.
///
/// The final segment (the object's file name) is never altered.
pub(crate) fn apply_suffix(key: &str, suffix: &str) -> String {
    match key.split_once(DEFAULT_DELIMITER) {
        Some((first, rest)) if !first.is_empty() && !suffix.is_empty() => {
            format!("{first}{suffix}{DEFAULT_DELIMITER}{rest}")
        }
        _ => key.to_owned(),
    }
}

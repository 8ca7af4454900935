/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// The number of object transfers a batch operation may run at once.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencySetting {
    /// Use the library default.
    #[default]
    Auto,

    /// Explicitly configured number of concurrent object transfers.
    Explicit(usize),
}

/// Which flavor of S3 compatible service the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// Amazon S3 (or any service that behaves like it with regard to regions).
    #[default]
    Aws,

    /// Cloudflare R2. Requests are signed for the `auto` region.
    R2,
}

impl ProviderKind {
    /// Region that must be used for this provider regardless of what is configured, if any
    pub fn forced_region(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Aws => None,
            ProviderKind::R2 => Some("auto"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" | "s3" => Ok(ProviderKind::Aws),
            "r2" | "cloudflare" => Ok(ProviderKind::R2),
            other => Err(crate::error::invalid_input(format!(
                "unknown provider '{other}', expected one of: aws, r2"
            ))),
        }
    }
}

/// How a downloaded object's local path is derived from its key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocalPathPolicy {
    /// Keep the key's path (relative to the requested prefix) below the destination directory.
    #[default]
    KeepPath,

    /// Write every object directly into the destination directory under its basename.
    Flatten,
}

/// One file or object slated for transfer in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    source: String,
    relative_path: String,
    size_bytes: u64,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(source: impl Into<String>, relative_path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            source: source.into(),
            relative_path: relative_path.into(),
            size_bytes,
        }
    }

    /// Local path (uploads) or object key (downloads) the item is read from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Logical path of the item relative to the batch root, `/` separated
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Size of the item in bytes, as known when the batch was enumerated
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Terminal state of a single work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The object was transferred.
    Success,
    /// The destination already existed (or the batch was a dry run) and nothing was transferred.
    Skipped,
    /// The transfer failed; see [`TransferResult::error`].
    Failed,
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferOutcome::Success => "success",
            TransferOutcome::Skipped => "skipped",
            TransferOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The result of transferring one [`WorkItem`]. Exactly one is produced per item.
#[derive(Debug, Clone)]
pub struct TransferResult {
    item: WorkItem,
    destination: String,
    outcome: TransferOutcome,
    bytes_transferred: u64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    error: Option<String>,
}

impl TransferResult {
    pub(crate) fn new(
        item: WorkItem,
        destination: impl Into<String>,
        outcome: TransferOutcome,
        bytes_transferred: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item,
            destination: destination.into(),
            outcome,
            bytes_transferred,
            started_at,
            finished_at: Utc::now(),
            error: None,
        }
    }

    pub(crate) fn failed(
        item: WorkItem,
        destination: impl Into<String>,
        started_at: DateTime<Utc>,
        error: &crate::error::Error,
    ) -> Self {
        let mut result = Self::new(item, destination, TransferOutcome::Failed, 0, started_at);
        result.error = Some(format!(
            "{}",
            aws_smithy_types::error::display::DisplayErrorContext(error)
        ));
        result
    }

    /// The work item this result belongs to
    pub fn item(&self) -> &WorkItem {
        &self.item
    }

    /// Object key (uploads) or local path (downloads) the item was written to
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Terminal state of the item
    pub fn outcome(&self) -> TransferOutcome {
        self.outcome
    }

    /// Bytes actually moved over the network for this item
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// When processing of the item started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the item reached its terminal state
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Error chain rendered as text, for failed items
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

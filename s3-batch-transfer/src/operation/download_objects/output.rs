/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::TransferResult;

/// Output type for downloading multiple objects
#[non_exhaustive]
#[derive(Debug)]
pub struct DownloadObjectsOutput {
    /// Objects that were downloaded
    pub successful_transfers: Vec<TransferResult>,

    /// Objects whose local file already existed, or every object of a dry run
    pub skipped_transfers: Vec<TransferResult>,

    /// Objects that failed to download
    pub failed_transfers: Vec<TransferResult>,

    /// Total bytes received
    pub total_bytes_transferred: u64,
}

impl DownloadObjectsOutput {
    /// Creates a new builder-style object to manufacture [`DownloadObjectsOutput`]
    pub fn builder() -> DownloadObjectsOutputBuilder {
        DownloadObjectsOutputBuilder::default()
    }

    /// The number of objects that were successfully downloaded
    pub fn objects_downloaded(&self) -> u64 {
        self.successful_transfers.len() as u64
    }

    /// Objects that were downloaded
    pub fn successful_transfers(&self) -> &[TransferResult] {
        &self.successful_transfers
    }

    /// Objects that were not downloaded because their local file existed
    pub fn skipped_transfers(&self) -> &[TransferResult] {
        &self.skipped_transfers
    }

    /// The list of failed downloads
    pub fn failed_transfers(&self) -> &[TransferResult] {
        &self.failed_transfers
    }

    /// Total number of objects processed, whatever their outcome
    pub fn total_transfers(&self) -> usize {
        self.successful_transfers.len() + self.skipped_transfers.len() + self.failed_transfers.len()
    }

    /// The number of bytes successfully transferred (downloaded)
    pub fn total_bytes_transferred(&self) -> u64 {
        self.total_bytes_transferred
    }
}

/// Builder for [`DownloadObjectsOutput`]
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct DownloadObjectsOutputBuilder {
    pub(crate) successful_transfers: Vec<TransferResult>,
    pub(crate) skipped_transfers: Vec<TransferResult>,
    pub(crate) failed_transfers: Vec<TransferResult>,
    pub(crate) total_bytes_transferred: u64,
}

impl DownloadObjectsOutputBuilder {
    /// Set the successful downloads
    pub fn set_successful_transfers(mut self, input: Vec<TransferResult>) -> Self {
        self.successful_transfers = input;
        self
    }

    /// Set the skipped downloads
    pub fn set_skipped_transfers(mut self, input: Vec<TransferResult>) -> Self {
        self.skipped_transfers = input;
        self
    }

    /// Append a failed transfer.
    ///
    /// To override the contents of this collection use
    /// [`set_failed_transfers`](Self::set_failed_transfers)
    pub fn failed_transfers(mut self, input: TransferResult) -> Self {
        self.failed_transfers.push(input);
        self
    }

    /// Set a list of failed transfers
    pub fn set_failed_transfers(mut self, input: Vec<TransferResult>) -> Self {
        self.failed_transfers = input;
        self
    }

    /// The number of bytes successfully transferred (downloaded)
    pub fn total_bytes_transferred(mut self, input: u64) -> Self {
        self.total_bytes_transferred = input;
        self
    }

    /// Consume the builder and return the output
    pub fn build(self) -> DownloadObjectsOutput {
        DownloadObjectsOutput {
            successful_transfers: self.successful_transfers,
            skipped_transfers: self.skipped_transfers,
            failed_transfers: self.failed_transfers,
            total_bytes_transferred: self.total_bytes_transferred,
        }
    }
}

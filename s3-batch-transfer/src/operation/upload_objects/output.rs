/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::manifest::BatchManifest;
use crate::types::TransferResult;

/// Output type for uploading multiple objects
#[non_exhaustive]
#[derive(Debug)]
pub struct UploadObjectsOutput {
    /// Objects that were uploaded
    pub successful_transfers: Vec<TransferResult>,

    /// Files whose object already existed, or every file of a dry run
    pub skipped_transfers: Vec<TransferResult>,

    /// Files that failed to upload
    pub failed_transfers: Vec<TransferResult>,

    /// Total bytes sent
    pub total_bytes_transferred: u64,

    /// The manifest written for this batch, if any
    pub manifest: Option<BatchManifest>,
}

impl UploadObjectsOutput {
    /// Creates a new builder-style object to manufacture [`UploadObjectsOutput`]
    pub fn builder() -> UploadObjectsOutputBuilder {
        UploadObjectsOutputBuilder::default()
    }

    /// The number of objects successfully uploaded
    pub fn objects_uploaded(&self) -> u64 {
        self.successful_transfers.len() as u64
    }

    /// Objects that were uploaded
    pub fn successful_transfers(&self) -> &[TransferResult] {
        &self.successful_transfers
    }

    /// Files that were not uploaded because their object already existed
    pub fn skipped_transfers(&self) -> &[TransferResult] {
        &self.skipped_transfers
    }

    /// The list of failed uploads
    pub fn failed_transfers(&self) -> &[TransferResult] {
        &self.failed_transfers
    }

    /// Total number of files processed, whatever their outcome
    pub fn total_transfers(&self) -> usize {
        self.successful_transfers.len() + self.skipped_transfers.len() + self.failed_transfers.len()
    }

    /// Total bytes sent
    pub fn total_bytes_transferred(&self) -> u64 {
        self.total_bytes_transferred
    }

    /// The manifest written for this batch, if any
    pub fn manifest(&self) -> Option<&BatchManifest> {
        self.manifest.as_ref()
    }
}

/// Builder for [`UploadObjectsOutput`]
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct UploadObjectsOutputBuilder {
    pub(crate) successful_transfers: Vec<TransferResult>,
    pub(crate) skipped_transfers: Vec<TransferResult>,
    pub(crate) failed_transfers: Vec<TransferResult>,
    pub(crate) total_bytes_transferred: u64,
    pub(crate) manifest: Option<BatchManifest>,
}

impl UploadObjectsOutputBuilder {
    /// Set the successful uploads
    pub fn set_successful_transfers(mut self, input: Vec<TransferResult>) -> Self {
        self.successful_transfers = input;
        self
    }

    /// Set the skipped uploads
    pub fn set_skipped_transfers(mut self, input: Vec<TransferResult>) -> Self {
        self.skipped_transfers = input;
        self
    }

    /// Append a failed transfer.
    ///
    /// To override the contents of this collection use [`set_failed_transfers`](Self::set_failed_transfers)
    pub fn failed_transfers(mut self, input: TransferResult) -> Self {
        self.failed_transfers.push(input);
        self
    }

    /// The list of any failed uploads
    pub fn set_failed_transfers(mut self, input: Vec<TransferResult>) -> Self {
        self.failed_transfers = input;
        self
    }

    /// Total bytes sent
    pub fn total_bytes_transferred(mut self, input: u64) -> Self {
        self.total_bytes_transferred = input;
        self
    }

    /// The manifest written for the batch
    pub fn set_manifest(mut self, input: Option<BatchManifest>) -> Self {
        self.manifest = input;
        self
    }

    /// Consumes the builder and constructs an [`UploadObjectsOutput`]
    pub fn build(self) -> UploadObjectsOutput {
        UploadObjectsOutput {
            successful_transfers: self.successful_transfers,
            skipped_transfers: self.skipped_transfers,
            failed_transfers: self.failed_transfers,
            total_bytes_transferred: self.total_bytes_transferred,
            manifest: self.manifest,
        }
    }
}

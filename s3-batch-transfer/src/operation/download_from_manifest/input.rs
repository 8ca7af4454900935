/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use aws_smithy_types::error::operation::BuildError;

/// Input type for re-downloading the objects recorded in a batch manifest
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct DownloadFromManifestInput {
    /// The bucket holding the manifest and the objects it records
    pub bucket: String,

    /// Key of the manifest object
    pub manifest_key: String,

    /// Local root below which the recorded directory is recreated
    pub destination: PathBuf,

    /// Download even if the local file already exists
    pub overwrite: bool,

    /// Read the manifest and report without downloading any recorded object
    pub dry_run: bool,
}

impl DownloadFromManifestInput {
    /// Creates a new builder-style object to manufacture [`DownloadFromManifestInput`]
    pub fn builder() -> DownloadFromManifestInputBuilder {
        DownloadFromManifestInputBuilder::default()
    }

    /// The bucket holding the manifest and the objects it records
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key of the manifest object
    pub fn manifest_key(&self) -> &str {
        &self.manifest_key
    }

    /// Local root below which the recorded directory is recreated
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Whether existing local files are replaced
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Whether this is a dry run
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// A builder for [`DownloadFromManifestInput`]
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct DownloadFromManifestInputBuilder {
    pub(crate) bucket: Option<String>,
    pub(crate) manifest_key: Option<String>,
    pub(crate) destination: Option<PathBuf>,
    pub(crate) overwrite: bool,
    pub(crate) dry_run: bool,
}

impl DownloadFromManifestInputBuilder {
    /// The bucket holding the manifest and the objects it records
    ///
    /// This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The bucket holding the manifest and the objects it records
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The bucket holding the manifest and the objects it records
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// Key of the manifest object
    ///
    /// This field is required.
    pub fn manifest_key(mut self, input: impl Into<String>) -> Self {
        self.manifest_key = Some(input.into());
        self
    }

    /// Key of the manifest object
    pub fn set_manifest_key(mut self, input: Option<String>) -> Self {
        self.manifest_key = input;
        self
    }

    /// Key of the manifest object
    pub fn get_manifest_key(&self) -> &Option<String> {
        &self.manifest_key
    }

    /// Local root below which the recorded directory is recreated. Defaults to the current
    /// directory.
    pub fn destination(mut self, input: impl Into<PathBuf>) -> Self {
        self.destination = Some(input.into());
        self
    }

    /// Local root below which the recorded directory is recreated
    pub fn set_destination(mut self, input: Option<PathBuf>) -> Self {
        self.destination = input;
        self
    }

    /// Replace existing local files. Defaults to false.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.overwrite = input;
        self
    }

    /// Only report what would be downloaded. Defaults to false.
    pub fn dry_run(mut self, input: bool) -> Self {
        self.dry_run = input;
        self
    }

    /// Consumes the builder and constructs a [`DownloadFromManifestInput`]
    pub fn build(self) -> Result<DownloadFromManifestInput, BuildError> {
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BuildError::missing_field("bucket", "a bucket is required"))?;
        let manifest_key = self
            .manifest_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| BuildError::missing_field("manifest_key", "a manifest key is required"))?;

        Ok(DownloadFromManifestInput {
            bucket,
            manifest_key,
            destination: self.destination.unwrap_or_else(|| PathBuf::from(".")),
            overwrite: self.overwrite,
            dry_run: self.dry_run,
        })
    }
}

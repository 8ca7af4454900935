/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use aws_smithy_types::error::operation::BuildError;

use crate::types::LocalPathPolicy;

/// Input type for downloading multiple objects
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct DownloadObjectsInput {
    /// The bucket name containing the object(s).
    pub bucket: String,

    /// The destination directory to which files should be downloaded
    pub destination: PathBuf,

    /// Limit the response to keys that begin with the given prefix
    pub key_prefix: Option<String>,

    /// How local paths are derived from keys
    pub path_policy: LocalPathPolicy,

    /// Download even if the local file already exists
    pub overwrite: bool,

    /// List and report without writing anything
    pub dry_run: bool,
}

impl DownloadObjectsInput {
    /// Creates a new builder-style object to manufacture [`DownloadObjectsInput`]
    pub fn builder() -> DownloadObjectsInputBuilder {
        DownloadObjectsInputBuilder::default()
    }

    /// The bucket name containing the object(s).
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The destination directory to which files should be downloaded
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// How local paths are derived from keys
    pub fn path_policy(&self) -> LocalPathPolicy {
        self.path_policy
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

/// A builder for [`DownloadObjectsInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct DownloadObjectsInputBuilder {
    pub(crate) bucket: Option<String>,
    pub(crate) destination: Option<PathBuf>,
    pub(crate) key_prefix: Option<String>,
    pub(crate) path_policy: LocalPathPolicy,
    pub(crate) overwrite: bool,
    pub(crate) dry_run: bool,
}

impl DownloadObjectsInputBuilder {
    /// Set the bucket name containing the object(s) to download.
    ///
    /// NOTE: A bucket name is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// Set the bucket name containing the object(s) to download.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The bucket name containing the object(s).
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// Set the destination directory to which files should be downloaded
    ///
    /// NOTE: A destination directory is required.
    pub fn destination(mut self, input: impl Into<PathBuf>) -> Self {
        self.destination = Some(input.into());
        self
    }

    /// Set the destination directory to which files should be downloaded
    pub fn set_destination(mut self, input: Option<PathBuf>) -> Self {
        self.destination = input;
        self
    }

    /// The destination directory to which files should be downloaded
    pub fn get_destination(&self) -> &Option<PathBuf> {
        &self.destination
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.key_prefix = Some(input.into());
        self
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn set_key_prefix(mut self, input: Option<String>) -> Self {
        self.key_prefix = input;
        self
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn get_key_prefix(&self) -> &Option<String> {
        &self.key_prefix
    }

    /// How local paths are derived from keys. Defaults to [`LocalPathPolicy::KeepPath`].
    pub fn path_policy(mut self, input: LocalPathPolicy) -> Self {
        self.path_policy = input;
        self
    }

    /// How local paths are derived from keys
    pub fn get_path_policy(&self) -> LocalPathPolicy {
        self.path_policy
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

    /// Consumes the builder and constructs a [`DownloadObjectsInput`]
    pub fn build(self) -> Result<DownloadObjectsInput, BuildError> {
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BuildError::missing_field("bucket", "A bucket is required"))?;
        let destination = self.destination.ok_or_else(|| {
            BuildError::missing_field("destination", "Destination directory is required")
        })?;

        Ok(DownloadObjectsInput {
            bucket,
            destination,
            key_prefix: self.key_prefix.filter(|p| !p.is_empty()),
            path_policy: self.path_policy,
            overwrite: self.overwrite,
            dry_run: self.dry_run,
        })
    }
}

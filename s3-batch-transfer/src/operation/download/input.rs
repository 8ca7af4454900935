/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use aws_smithy_types::error::operation::BuildError;

/// Input type for downloading a single object
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct DownloadInput {
    /// The bucket name containing the object.
    pub bucket: String,

    /// Key of the object to get.
    pub key: String,

    /// Local file to write the object to. An existing directory receives the key's file name.
    pub destination: PathBuf,

    /// Download even if the local file already exists.
    pub overwrite: bool,
}

impl DownloadInput {
    /// Creates a new builder-style object to manufacture [`DownloadInput`]
    pub fn builder() -> DownloadInputBuilder {
        DownloadInputBuilder::default()
    }

    /// The bucket name containing the object.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key of the object to get.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Local file to write the object to.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Whether an existing local file is replaced.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
}

/// A builder for [`DownloadInput`]
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct DownloadInputBuilder {
    pub(crate) bucket: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) destination: Option<PathBuf>,
    pub(crate) overwrite: bool,
}

impl DownloadInputBuilder {
    /// The bucket name containing the object.
    ///
    /// This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The bucket name containing the object.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The bucket name containing the object.
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// Key of the object to get.
    ///
    /// This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Key of the object to get.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Key of the object to get.
    pub fn get_key(&self) -> &Option<String> {
        &self.key
    }

    /// Local file to write the object to.
    ///
    /// This field is required.
    pub fn destination(mut self, input: impl Into<PathBuf>) -> Self {
        self.destination = Some(input.into());
        self
    }

    /// Local file to write the object to.
    pub fn set_destination(mut self, input: Option<PathBuf>) -> Self {
        self.destination = input;
        self
    }

    /// Local file to write the object to.
    pub fn get_destination(&self) -> &Option<PathBuf> {
        &self.destination
    }

    /// Download even if the local file exists. Defaults to false.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.overwrite = input;
        self
    }

    /// Consumes the builder and constructs a [`DownloadInput`]
    pub fn build(self) -> Result<DownloadInput, BuildError> {
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BuildError::missing_field("bucket", "a bucket is required"))?;
        let key = self
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| BuildError::missing_field("key", "an object key is required"))?;
        let destination = self.destination.ok_or_else(|| {
            BuildError::missing_field("destination", "a local destination is required")
        })?;

        Ok(DownloadInput {
            bucket,
            key,
            destination,
            overwrite: self.overwrite,
        })
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;
use std::sync::Arc;

use super::{UploadObjectsHandle, UploadObjectsInputBuilder};

/// Fluent builder for constructing a multiple object upload
#[derive(Debug)]
pub struct UploadObjectsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: UploadObjectsInputBuilder,
}

impl UploadObjectsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: std::default::Default::default(),
        }
    }

    /// Initiate upload of multiple objects.
    ///
    /// Fails before any transfer starts if the source does not exist or is neither a file
    /// nor a directory.
    #[tracing::instrument(skip_all, level = "debug", name = "initiate-upload-objects", fields(
        bucket = self.inner.bucket.as_deref().unwrap_or_default(),
        source = self.inner.source.as_deref().map(|p| p.to_str().unwrap_or_default()).unwrap_or_default(),
        key_prefix = self.inner.key_prefix.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<UploadObjectsHandle, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::upload_objects::UploadObjects::orchestrate(self.handle, input).await
    }

    /// The S3 bucket name that objects will upload to.
    /// Required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// The S3 bucket name that objects will upload to.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// The S3 bucket name that objects will upload to.
    pub fn get_bucket(&self) -> &Option<String> {
        self.inner.get_bucket()
    }

    /// The local directory, or a single file, to upload.
    /// Required.
    pub fn source(mut self, input: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.source(input);
        self
    }

    /// The local directory, or a single file, to upload.
    pub fn set_source(mut self, input: Option<PathBuf>) -> Self {
        self.inner = self.inner.set_source(input);
        self
    }

    /// The local directory, or a single file, to upload.
    pub fn get_source(&self) -> &Option<PathBuf> {
        self.inner.get_source()
    }

    /// Whether to recurse into subdirectories when traversing local file tree.
    /// Defaults to true.
    pub fn recursive(mut self, input: bool) -> Self {
        self.inner = self.inner.recursive(input);
        self
    }

    /// Whether to follow symbolic links when traversing the local file tree.
    /// Defaults to false.
    pub fn follow_symlinks(mut self, input: bool) -> Self {
        self.inner = self.inner.follow_symlinks(input);
        self
    }

    /// The S3 key prefix to use for each object.
    /// If not provided, the source directory as given is used as the prefix.
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key_prefix(input);
        self
    }

    /// The S3 key prefix to use for each object.
    pub fn set_key_prefix(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key_prefix(input);
        self
    }

    /// Use each file's absolute local path, without the leading `/`, as its key.
    /// Defaults to false.
    pub fn keep_path(mut self, input: bool) -> Self {
        self.inner = self.inner.keep_path(input);
        self
    }

    /// Suffix appended to the first segment of every key, e.g. `data/a.txt` with `_prod`
    /// becomes `data_prod/a.txt`. Keys with a single segment are left untouched.
    pub fn append_suffix(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.append_suffix(input);
        self
    }

    /// Suffix appended to the first segment of every key.
    pub fn set_append_suffix(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_append_suffix(input);
        self
    }

    /// Upload even if an object already exists at the destination key.
    /// Defaults to false, existing objects are skipped.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.inner = self.inner.overwrite(input);
        self
    }

    /// Enumerate files and derive keys without making any S3 request.
    /// Defaults to false.
    pub fn dry_run(mut self, input: bool) -> Self {
        self.inner = self.inner.dry_run(input);
        self
    }

    /// Key to write a [`BatchManifest`](crate::manifest::BatchManifest) to once the batch
    /// completes. Nothing is written if no object was uploaded or skipped.
    pub fn manifest_key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.manifest_key(input);
        self
    }

    /// Key to write the batch manifest to.
    pub fn set_manifest_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_manifest_key(input);
        self
    }
}

impl UploadObjectsInputBuilder {
    /// Initiate upload of multiple objects using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<UploadObjectsHandle, crate::error::Error> {
        let mut fluent_builder = client.upload_objects();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}

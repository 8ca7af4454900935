/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;
use std::sync::Arc;

use super::{DownloadObjectsHandle, DownloadObjectsInputBuilder};
use crate::types::LocalPathPolicy;

/// Fluent builder for constructing a multiple object download
#[derive(Debug)]
pub struct DownloadObjectsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: DownloadObjectsInputBuilder,
}

impl DownloadObjectsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Initiate download of multiple objects.
    ///
    /// Every object under the prefix is listed before the first download starts. A listing
    /// failure fails the call; individual download failures are reported in the output.
    #[tracing::instrument(skip_all, level = "debug", name = "initiate-download-objects", fields(
        bucket = self.inner.bucket.as_deref().unwrap_or_default(),
        key_prefix = self.inner.key_prefix.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<DownloadObjectsHandle, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::download_objects::DownloadObjects::orchestrate(self.handle, input).await
    }

    /// Set the bucket name containing the object(s) to download.
    ///
    /// NOTE: A bucket name is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// Set the bucket name containing the object(s) to download.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// The bucket name containing the object(s).
    pub fn get_bucket(&self) -> &Option<String> {
        self.inner.get_bucket()
    }

    /// Set the destination directory to which files should be downloaded
    ///
    /// NOTE: A destination directory is required.
    pub fn destination(mut self, input: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.destination(input);
        self
    }

    /// Set the destination directory to which files should be downloaded
    pub fn set_destination(mut self, input: Option<PathBuf>) -> Self {
        self.inner = self.inner.set_destination(input);
        self
    }

    /// The destination directory to which files should be downloaded
    pub fn get_destination(&self) -> &Option<PathBuf> {
        self.inner.get_destination()
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key_prefix(input);
        self
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn set_key_prefix(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key_prefix(input);
        self
    }

    /// Limit the response to keys that begin with the given prefix
    pub fn get_key_prefix(&self) -> &Option<String> {
        self.inner.get_key_prefix()
    }

    /// Keep the key's path below the prefix, or flatten every object to its file name.
    pub fn path_policy(mut self, input: LocalPathPolicy) -> Self {
        self.inner = self.inner.path_policy(input);
        self
    }

    /// Replace existing local files. Defaults to false, existing files are skipped.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.inner = self.inner.overwrite(input);
        self
    }

    /// List the objects and report where they would go without downloading anything.
    pub fn dry_run(mut self, input: bool) -> Self {
        self.inner = self.inner.dry_run(input);
        self
    }
}

impl DownloadObjectsInputBuilder {
    /// Initiate download of multiple objects using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<DownloadObjectsHandle, crate::error::Error> {
        let mut fluent_builder = client.download_objects();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;
use std::sync::Arc;

use super::DownloadInputBuilder;
use crate::types::TransferResult;

/// Fluent builder for constructing a single object download
#[derive(Debug)]
pub struct DownloadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: DownloadInputBuilder,
}

impl DownloadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Download the object, resolving once it is written to disk (or skipped).
    ///
    /// A failed download returns the error; a partially written file is removed.
    #[tracing::instrument(skip_all, level = "debug", name = "download", fields(
        bucket = self.inner.bucket.as_deref().unwrap_or_default(),
        key = self.inner.key.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<TransferResult, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::download::Download::orchestrate(self.handle, input).await
    }

    /// The bucket name containing the object.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// The bucket name containing the object.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// The bucket name containing the object.
    pub fn get_bucket(&self) -> &Option<String> {
        self.inner.get_bucket()
    }

    /// Key of the object to get.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key(input);
        self
    }

    /// Key of the object to get.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key(input);
        self
    }

    /// Key of the object to get.
    pub fn get_key(&self) -> &Option<String> {
        self.inner.get_key()
    }

    /// Local file to write to. If it names an existing directory the key's file name is
    /// appended.
    pub fn destination(mut self, input: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.destination(input);
        self
    }

    /// Local file to write to.
    pub fn set_destination(mut self, input: Option<PathBuf>) -> Self {
        self.inner = self.inner.set_destination(input);
        self
    }

    /// Replace the local file if it exists. Defaults to false, the download is skipped.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.inner = self.inner.overwrite(input);
        self
    }
}

impl DownloadInputBuilder {
    /// Download the object using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<TransferResult, crate::error::Error> {
        let mut fluent_builder = client.download();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}

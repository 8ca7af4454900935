/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;
use std::sync::Arc;

use super::DownloadFromManifestInputBuilder;
use crate::operation::download_objects::DownloadObjectsHandle;

/// Fluent builder for re-downloading a recorded upload batch
#[derive(Debug)]
pub struct DownloadFromManifestFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: DownloadFromManifestInputBuilder,
}

impl DownloadFromManifestFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Fetch and validate the manifest, then start downloading every recorded object.
    ///
    /// Fails with [`ManifestInvalid`](crate::error::ErrorKind::ManifestInvalid) before any
    /// object is downloaded if the manifest cannot be parsed, names no directory or records
    /// no files.
    #[tracing::instrument(skip_all, level = "debug", name = "initiate-download-from-manifest", fields(
        bucket = self.inner.bucket.as_deref().unwrap_or_default(),
        manifest_key = self.inner.manifest_key.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<DownloadObjectsHandle, crate::error::Error> {
        let input = self.inner.build()?;
        super::DownloadFromManifest::orchestrate(self.handle, input).await
    }

    /// The bucket holding the manifest and the objects it records
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// The bucket holding the manifest and the objects it records
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// Key of the manifest object
    pub fn manifest_key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.manifest_key(input);
        self
    }

    /// Key of the manifest object
    pub fn set_manifest_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_manifest_key(input);
        self
    }

    /// Local root below which the recorded directory is recreated
    pub fn destination(mut self, input: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.destination(input);
        self
    }

    /// Replace existing local files. Defaults to false.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.inner = self.inner.overwrite(input);
        self
    }

    /// Only report what would be downloaded.
    pub fn dry_run(mut self, input: bool) -> Self {
        self.inner = self.inner.dry_run(input);
        self
    }
}

impl DownloadFromManifestInputBuilder {
    /// Start the download using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<DownloadObjectsHandle, crate::error::Error> {
        let mut fluent_builder = client.download_from_manifest();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}

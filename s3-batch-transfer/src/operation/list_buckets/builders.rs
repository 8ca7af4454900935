/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::catalog::BucketCatalog;

/// Fluent builder for listing the buckets visible to the configured credentials
#[derive(Debug)]
pub struct ListBucketsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    with_size: bool,
}

impl ListBucketsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            with_size: false,
        }
    }

    /// List the buckets, sizing each one when requested
    #[tracing::instrument(skip_all, level = "debug", name = "list-buckets", fields(with_size = self.with_size))]
    pub async fn send(self) -> Result<BucketCatalog, crate::error::Error> {
        super::ListBuckets::orchestrate(self.handle, self.with_size).await
    }

    /// Resolve the region, object count and total size of every bucket.
    ///
    /// This lists every object of every bucket. Defaults to false.
    pub fn with_size(mut self, input: bool) -> Self {
        self.with_size = input;
        self
    }

    /// Whether every bucket is sized
    pub fn get_with_size(&self) -> bool {
        self.with_size
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use super::ListObjectsInputBuilder;
use crate::catalog::ObjectTree;

/// Fluent builder for listing the objects under a prefix
#[derive(Debug)]
pub struct ListObjectsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: ListObjectsInputBuilder,
}

impl ListObjectsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Walk every page of the listing and arrange the objects as a tree
    #[tracing::instrument(skip_all, level = "debug", name = "list-objects", fields(
        bucket = self.inner.bucket.as_deref().unwrap_or_default(),
        prefix = self.inner.prefix.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<ObjectTree, crate::error::Error> {
        let input = self.inner.build()?;
        super::ListObjects::orchestrate(self.handle, input).await
    }

    /// The bucket to list
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// The bucket to list
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// Only list keys starting with this prefix
    pub fn prefix(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.prefix(input);
        self
    }

    /// Only list keys starting with this prefix
    pub fn set_prefix(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_prefix(input);
        self
    }

    /// Descend into every folder below the prefix. Defaults to true.
    pub fn recursive(mut self, input: bool) -> Self {
        self.inner = self.inner.recursive(input);
        self
    }
}

impl ListObjectsInputBuilder {
    /// List using the given client
    pub async fn send_with(self, client: &crate::Client) -> Result<ObjectTree, crate::error::Error> {
        let mut fluent_builder = client.list_objects();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}

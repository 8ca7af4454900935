/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::operation::BuildError;

/// Input type for listing the objects under a prefix
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ListObjectsInput {
    /// The bucket to list
    pub bucket: String,

    /// Only list keys starting with this prefix
    pub prefix: String,

    /// Descend into every folder below the prefix
    pub recursive: bool,
}

impl ListObjectsInput {
    /// Creates a new builder-style object to manufacture [`ListObjectsInput`]
    pub fn builder() -> ListObjectsInputBuilder {
        ListObjectsInputBuilder::default()
    }

    /// The bucket to list
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Only list keys starting with this prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether folders below the prefix are descended into
    pub fn recursive(&self) -> bool {
        self.recursive
    }
}

/// A builder for [`ListObjectsInput`]
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ListObjectsInputBuilder {
    pub(crate) bucket: Option<String>,
    pub(crate) prefix: Option<String>,
    pub(crate) recursive: bool,
}

impl Default for ListObjectsInputBuilder {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: None,
            recursive: true,
        }
    }
}

impl ListObjectsInputBuilder {
    /// The bucket to list
    ///
    /// This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The bucket to list
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The bucket to list
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// Only list keys starting with this prefix
    pub fn prefix(mut self, input: impl Into<String>) -> Self {
        self.prefix = Some(input.into());
        self
    }

    /// Only list keys starting with this prefix
    pub fn set_prefix(mut self, input: Option<String>) -> Self {
        self.prefix = input;
        self
    }

    /// Descend into every folder below the prefix. Defaults to true.
    pub fn recursive(mut self, input: bool) -> Self {
        self.recursive = input;
        self
    }

    /// Consumes the builder and constructs a [`ListObjectsInput`]
    pub fn build(self) -> Result<ListObjectsInput, BuildError> {
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BuildError::missing_field("bucket", "a bucket is required"))?;

        Ok(ListObjectsInput {
            bucket,
            prefix: self.prefix.unwrap_or_default(),
            recursive: self.recursive,
        })
    }
}

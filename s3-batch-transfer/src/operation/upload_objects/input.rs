/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use aws_smithy_types::error::operation::BuildError;

/// Input type for uploading multiple objects
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct UploadObjectsInput {
    /// The S3 bucket name that objects will upload to.
    pub bucket: String,

    /// The local directory (or single file) to upload from.
    pub source: PathBuf,

    /// Whether to recurse into subdirectories when traversing local file tree.
    pub recursive: bool,

    /// Whether to follow symbolic links when traversing the local file tree.
    pub follow_symlinks: bool,

    /// The S3 key prefix to use for each object instead of the source directory.
    pub key_prefix: Option<String>,

    /// Use each file's absolute local path (without the leading `/`) as its key.
    pub keep_path: bool,

    /// Suffix appended to the first segment of every key.
    pub append_suffix: Option<String>,

    /// Upload even if an object already exists at the destination key.
    pub overwrite: bool,

    /// Enumerate and derive keys without making any S3 requests.
    pub dry_run: bool,

    /// Key to write the batch manifest to once the batch completes.
    pub manifest_key: Option<String>,
}

impl UploadObjectsInput {
    /// Creates a new builder-style object to manufacture [`UploadObjectsInput`]
    pub fn builder() -> UploadObjectsInputBuilder {
        UploadObjectsInputBuilder::default()
    }

    /// The S3 bucket name that objects will upload to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The local directory (or single file) to upload from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether to recurse into subdirectories when traversing local file tree.
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Whether to follow symbolic links when traversing the local file tree.
    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    /// The S3 key prefix to use for each object.
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// Whether keys are derived from absolute local paths.
    pub fn keep_path(&self) -> bool {
        self.keep_path
    }

    /// Suffix appended to the first segment of every key, if any.
    pub fn append_suffix(&self) -> Option<&str> {
        self.append_suffix.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether existing objects are overwritten.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Whether this is a dry run.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Key the batch manifest is written to.
    pub fn manifest_key(&self) -> Option<&str> {
        self.manifest_key.as_deref()
    }
}

/// A builder for [`UploadObjectsInput`]
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct UploadObjectsInputBuilder {
    pub(crate) bucket: Option<String>,
    pub(crate) source: Option<PathBuf>,
    pub(crate) recursive: bool,
    pub(crate) follow_symlinks: bool,
    pub(crate) key_prefix: Option<String>,
    pub(crate) keep_path: bool,
    pub(crate) append_suffix: Option<String>,
    pub(crate) overwrite: bool,
    pub(crate) dry_run: bool,
    pub(crate) manifest_key: Option<String>,
}

impl Default for UploadObjectsInputBuilder {
    fn default() -> Self {
        Self {
            bucket: None,
            source: None,
            recursive: true,
            follow_symlinks: false,
            key_prefix: None,
            keep_path: false,
            append_suffix: None,
            overwrite: false,
            dry_run: false,
            manifest_key: None,
        }
    }
}

impl UploadObjectsInputBuilder {
    /// The S3 bucket name that objects will upload to.
    ///
    /// This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The S3 bucket name that objects will upload to.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// The S3 bucket name that objects will upload to.
    pub fn get_bucket(&self) -> &Option<String> {
        &self.bucket
    }

    /// The local directory (or single file) to upload from.
    ///
    /// This field is required.
    pub fn source(mut self, input: impl Into<PathBuf>) -> Self {
        self.source = Some(input.into());
        self
    }

    /// The local directory (or single file) to upload from.
    pub fn set_source(mut self, input: Option<PathBuf>) -> Self {
        self.source = input;
        self
    }

    /// The local directory (or single file) to upload from.
    pub fn get_source(&self) -> &Option<PathBuf> {
        &self.source
    }

    /// Whether to recurse into subdirectories. Defaults to true.
    pub fn recursive(mut self, input: bool) -> Self {
        self.recursive = input;
        self
    }

    /// Whether to recurse into subdirectories.
    pub fn get_recursive(&self) -> bool {
        self.recursive
    }

    /// Whether to follow symbolic links. Defaults to false.
    pub fn follow_symlinks(mut self, input: bool) -> Self {
        self.follow_symlinks = input;
        self
    }

    /// Whether to follow symbolic links.
    pub fn get_follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    /// The S3 key prefix to use for each object.
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.key_prefix = Some(input.into());
        self
    }

    /// The S3 key prefix to use for each object.
    pub fn set_key_prefix(mut self, input: Option<String>) -> Self {
        self.key_prefix = input;
        self
    }

    /// The S3 key prefix to use for each object.
    pub fn get_key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// Use each file's absolute local path as its key. Defaults to false.
    pub fn keep_path(mut self, input: bool) -> Self {
        self.keep_path = input;
        self
    }

    /// Whether keys are derived from absolute local paths.
    pub fn get_keep_path(&self) -> bool {
        self.keep_path
    }

    /// Suffix appended to the first segment of every key.
    pub fn append_suffix(mut self, input: impl Into<String>) -> Self {
        self.append_suffix = Some(input.into());
        self
    }

    /// Suffix appended to the first segment of every key.
    pub fn set_append_suffix(mut self, input: Option<String>) -> Self {
        self.append_suffix = input;
        self
    }

    /// Suffix appended to the first segment of every key.
    pub fn get_append_suffix(&self) -> Option<&str> {
        self.append_suffix.as_deref()
    }

    /// Upload even if the object exists. Defaults to false.
    pub fn overwrite(mut self, input: bool) -> Self {
        self.overwrite = input;
        self
    }

    /// Whether existing objects are overwritten.
    pub fn get_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Only report what would be uploaded. Defaults to false.
    pub fn dry_run(mut self, input: bool) -> Self {
        self.dry_run = input;
        self
    }

    /// Whether this is a dry run.
    pub fn get_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Key to write the batch manifest to.
    pub fn manifest_key(mut self, input: impl Into<String>) -> Self {
        self.manifest_key = Some(input.into());
        self
    }

    /// Key to write the batch manifest to.
    pub fn set_manifest_key(mut self, input: Option<String>) -> Self {
        self.manifest_key = input;
        self
    }

    /// Key to write the batch manifest to.
    pub fn get_manifest_key(&self) -> Option<&str> {
        self.manifest_key.as_deref()
    }

    /// Consumes the builder and constructs an [`UploadObjectsInput`]
    pub fn build(self) -> Result<UploadObjectsInput, BuildError> {
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BuildError::missing_field("bucket", "a bucket is required"))?;
        let source = self
            .source
            .ok_or_else(|| BuildError::missing_field("source", "a source path is required"))?;

        Ok(UploadObjectsInput {
            bucket,
            source,
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            key_prefix: self.key_prefix.filter(|p| !p.is_empty()),
            keep_path: self.keep_path,
            append_suffix: self.append_suffix,
            overwrite: self.overwrite,
            dry_run: self.dry_run,
            manifest_key: self.manifest_key.filter(|k| !k.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        assert!(UploadObjectsInput::builder().source("dir").build().is_err());
        assert!(UploadObjectsInput::builder()
            .bucket("")
            .source("dir")
            .build()
            .is_err());
        assert!(UploadObjectsInput::builder().bucket("b").build().is_err());

        let input = UploadObjectsInput::builder()
            .bucket("b")
            .source("dir")
            .append_suffix("")
            .build()
            .unwrap();
        assert!(input.recursive());
        assert_eq!(None, input.append_suffix());
    }
}

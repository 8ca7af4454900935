/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::profile::TransferProfile;
use crate::types::ConcurrencySetting;
use crate::{Config, DEFAULT_CONCURRENCY};

/// Batch transfer client for Amazon S3 and S3 compatible stores.
///
/// # Constructing a `Client`
///
/// A [`Config`] is required to construct a client. For most use cases, it is appropriate to
/// resolve it from the environment with [`from_env`](crate::from_env):
///
/// ```no_run
/// # async fn example() -> Result<(), s3_batch_transfer::error::Error> {
/// let config = s3_batch_transfer::from_env().load().await?;
/// let client = s3_batch_transfer::Client::new(config);
/// # Ok(())
/// # }
/// ```
///
/// Cloning a client is cheap; clones share the underlying S3 client and configuration.
#[derive(Debug, Clone)]
pub struct Client {
    handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. scheduler, budgets, config, env details, etc
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
}

impl Handle {
    /// Number of object transfers a batch runs at once
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencySetting::Auto => DEFAULT_CONCURRENCY,
            ConcurrencySetting::Explicit(explicit) => (*explicit).max(1),
        }
    }

    /// Profile for uploading an object of `size_bytes`, `None` for empty objects
    pub(crate) fn upload_profile(&self, size_bytes: u64) -> Option<TransferProfile> {
        self.profile(size_bytes, self.config.upload_profile())
    }

    /// Profile for downloading an object of `size_bytes`, `None` for empty objects
    pub(crate) fn download_profile(&self, size_bytes: u64) -> Option<TransferProfile> {
        self.profile(size_bytes, self.config.download_profile())
    }

    fn profile(&self, size_bytes: u64, fixed: &TransferProfile) -> Option<TransferProfile> {
        if self.config.adaptive_profiles() {
            TransferProfile::select(size_bytes)
        } else if size_bytes == 0 {
            None
        } else {
            Some(*fixed)
        }
    }
}

impl Client {
    /// Creates a new client from a batch transfer config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle { config });

        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Upload a local directory (or a single file) to an S3 bucket, one object per file.
    ///
    /// Existing objects are skipped unless `overwrite` is set. Socket files are never
    /// uploaded. The batch does not fail as a whole once started; inspect
    /// [`UploadObjectsOutput::failed_transfers`](crate::operation::upload_objects::UploadObjectsOutput::failed_transfers).
    ///
    /// # Examples
    /// ```no_run
    /// use std::path::Path;
    /// use s3_batch_transfer::operation::upload_objects::UploadObjectsOutput;
    ///
    /// async fn upload_directory(
    ///     client: &s3_batch_transfer::Client,
    ///     source: &Path,
    /// ) -> Result<UploadObjectsOutput, s3_batch_transfer::error::Error> {
    ///     let handle = client
    ///         .upload_objects()
    ///         .bucket("my-bucket")
    ///         .source(source)
    ///         .append_suffix("_staging")
    ///         .send()
    ///         .await?;
    ///
    ///     handle.join().await
    /// }
    /// ```
    pub fn upload_objects(
        &self,
    ) -> crate::operation::upload_objects::builders::UploadObjectsFluentBuilder {
        crate::operation::upload_objects::builders::UploadObjectsFluentBuilder::new(
            self.handle.clone(),
        )
    }

    /// Download a single object to a local file.
    ///
    /// The download is skipped if the destination already exists, unless `overwrite` is set.
    ///
    /// # Examples
    /// ```no_run
    /// async fn get(client: &s3_batch_transfer::Client) -> Result<(), s3_batch_transfer::error::Error> {
    ///     let result = client
    ///         .download()
    ///         .bucket("my-bucket")
    ///         .key("backups/2024/db.tar.gz")
    ///         .destination("/tmp/db.tar.gz")
    ///         .send()
    ///         .await?;
    ///     println!("{}: {}", result.destination(), result.outcome());
    ///     Ok(())
    /// }
    /// ```
    pub fn download(&self) -> crate::operation::download::builders::DownloadFluentBuilder {
        crate::operation::download::builders::DownloadFluentBuilder::new(self.handle.clone())
    }

    /// Download every object under a prefix into a local directory.
    ///
    /// # Examples
    /// ```no_run
    /// use s3_batch_transfer::types::LocalPathPolicy;
    ///
    /// async fn pull(client: &s3_batch_transfer::Client) -> Result<(), s3_batch_transfer::error::Error> {
    ///     let handle = client
    ///         .download_objects()
    ///         .bucket("my-bucket")
    ///         .key_prefix("backups/2024")
    ///         .destination("restore")
    ///         .path_policy(LocalPathPolicy::Flatten)
    ///         .send()
    ///         .await?;
    ///
    ///     let output = handle.join().await?;
    ///     println!("downloaded {} objects", output.successful_transfers().len());
    ///     Ok(())
    /// }
    /// ```
    pub fn download_objects(
        &self,
    ) -> crate::operation::download_objects::builders::DownloadObjectsFluentBuilder {
        crate::operation::download_objects::builders::DownloadObjectsFluentBuilder::new(
            self.handle.clone(),
        )
    }

    /// Download every object recorded in a batch manifest written by
    /// [`upload_objects`](Self::upload_objects).
    ///
    /// Objects are placed below `destination/<directory>` where `<directory>` is the local
    /// directory recorded in the manifest.
    pub fn download_from_manifest(
        &self,
    ) -> crate::operation::download_from_manifest::builders::DownloadFromManifestFluentBuilder
    {
        crate::operation::download_from_manifest::builders::DownloadFromManifestFluentBuilder::new(
            self.handle.clone(),
        )
    }

    /// List buckets, optionally with the total size and object count of each.
    ///
    /// Computing sizes lists every object of every bucket and is opt-in.
    pub fn list_buckets(&self) -> crate::operation::list_buckets::builders::ListBucketsFluentBuilder {
        crate::operation::list_buckets::builders::ListBucketsFluentBuilder::new(self.handle.clone())
    }

    /// List objects under a prefix as a tree.
    pub fn list_objects(&self) -> crate::operation::list_objects::builders::ListObjectsFluentBuilder {
        crate::operation::list_objects::builders::ListObjectsFluentBuilder::new(self.handle.clone())
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Batch transfers between local directories and Amazon S3 (or S3 compatible stores).
//!
//! The crate wraps the base Amazon S3 client with directory oriented operations:
//! every file under a local directory is uploaded as one object, every object under a
//! prefix is downloaded as one file. Each individual transfer picks a
//! [`TransferProfile`](crate::profile::TransferProfile) from the object size, reports
//! progress through a [`ProgressSink`](crate::progress::ProgressSink) and resolves to
//! exactly one [`TransferResult`](crate::types::TransferResult).
//!
//! # Examples
//!
//! Upload a directory and record a manifest of what was uploaded:
//!
//! ```no_run
//! # async fn example() -> Result<(), s3_batch_transfer::error::Error> {
//! let config = s3_batch_transfer::from_env().load().await?;
//! let client = s3_batch_transfer::Client::new(config);
//!
//! let handle = client
//!     .upload_objects()
//!     .bucket("my-bucket")
//!     .source("data/snapshots")
//!     .append_suffix("_prod")
//!     .manifest_key("data/latest_info.json")
//!     .send()
//!     .await?;
//!
//! let output = handle.join().await?;
//! for failed in output.failed_transfers() {
//!     eprintln!("{}: {:?}", failed.item().relative_path(), failed.error());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! See the documentation for each client operation for more information:
//!
//! * [`upload_objects`](crate::Client::upload_objects) - upload a directory or a single file
//! * [`download`](crate::Client::download) - download a single object to a local file
//! * [`download_objects`](crate::Client::download_objects) - download every object under a prefix
//! * [`download_from_manifest`](crate::Client::download_from_manifest) - re-download a recorded upload batch
//! * [`list_buckets`](crate::Client::list_buckets) - list buckets, optionally with their total size
//! * [`list_objects`](crate::Client::list_objects) - list objects under a prefix as a tree

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

/// Default number of concurrent object transfers per batch
pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error types emitted by `s3-batch-transfer`
pub mod error;

/// Common types used by `s3-batch-transfer`
pub mod types;

/// Transfer profiles selected from object size
pub mod profile;

/// Progress reporting
pub mod progress;

/// Byte units and throughput measurements
pub mod metrics;

/// Batch manifest persisted after an upload
pub mod manifest;

/// Renderable bucket and object listings
pub mod catalog;

/// Batch transfer client
pub mod client;

/// Batch transfer operations
pub mod operation;

/// Client configuration
pub mod config;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader that resolves credentials and endpoint from the environment
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}

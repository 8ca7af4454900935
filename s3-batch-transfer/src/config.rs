/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error::{self, Error};
use crate::metrics::unit::ByteUnit;
use crate::profile::TransferProfile;
use crate::progress::{NoopSink, ProgressSink};
use crate::types::{ConcurrencySetting, ProviderKind};

/// Loads a [`Config`] from explicit settings and the environment
pub mod loader;

/// Where the credentials of a loaded [`Config`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// Access key and secret passed explicitly
    Explicit,
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` environment variables
    Environment,
    /// A named profile from the shared config files
    Profile(String),
    /// The SDK default credentials provider chain
    DefaultChain,
}

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    client: aws_sdk_s3::Client,
    provider: ProviderKind,
    credentials_source: CredentialsSource,
    concurrency: ConcurrencySetting,
    adaptive_profiles: bool,
    upload_profile: TransferProfile,
    download_profile: TransferProfile,
    progress_sink: Arc<dyn ProgressSink>,
    progress_unit: ByteUnit,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The Amazon S3 client instance that will be used to send requests to S3.
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    /// The kind of S3 compatible service the client talks to
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Where the client credentials were resolved from
    pub fn credentials_source(&self) -> &CredentialsSource {
        &self.credentials_source
    }

    /// Number of object transfers a batch runs at once
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// Whether each transfer picks its profile from the object size.
    ///
    /// When disabled every upload uses [`upload_profile`](Self::upload_profile) and every
    /// download [`download_profile`](Self::download_profile).
    pub fn adaptive_profiles(&self) -> bool {
        self.adaptive_profiles
    }

    /// Profile used for uploads when adaptive selection is disabled
    pub fn upload_profile(&self) -> &TransferProfile {
        &self.upload_profile
    }

    /// Profile used for downloads when adaptive selection is disabled
    pub fn download_profile(&self) -> &TransferProfile {
        &self.download_profile
    }

    /// Sink that transfer progress is rendered to
    pub fn progress_sink(&self) -> &Arc<dyn ProgressSink> {
        &self.progress_sink
    }

    /// Unit transfer rates are displayed in
    pub fn progress_unit(&self) -> ByteUnit {
        self.progress_unit
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone)]
pub struct Builder {
    client: Option<aws_sdk_s3::Client>,
    provider: ProviderKind,
    credentials_source: CredentialsSource,
    concurrency: ConcurrencySetting,
    adaptive_profiles: bool,
    upload_profile: TransferProfile,
    download_profile: TransferProfile,
    progress_sink: Option<Arc<dyn ProgressSink>>,
    progress_unit: ByteUnit,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            client: None,
            provider: ProviderKind::default(),
            credentials_source: CredentialsSource::DefaultChain,
            concurrency: ConcurrencySetting::default(),
            adaptive_profiles: false,
            upload_profile: TransferProfile::DEFAULT_UPLOAD,
            download_profile: TransferProfile::DEFAULT_DOWNLOAD,
            progress_sink: None,
            progress_unit: ByteUnit::Mebibyte,
        }
    }
}

impl Builder {
    /// Set an explicit S3 client to use.
    pub fn client(mut self, client: aws_sdk_s3::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// The kind of S3 compatible service the client talks to.
    ///
    /// Default is [`ProviderKind::Aws`].
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub(crate) fn credentials_source(mut self, source: CredentialsSource) -> Self {
        self.credentials_source = source;
        self
    }

    /// Set the number of object transfers a batch may run at once.
    ///
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Pick each transfer's profile from the object size instead of the fixed defaults.
    ///
    /// Default is `false`.
    pub fn adaptive_profiles(mut self, enabled: bool) -> Self {
        self.adaptive_profiles = enabled;
        self
    }

    /// Profile used for uploads when adaptive selection is disabled.
    ///
    /// Default is [`TransferProfile::DEFAULT_UPLOAD`].
    pub fn upload_profile(mut self, profile: TransferProfile) -> Self {
        self.upload_profile = profile;
        self
    }

    /// Profile used for downloads when adaptive selection is disabled.
    ///
    /// Default is [`TransferProfile::DEFAULT_DOWNLOAD`].
    pub fn download_profile(mut self, profile: TransferProfile) -> Self {
        self.download_profile = profile;
        self
    }

    /// Sink that transfer progress is rendered to.
    ///
    /// Default renders nothing.
    pub fn progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    /// Unit transfer rates are displayed in. Default is [`ByteUnit::Mebibyte`].
    pub fn progress_unit(mut self, unit: ByteUnit) -> Self {
        self.progress_unit = unit;
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Result<Config, Error> {
        let client = self
            .client
            .ok_or_else(|| error::client_construction("an S3 client is required"))?;

        Ok(Config {
            client,
            provider: self.provider,
            credentials_source: self.credentials_source,
            concurrency: self.concurrency,
            adaptive_profiles: self.adaptive_profiles,
            upload_profile: self.upload_profile,
            download_profile: self.download_profile,
            progress_sink: self
                .progress_sink
                .unwrap_or_else(|| Arc::new(NoopSink::default())),
            progress_unit: self.progress_unit,
        })
    }
}

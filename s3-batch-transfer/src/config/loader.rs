/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_types::os_shim_internal::Env;
use aws_types::region::Region;
use url::Url;

use crate::config::{Builder, CredentialsSource};
use crate::error::{self, Error};
use crate::metrics::unit::ByteUnit;
use crate::profile::TransferProfile;
use crate::progress::ProgressSink;
use crate::types::{ConcurrencySetting, ProviderKind};
use crate::Config;

const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const ENDPOINT_URL_S3: &str = "AWS_ENDPOINT_URL_S3";
const ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
const REGION: &str = "AWS_REGION";
const DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// R2 access key ids are 32 characters long, AWS ones are 20
const R2_ACCESS_KEY_LEN: usize = 32;

/// Load batch transfer [`Config`] from explicit settings and the environment.
///
/// Credentials are resolved in priority order: explicit keys, the `AWS_ACCESS_KEY_ID` /
/// `AWS_SECRET_ACCESS_KEY` environment variables, a named profile, and finally the SDK
/// default provider chain. The endpoint is the explicit one, else `AWS_ENDPOINT_URL_S3`,
/// else `AWS_ENDPOINT_URL`.
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    profile_name: Option<String>,
    region: Option<String>,
    endpoint_url: Option<String>,
    provider: Option<ProviderKind>,
    env: Option<Env>,
}

impl ConfigLoader {
    /// Use an explicit access key pair. Takes priority over every other credentials source.
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self.session_token = session_token;
        self
    }

    /// Named profile from the shared config files to use when no keys are given explicitly
    /// or in the environment.
    pub fn profile_name(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_name = Some(profile_name.into());
        self
    }

    /// Region to sign requests for. Ignored for providers that require a fixed region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Custom endpoint, e.g. `https://<account>.r2.cloudflarestorage.com` or `localhost:9000`.
    ///
    /// An endpoint without a scheme is treated as `https`. Custom endpoints use path style
    /// addressing.
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// The kind of service behind the endpoint.
    ///
    /// When not set the provider is guessed from the access key id, which may misclassify.
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the number of object transfers a batch may run at once.
    ///
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.builder = self.builder.concurrency(concurrency);
        self
    }

    /// Pick each transfer's profile from the object size instead of the fixed defaults
    pub fn adaptive_profiles(mut self, enabled: bool) -> Self {
        self.builder = self.builder.adaptive_profiles(enabled);
        self
    }

    /// Profile used for uploads when adaptive selection is disabled
    pub fn upload_profile(mut self, profile: TransferProfile) -> Self {
        self.builder = self.builder.upload_profile(profile);
        self
    }

    /// Profile used for downloads when adaptive selection is disabled
    pub fn download_profile(mut self, profile: TransferProfile) -> Self {
        self.builder = self.builder.download_profile(profile);
        self
    }

    /// Sink that transfer progress is rendered to
    pub fn progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.builder = self.builder.progress_sink(sink);
        self
    }

    /// Unit transfer rates are displayed in
    pub fn progress_unit(mut self, unit: ByteUnit) -> Self {
        self.builder = self.builder.progress_unit(unit);
        self
    }

    /// Read environment variables from `env` instead of the process environment.
    ///
    /// Region, credentials and endpoint variables are looked up in `env`. Test builds also
    /// hand it to the SDK's default provider chain.
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    /// Load the configuration.
    ///
    /// Fails with [`ErrorKind::ClientConstruction`](crate::error::ErrorKind::ClientConstruction)
    /// if the endpoint is malformed or no credentials provider can be resolved.
    pub async fn load(self) -> Result<Config, Error> {
        let env = self.env.clone().unwrap_or_default();
        let endpoint = self.resolve_endpoint(&env)?;
        let (credentials, source) = self.resolve_credentials(&env);
        let provider = self.resolve_provider(credentials.as_ref());

        let mut loader = forward_env(aws_config::defaults(BehaviorVersion::latest()), self.env.as_ref());
        match (&credentials, &source) {
            (Some(credentials), _) => {
                loader = loader.credentials_provider(credentials.clone());
            }
            (None, CredentialsSource::Profile(name)) => {
                loader = loader.profile_name(name);
            }
            _ => {}
        }

        let region = provider
            .forced_region()
            .map(str::to_owned)
            .or_else(|| self.region.clone())
            .or_else(|| env_region(&env));
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        let sdk_config = loader.load().await;
        if sdk_config.credentials_provider().is_none() {
            return Err(error::client_construction(
                "no credentials provider could be resolved",
            ));
        }

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &endpoint {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }
        tracing::debug!(
            ?provider,
            ?source,
            endpoint = endpoint.as_deref().unwrap_or("default"),
            "resolved S3 client configuration"
        );

        self.builder
            .client(aws_sdk_s3::Client::from_conf(s3_config.build()))
            .provider(provider)
            .credentials_source(source)
            .build()
    }

    fn resolve_credentials(&self, env: &Env) -> (Option<Credentials>, CredentialsSource) {
        if let (Some(key), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
            let credentials = Credentials::new(
                key,
                secret,
                self.session_token.clone(),
                None,
                "s3-batch-explicit",
            );
            return (Some(credentials), CredentialsSource::Explicit);
        }

        if let (Ok(key), Ok(secret)) = (env.get(ACCESS_KEY_ID), env.get(SECRET_ACCESS_KEY)) {
            if !key.is_empty() && !secret.is_empty() {
                let credentials =
                    Credentials::new(key, secret, env.get(SESSION_TOKEN).ok(), None, "s3-batch-env");
                return (Some(credentials), CredentialsSource::Environment);
            }
        }

        match &self.profile_name {
            Some(name) => (None, CredentialsSource::Profile(name.clone())),
            None => (None, CredentialsSource::DefaultChain),
        }
    }

    fn resolve_endpoint(&self, env: &Env) -> Result<Option<String>, Error> {
        let configured = self
            .endpoint_url
            .clone()
            .or_else(|| env.get(ENDPOINT_URL_S3).ok())
            .or_else(|| env.get(ENDPOINT_URL).ok())
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        configured.map(|e| normalize_endpoint(&e)).transpose()
    }

    fn resolve_provider(&self, credentials: Option<&Credentials>) -> ProviderKind {
        if let Some(provider) = self.provider {
            return provider;
        }

        match credentials {
            Some(credentials) if credentials.access_key_id().len() == R2_ACCESS_KEY_LEN => {
                tracing::warn!(
                    "access key id is {R2_ACCESS_KEY_LEN} characters long, assuming a Cloudflare R2 endpoint; \
                     this is a guess, set the provider explicitly to silence this warning"
                );
                ProviderKind::R2
            }
            _ => ProviderKind::Aws,
        }
    }
}

/// Region from `AWS_REGION`, else `AWS_DEFAULT_REGION`
fn env_region(env: &Env) -> Option<String> {
    [REGION, DEFAULT_REGION]
        .into_iter()
        .filter_map(|var| env.get(var).ok())
        .map(|r| r.trim().to_owned())
        .find(|r| !r.is_empty())
}

#[cfg(test)]
fn forward_env(loader: aws_config::ConfigLoader, env: Option<&Env>) -> aws_config::ConfigLoader {
    match env {
        Some(env) => loader.env(env.clone()),
        None => loader,
    }
}

#[cfg(not(test))]
fn forward_env(loader: aws_config::ConfigLoader, _env: Option<&Env>) -> aws_config::ConfigLoader {
    loader
}

/// Add a default `https` scheme and reduce the endpoint to its origin.
///
/// Endpoints with a path, query, fragment or user info are rejected, as are schemes other
/// than `http` and `https`.
fn normalize_endpoint(endpoint: &str) -> Result<String, Error> {
    let endpoint = if endpoint.contains("://") {
        endpoint.to_owned()
    } else {
        format!("https://{endpoint}")
    };

    let malformed = |reason: &str| {
        error::client_construction(format!("malformed endpoint url '{endpoint}': {reason}"))
    };
    let url = Url::parse(&endpoint).map_err(|err| malformed(&err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(malformed("missing host"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(malformed("an endpoint cannot carry a path, query or fragment"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(malformed("an endpoint cannot carry credentials"));
    }

    Ok(url.origin().ascii_serialization())
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of transfer errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues (missing bucket, source path does not exist, etc)
    InputInvalid,

    /// I/O errors
    IOError,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,

    /// Resource not found (e.g. bucket or key)
    NotFound,

    /// The credentials in use are not allowed to perform the request
    AccessDenied,

    /// A batch manifest could not be parsed or is missing required fields
    ManifestInvalid,

    /// The S3 client could not be constructed from the resolved configuration
    ClientConstruction,

    /// A request made on behalf of a single object transfer failed
    TransferFailed,
}

impl Error {
    /// Creates a new transfer [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::AccessDenied => write!(f, "access denied"),
            ErrorKind::ManifestInvalid => write!(f, "invalid batch manifest"),
            ErrorKind::ClientConstruction => write!(f, "failed to construct S3 client"),
            ErrorKind::TransferFailed => write!(f, "transfer failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(value: std::sync::PoisonError<T>) -> Self {
        Self::new(ErrorKind::RuntimeError, value.to_string())
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for Error {
    fn from(value: aws_smithy_types::error::operation::BuildError) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl From<aws_smithy_types::byte_stream::error::Error> for Error {
    fn from(value: aws_smithy_types::byte_stream::error::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::ManifestInvalid, value)
    }
}

impl From<walkdir::Error> for Error {
    fn from(value: walkdir::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl<E> From<aws_sdk_s3::error::SdkError<E, HttpResponse>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, HttpResponse>) -> Self {
        let status = value.raw_response().map(|resp| resp.status().as_u16());
        let kind = match (value.code(), status) {
            (Some("NotFound" | "NoSuchKey" | "NoSuchBucket"), _) | (_, Some(404)) => {
                ErrorKind::NotFound
            }
            (Some("AccessDenied" | "Forbidden"), _) | (_, Some(403)) => ErrorKind::AccessDenied,
            _ => ErrorKind::TransferFailed,
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn invalid_manifest<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ManifestInvalid, err)
}

pub(crate) fn client_construction<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ClientConstruction, err)
}

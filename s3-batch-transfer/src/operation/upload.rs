/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::Path;

use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_smithy_types::byte_stream::Length;
use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::error::{self, Error, ErrorKind};
use crate::profile::TransferProfile;
use crate::progress::ProgressReporter;

/// Upload of one local file to one object key
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectUpload<'a> {
    pub(crate) client: &'a aws_sdk_s3::Client,
    pub(crate) bucket: &'a str,
    pub(crate) key: &'a str,
    pub(crate) source: &'a Path,
    pub(crate) size_bytes: u64,
}

impl ObjectUpload<'_> {
    /// Check whether the destination object already exists.
    ///
    /// Only a not found response means "absent"; any other error (e.g. access denied) is
    /// returned to the caller.
    pub(crate) async fn exists(&self) -> Result<bool, Error> {
        let resp = self
            .client
            .head_object()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await;

        match resp {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.as_service_error(), Some(HeadObjectError::NotFound(_))) => {
                Ok(false)
            }
            Err(err) => {
                let err = Error::from(err);
                match err.kind() {
                    ErrorKind::NotFound => Ok(false),
                    _ => Err(err),
                }
            }
        }
    }

    /// Upload the file, returning the number of bytes sent.
    ///
    /// `profile` is `None` for empty files, which are written with a single empty `PutObject`.
    pub(crate) async fn send(
        &self,
        profile: Option<TransferProfile>,
        progress: &mut ProgressReporter,
    ) -> Result<u64, Error> {
        match profile {
            None => {
                self.put_object(ByteStream::from_static(b""), 0).await?;
                Ok(0)
            }
            Some(profile) if profile.is_multipart(self.size_bytes) => {
                self.multipart_upload(profile, progress).await
            }
            Some(_) => {
                let body = ByteStream::from_path(self.source).await?;
                self.put_object(body, self.size_bytes).await?;
                progress.on_bytes(self.size_bytes);
                Ok(self.size_bytes)
            }
        }
    }

    async fn put_object(&self, body: ByteStream, content_length: u64) -> Result<(), Error> {
        self.client
            .put_object()
            .bucket(self.bucket)
            .key(self.key)
            .content_length(to_i64(content_length)?)
            .body(body)
            .send()
            .await?;
        tracing::trace!("put object {} ({content_length} bytes)", self.key);
        Ok(())
    }

    async fn multipart_upload(
        &self,
        profile: TransferProfile,
        progress: &mut ProgressReporter,
    ) -> Result<u64, Error> {
        let mpu = self
            .client
            .create_multipart_upload()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await?;
        let upload_id = mpu
            .upload_id()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::TransferFailed,
                    "CreateMultipartUpload response did not include an upload id",
                )
            })?
            .to_owned();
        tracing::trace!(
            "multipart upload of {} started with upload id {upload_id}",
            self.key
        );

        match self.upload_parts(profile, &upload_id, progress).await {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(self.bucket)
                    .key(self.key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await?;
                Ok(self.size_bytes)
            }
            Err(err) => {
                self.abort(&upload_id).await;
                Err(err)
            }
        }
    }

    async fn upload_parts(
        &self,
        profile: TransferProfile,
        upload_id: &str,
        progress: &mut ProgressReporter,
    ) -> Result<Vec<CompletedPart>, Error> {
        let ranges = profile.part_ranges(self.size_bytes);
        let mut parts = Vec::with_capacity(ranges.len());

        let mut in_flight = stream::iter(ranges.into_iter().enumerate())
            .map(|(idx, (offset, length))| self.upload_part(upload_id, idx, offset, length))
            .buffer_unordered(profile.part_concurrency());

        while let Some((part, length)) = in_flight.try_next().await? {
            progress.on_bytes(length);
            parts.push(part);
        }

        parts.sort_by_key(|p| p.part_number());
        Ok(parts)
    }

    async fn upload_part(
        &self,
        upload_id: &str,
        idx: usize,
        offset: u64,
        length: u64,
    ) -> Result<(CompletedPart, u64), Error> {
        let part_number = i32::try_from(idx + 1)
            .map_err(|_| error::invalid_input(format!("too many parts for {}", self.key)))?;
        let body = ByteStream::read_from()
            .path(self.source)
            .offset(offset)
            .length(Length::Exact(length))
            .build()
            .await?;

        let resp = self
            .client
            .upload_part()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(to_i64(length)?)
            .body(body)
            .send()
            .await?;

        tracing::trace!("completed upload of part number {part_number}");
        let part = CompletedPart::builder()
            .part_number(part_number)
            .set_e_tag(resp.e_tag)
            .build();
        Ok((part, length))
    }

    async fn abort(&self, upload_id: &str) {
        let resp = self
            .client
            .abort_multipart_upload()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(upload_id)
            .send()
            .await;
        if let Err(err) = resp {
            tracing::warn!(
                "failed to abort multipart upload {upload_id} of {}: {}",
                self.key,
                aws_smithy_types::error::display::DisplayErrorContext(err)
            );
        }
    }
}

fn to_i64(n: u64) -> Result<i64, Error> {
    i64::try_from(n).map_err(|_| error::invalid_input(format!("content length {n} is invalid")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadOutput;
    use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
    use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
    use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::operation::upload_part::{UploadPartError, UploadPartOutput};
    use aws_sdk_s3::types::error::NotFound;
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};

    use super::*;
    use crate::metrics::unit::ByteUnit;
    use crate::progress::NoopSink;
    use crate::MEBIBYTE;

    fn reporter(size: u64) -> ProgressReporter {
        ProgressReporter::new(
            Arc::new(NoopSink::default()),
            "test",
            size,
            ByteUnit::Byte,
            None,
        )
    }

    fn write_file(dir: &tempfile::TempDir, size: usize) -> std::path::PathBuf {
        let path = dir.path().join("object.bin");
        std::fs::write(&path, vec![b'x'; size]).unwrap();
        path
    }

    #[tokio::test]
    async fn test_exists_distinguishes_not_found_from_denied() {
        let found = mock!(aws_sdk_s3::Client::head_object)
            .match_requests(|r| r.key() == Some("found"))
            .then_output(|| HeadObjectOutput::builder().content_length(3).build());
        let missing = mock!(aws_sdk_s3::Client::head_object)
            .match_requests(|r| r.key() == Some("missing"))
            .then_error(|| HeadObjectError::NotFound(NotFound::builder().build()));
        let denied = mock!(aws_sdk_s3::Client::head_object)
            .match_requests(|r| r.key() == Some("denied"))
            .then_error(|| {
                HeadObjectError::generic(ErrorMetadata::builder().code("AccessDenied").build())
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&found, &missing, &denied]);

        let upload = |key| ObjectUpload {
            client: &client,
            bucket: "bucket",
            key,
            source: Path::new("unused"),
            size_bytes: 0,
        };

        assert!(upload("found").exists().await.unwrap());
        assert!(!upload("missing").exists().await.unwrap());
        let err = upload("denied").exists().await.unwrap_err();
        assert_eq!(&ErrorKind::AccessDenied, err.kind());
    }

    #[tokio::test]
    async fn test_empty_file_is_single_empty_put() {
        let put = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|r| r.content_length() == Some(0))
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&put]);

        let mut progress = reporter(0);
        let sent = ObjectUpload {
            client: &client,
            bucket: "bucket",
            key: "empty",
            source: Path::new("does-not-need-to-exist"),
            size_bytes: 0,
        }
        .send(None, &mut progress)
        .await
        .unwrap();

        assert_eq!(0, sent);
        assert_eq!(1, put.num_calls());
    }

    #[tokio::test]
    async fn test_below_threshold_is_put_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, 1024);
        let put = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|r| r.content_length() == Some(1024))
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&put]);

        let mut progress = reporter(1024);
        let sent = ObjectUpload {
            client: &client,
            bucket: "bucket",
            key: "small",
            source: &path,
            size_bytes: 1024,
        }
        .send(Some(TransferProfile::SMALL), &mut progress)
        .await
        .unwrap();

        assert_eq!(1024, sent);
        assert!(progress.state().is_complete());
        assert_eq!(1, put.num_calls());
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let dir = tempfile::tempdir().unwrap();
        let size = 10 * MEBIBYTE + 17;
        let path = write_file(&dir, size as usize);

        let create = mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
            CreateMultipartUploadOutput::builder()
                .upload_id("upload-1")
                .build()
        });
        let part = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests(|r| r.upload_id() == Some("upload-1"))
            .then_output(|| UploadPartOutput::builder().e_tag("etag").build());
        let complete = mock!(aws_sdk_s3::Client::complete_multipart_upload)
            .match_requests(|r| {
                let parts = r.multipart_upload().unwrap().parts();
                parts.len() == 3
                    && parts
                        .iter()
                        .enumerate()
                        .all(|(i, p)| p.part_number() == Some(i as i32 + 1))
            })
            .then_output(|| CompleteMultipartUploadOutput::builder().build());
        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&create, &part, &complete]
        );

        let mut progress = reporter(size);
        let sent = ObjectUpload {
            client: &client,
            bucket: "bucket",
            key: "medium",
            source: &path,
            size_bytes: size,
        }
        .send(Some(TransferProfile::MEDIUM), &mut progress)
        .await
        .unwrap();

        assert_eq!(size, sent);
        assert_eq!(size, progress.state().bytes_done());
        assert_eq!(3, part.num_calls());
        assert_eq!(1, complete.num_calls());
    }

    #[tokio::test]
    async fn test_failed_part_aborts_upload() {
        let dir = tempfile::tempdir().unwrap();
        let size = 6 * MEBIBYTE;
        let path = write_file(&dir, size as usize);

        let create = mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
            CreateMultipartUploadOutput::builder()
                .upload_id("upload-2")
                .build()
        });
        let part = mock!(aws_sdk_s3::Client::upload_part).then_error(|| {
            UploadPartError::generic(ErrorMetadata::builder().code("InternalError").build())
        });
        let abort = mock!(aws_sdk_s3::Client::abort_multipart_upload)
            .match_requests(|r| r.upload_id() == Some("upload-2"))
            .then_output(|| AbortMultipartUploadOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&create, &part, &abort]);

        let mut progress = reporter(size);
        let err = ObjectUpload {
            client: &client,
            bucket: "bucket",
            key: "medium",
            source: &path,
            size_bytes: size,
        }
        .send(Some(TransferProfile::MEDIUM), &mut progress)
        .await
        .unwrap_err();

        assert_eq!(&ErrorKind::TransferFailed, err.kind());
        assert_eq!(1, abort.num_calls());
    }
}

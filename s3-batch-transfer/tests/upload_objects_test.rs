/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![cfg(target_family = "unix")]

use std::collections::HashSet;

use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use aws_sdk_s3::operation::upload_part::UploadPartOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::error::NotFound;
use aws_smithy_mocks_experimental::{mock, mock_client, Rule, RuleMode};
use aws_smithy_types::error::ErrorMetadata;
use s3_batch_transfer::metrics::unit::ByteUnit;
use s3_batch_transfer::types::TransferOutcome;
use test_common::{create_socket, create_test_dir, list_files};

const MEBIBYTE: usize = 1024 * 1024;

fn head_not_found() -> Rule {
    mock!(aws_sdk_s3::Client::head_object)
        .then_error(|| HeadObjectError::NotFound(NotFound::builder().build()))
}

fn put_object() -> Rule {
    mock!(aws_sdk_s3::Client::put_object).then_output(|| PutObjectOutput::builder().build())
}

fn multipart_rules() -> [Rule; 3] {
    let create_mpu = mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
        CreateMultipartUploadOutput::builder()
            .upload_id("test-upload-id")
            .build()
    });
    let upload_part = mock!(aws_sdk_s3::Client::upload_part)
        .match_requests(|r| r.upload_id() == Some("test-upload-id"))
        .then_output(|| UploadPartOutput::builder().e_tag("etag").build());
    let complete_mpu = mock!(aws_sdk_s3::Client::complete_multipart_upload)
        .match_requests(|r| r.upload_id() == Some("test-upload-id"))
        .then_output(|| CompleteMultipartUploadOutput::builder().build());
    [create_mpu, upload_part, complete_mpu]
}

fn client(s3: aws_sdk_s3::Client, adaptive: bool) -> s3_batch_transfer::Client {
    let config = s3_batch_transfer::Config::builder()
        .client(s3)
        .adaptive_profiles(adaptive)
        .build()
        .unwrap();
    s3_batch_transfer::Client::new(config)
}

#[tokio::test]
async fn test_empty_large_and_socket_files() {
    let dir = create_test_dir(None, vec![("empty.bin", 0), ("large.bin", 10 * MEBIBYTE)]);
    let (_listener, _socket) = create_socket(dir.path(), "app.sock");

    let head = head_not_found();
    let put = put_object();
    let [create_mpu, upload_part, complete_mpu] = multipart_rules();
    let s3 = mock_client!(
        aws_sdk_s3,
        RuleMode::MatchAny,
        &[&head, &put, &create_mpu, &upload_part, &complete_mpu]
    );
    let client = client(s3, true);

    let output = client
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .key_prefix("snapshots")
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.total_transfers());
    assert_eq!(2, output.objects_uploaded());
    assert!(output.failed_transfers().is_empty());

    let mut uploaded: Vec<_> = output
        .successful_transfers()
        .iter()
        .map(|r| (r.destination().to_owned(), r.bytes_transferred()))
        .collect();
    uploaded.sort();
    assert_eq!(
        vec![
            ("snapshots/empty.bin".to_owned(), 0),
            ("snapshots/large.bin".to_owned(), 10 * MEBIBYTE as u64),
        ],
        uploaded
    );
    assert_eq!(10 * MEBIBYTE as u64, output.total_bytes_transferred());
    assert_eq!(
        "10 MiB",
        ByteUnit::display(output.total_bytes_transferred()).to_string()
    );

    // the empty file is one empty PutObject, the 10 MiB file two 5 MiB parts
    assert_eq!(1, put.num_calls());
    assert_eq!(1, create_mpu.num_calls());
    assert_eq!(2, upload_part.num_calls());
    assert_eq!(1, complete_mpu.num_calls());
}

#[tokio::test]
async fn test_second_run_skips_existing_objects() {
    let dir = create_test_dir(None, vec![("a.txt", 3), ("nested/b.txt", 4)]);
    let head = mock!(aws_sdk_s3::Client::head_object)
        .then_output(|| HeadObjectOutput::builder().content_length(3).build());
    let put = put_object();
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&head, &put]);
    let client = client(s3, false);

    let output = client
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.skipped_transfers().len());
    assert!(output
        .skipped_transfers()
        .iter()
        .all(|r| r.outcome() == TransferOutcome::Skipped && r.bytes_transferred() == 0));
    assert_eq!(0, output.total_bytes_transferred());
    assert_eq!(0, put.num_calls());
}

#[tokio::test]
async fn test_overwrite_skips_existence_check() {
    let dir = create_test_dir(None, vec![("a.txt", 3)]);
    let head = mock!(aws_sdk_s3::Client::head_object)
        .then_output(|| HeadObjectOutput::builder().content_length(3).build());
    let put = put_object();
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&head, &put]);
    let client = client(s3, false);

    let output = client
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .overwrite(true)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(1, output.objects_uploaded());
    assert_eq!(0, head.num_calls());
    assert_eq!(1, put.num_calls());
}

#[tokio::test]
async fn test_forbidden_existence_check_fails_item() {
    let dir = create_test_dir(None, vec![("a.txt", 3), ("b.txt", 3)]);
    let head = mock!(aws_sdk_s3::Client::head_object).then_error(|| {
        HeadObjectError::generic(ErrorMetadata::builder().code("AccessDenied").build())
    });
    let put = put_object();
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&head, &put]);
    let client = client(s3, false);

    let output = client
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.failed_transfers().len());
    for failed in output.failed_transfers() {
        assert_eq!(TransferOutcome::Failed, failed.outcome());
        let error = failed.error().unwrap();
        assert!(error.starts_with("access denied"), "{error}");
    }
    assert!(head.num_calls() >= 2);
    assert_eq!(0, put.num_calls());
}

#[tokio::test]
async fn test_suffixed_keys_and_manifest() {
    let dir = create_test_dir(
        None,
        vec![("a", 1), ("b/a", 2), ("b/b/a", 3), ("c/a", 4)],
    );
    let head = head_not_found();
    let put = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|r| r.key() != Some("data/latest_info.json"))
        .then_output(|| PutObjectOutput::builder().build());
    let put_manifest = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|r| {
            r.key() == Some("data/latest_info.json")
                && r.content_type() == Some("application/json")
        })
        .then_output(|| PutObjectOutput::builder().build());
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&head, &put, &put_manifest]);
    let client = client(s3, false);

    let output = client
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .key_prefix("data")
        .append_suffix("_prod")
        .manifest_key("data/latest_info.json")
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    let keys: HashSet<_> = output
        .successful_transfers()
        .iter()
        .map(|r| r.destination())
        .collect();
    assert_eq!(
        HashSet::from(["data_prod/a", "data_prod/b/a", "data_prod/b/b/a", "data_prod/c/a"]),
        keys
    );
    assert_eq!(4, put.num_calls());
    assert_eq!(1, put_manifest.num_calls());

    let manifest = output.manifest().unwrap();
    assert_eq!("_prod", manifest.append_suffix);
    assert_eq!(Some("data"), manifest.key_base.as_deref());
    assert_eq!(10, manifest.total_uploaded_size);
    let recorded: Vec<_> = manifest.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(
        vec!["data_prod/a", "data_prod/b/a", "data_prod/b/b/a", "data_prod/c/a"],
        recorded
    );
}

#[tokio::test]
async fn test_prefixed_upload_restores_from_manifest() {
    let dir = create_test_dir(None, vec![("a.bin", 1), ("x/b.bin", 2)]);
    let head = head_not_found();
    let put = put_object();
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&head, &put]);

    let uploaded = client(s3, false)
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .key_prefix("backups")
        .manifest_key("backups/latest_info.json")
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();
    let manifest = uploaded.manifest().unwrap().clone();
    let recorded: Vec<_> = manifest.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(vec!["backups/a.bin", "backups/x/b.bin"], recorded);

    let json = manifest.to_json().unwrap();
    let json_len = json.len() as i64;
    let head_manifest = mock!(aws_sdk_s3::Client::head_object)
        .match_requests(|r| r.key() == Some("backups/latest_info.json"))
        .then_output(move || HeadObjectOutput::builder().content_length(json_len).build());
    let get_manifest = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.key() == Some("backups/latest_info.json"))
        .then_output(move || {
            GetObjectOutput::builder()
                .body(ByteStream::from(json.clone()))
                .build()
        });
    let get_a = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.key() == Some("backups/a.bin"))
        .then_output(|| GetObjectOutput::builder().body(ByteStream::from_static(b"a")).build());
    let get_b = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.key() == Some("backups/x/b.bin"))
        .then_output(|| GetObjectOutput::builder().body(ByteStream::from_static(b"bb")).build());
    let s3 = mock_client!(
        aws_sdk_s3,
        RuleMode::MatchAny,
        &[&head_manifest, &get_manifest, &get_a, &get_b]
    );
    let dest = tempfile::tempdir().unwrap();

    let restored = client(s3, false)
        .download_from_manifest()
        .bucket("test-bucket")
        .manifest_key("backups/latest_info.json")
        .destination(dest.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, restored.objects_downloaded());
    let directory = manifest.directory.trim_start_matches('/');
    assert_eq!(
        vec![
            (format!("{directory}/a.bin"), 1),
            (format!("{directory}/x/b.bin"), 2)
        ],
        list_files(dest.path())
    );
}

#[tokio::test]
async fn test_dry_run_transfers_nothing() {
    let dir = create_test_dir(None, vec![("a.txt", 3), ("b.txt", 5)]);
    let head = head_not_found();
    let put = put_object();
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&head, &put]);
    let client = client(s3, false);

    let output = client
        .upload_objects()
        .bucket("test-bucket")
        .source(dir.path())
        .manifest_key("latest_info.json")
        .dry_run(true)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.skipped_transfers().len());
    assert!(output.manifest().is_none());
    assert_eq!(0, head.num_calls());
    assert_eq!(0, put.num_calls());
}

#[tokio::test]
async fn test_missing_source_fails_before_batch() {
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&put_object()]);
    let client = client(s3, false);

    let err = client
        .upload_objects()
        .bucket("test-bucket")
        .source("/definitely/not/here")
        .send()
        .await
        .unwrap_err();
    assert_eq!(
        &s3_batch_transfer::error::ErrorKind::InputInvalid,
        err.kind()
    );
}

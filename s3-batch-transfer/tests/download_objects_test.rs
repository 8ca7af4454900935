/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![cfg(target_family = "unix")]

use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::Object;
use aws_smithy_mocks_experimental::{mock, mock_client, Rule, RuleMode};
use s3_batch_transfer::types::{LocalPathPolicy, TransferOutcome};
use test_common::list_files;

/// Objects stored under `backups/2024`, the body of each is its key
const KEYS: &[&str] = &[
    "backups/2024/",
    "backups/2024/01/db.tar.gz",
    "backups/2024/02/db.tar.gz",
    "backups/2024/03/notes.txt",
];

fn list_rule() -> Rule {
    mock!(aws_sdk_s3::Client::list_objects_v2)
        .match_requests(|r| r.prefix() == Some("backups/2024"))
        .then_output(|| {
            let mut output = ListObjectsV2Output::builder();
            for key in KEYS {
                output = output.contents(Object::builder().key(*key).size(key.len() as i64).build());
            }
            output.build()
        })
}

fn get_rules() -> Vec<Rule> {
    KEYS.iter()
        .map(|key| {
            mock!(aws_sdk_s3::Client::get_object)
                .match_requests(move |r| r.key() == Some(*key))
                .then_output(move || {
                    GetObjectOutput::builder()
                        .body(ByteStream::from_static(key.as_bytes()))
                        .build()
                })
        })
        .collect()
}

fn client(rules: &[&Rule]) -> s3_batch_transfer::Client {
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, rules);
    let config = s3_batch_transfer::Config::builder()
        .client(s3)
        .build()
        .unwrap();
    s3_batch_transfer::Client::new(config)
}

fn get_calls(rules: &[Rule]) -> usize {
    rules.iter().map(Rule::num_calls).sum()
}

#[tokio::test]
async fn test_keep_path_download() {
    let dest = tempfile::tempdir().unwrap();
    let list = list_rule();
    let gets = get_rules();
    let mut rules = vec![&list];
    rules.extend(gets.iter());
    let client = client(&rules);

    let output = client
        .download_objects()
        .bucket("test-bucket")
        .key_prefix("backups/2024")
        .destination(dest.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(3, output.objects_downloaded());
    assert!(output.failed_transfers().is_empty());
    assert_eq!(
        vec![
            ("01/db.tar.gz".to_owned(), 25),
            ("02/db.tar.gz".to_owned(), 25),
            ("03/notes.txt".to_owned(), 25),
        ],
        list_files(dest.path())
    );
    assert_eq!(75, output.total_bytes_transferred());
    let content = std::fs::read_to_string(dest.path().join("03/notes.txt")).unwrap();
    assert_eq!("backups/2024/03/notes.txt", content);
}

#[tokio::test]
async fn test_flattened_download_with_prefix() {
    let dest = tempfile::tempdir().unwrap();
    let list = list_rule();
    let gets = get_rules();
    let mut rules = vec![&list];
    rules.extend(gets.iter());
    let client = client(&rules);

    let output = client
        .download_objects()
        .bucket("test-bucket")
        .key_prefix("backups/2024")
        .destination(dest.path())
        .path_policy(LocalPathPolicy::Flatten)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    // both db.tar.gz objects map to the same file, the first listed wins
    assert_eq!(3, output.total_transfers());
    assert_eq!(2, output.objects_downloaded());
    let skipped: Vec<_> = output
        .skipped_transfers()
        .iter()
        .map(|r| r.item().source())
        .collect();
    assert_eq!(vec!["backups/2024/02/db.tar.gz"], skipped);
    assert_eq!(0, gets[2].num_calls());
    assert_eq!(
        "backups/2024/01/db.tar.gz",
        std::fs::read_to_string(dest.path().join("db.tar.gz")).unwrap()
    );

    let files: Vec<_> = list_files(dest.path()).into_iter().map(|(p, _)| p).collect();
    assert_eq!(vec!["db.tar.gz", "notes.txt"], files);
    assert!(output
        .successful_transfers()
        .iter()
        .chain(output.skipped_transfers())
        .all(|r| !r.destination().contains("backups")));
}

#[tokio::test]
async fn test_second_run_skips_existing_files() {
    let dest = tempfile::tempdir().unwrap();
    let list = list_rule();
    let gets = get_rules();
    let mut rules = vec![&list];
    rules.extend(gets.iter());
    let client = client(&rules);

    for _ in 0..2 {
        client
            .download_objects()
            .bucket("test-bucket")
            .key_prefix("backups/2024")
            .destination(dest.path())
            .send()
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
    }
    assert_eq!(3, get_calls(&gets));

    let output = client
        .download_objects()
        .bucket("test-bucket")
        .key_prefix("backups/2024")
        .destination(dest.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(3, output.skipped_transfers().len());
    assert!(output
        .skipped_transfers()
        .iter()
        .all(|r| r.outcome() == TransferOutcome::Skipped));
    assert_eq!(3, get_calls(&gets));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dest = tempfile::tempdir().unwrap();
    let list = list_rule();
    let gets = get_rules();
    let mut rules = vec![&list];
    rules.extend(gets.iter());
    let client = client(&rules);

    let output = client
        .download_objects()
        .bucket("test-bucket")
        .key_prefix("backups/2024")
        .destination(dest.path())
        .dry_run(true)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(3, output.skipped_transfers().len());
    assert_eq!(0, get_calls(&gets));
    assert!(list_files(dest.path()).is_empty());
}

#[tokio::test]
async fn test_key_escaping_destination_fails_item() {
    let dest = tempfile::tempdir().unwrap();
    let list = mock!(aws_sdk_s3::Client::list_objects_v2).then_output(|| {
        ListObjectsV2Output::builder()
            .contents(Object::builder().key("../outside.txt").size(1).build())
            .contents(Object::builder().key("inside.txt").size(1).build())
            .build()
    });
    let get = mock!(aws_sdk_s3::Client::get_object).then_output(|| {
        GetObjectOutput::builder()
            .body(ByteStream::from_static(b"x"))
            .build()
    });
    let client = client(&[&list, &get]);

    let output = client
        .download_objects()
        .bucket("test-bucket")
        .destination(dest.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(1, output.objects_downloaded());
    assert_eq!(1, output.failed_transfers().len());
    assert_eq!("../outside.txt", output.failed_transfers()[0].item().source());
    assert_eq!(1, get.num_calls());
}

#[tokio::test]
async fn test_download_from_manifest() {
    let manifest = r#"{
        "upload_date": "2024-05-01T12:00:00",
        "files": [
            {"file_name": "data_prod/a.bin", "size": 1, "upload_time": "2024-05-01T12:00:00"},
            {"file_name": "data_prod/x/b.bin", "size": 2, "upload_time": "2024-05-01T12:00:00"}
        ],
        "directory": "data",
        "append_suffix": "_prod",
        "total_uploaded_size": 3
    }"#;

    let head = mock!(aws_sdk_s3::Client::head_object)
        .match_requests(|r| r.key() == Some("data/latest_info.json"))
        .then_output(move || {
            HeadObjectOutput::builder()
                .content_length(manifest.len() as i64)
                .build()
        });
    let get_manifest = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.key() == Some("data/latest_info.json"))
        .then_output(move || {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(manifest.as_bytes()))
                .build()
        });
    let get_a = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.key() == Some("data_prod/a.bin"))
        .then_output(|| {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(b"a"))
                .build()
        });
    let get_b = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.key() == Some("data_prod/x/b.bin"))
        .then_output(|| {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(b"bb"))
                .build()
        });
    let client = client(&[&head, &get_manifest, &get_a, &get_b]);
    let dest = tempfile::tempdir().unwrap();

    let output = client
        .download_from_manifest()
        .bucket("test-bucket")
        .manifest_key("data/latest_info.json")
        .destination(dest.path())
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.objects_downloaded());
    assert_eq!(3, output.total_bytes_transferred());
    assert_eq!(
        vec![("data/a.bin".to_owned(), 1), ("data/x/b.bin".to_owned(), 2)],
        list_files(dest.path())
    );
}

#[tokio::test]
async fn test_single_object_download() {
    let head = mock!(aws_sdk_s3::Client::head_object)
        .then_output(|| HeadObjectOutput::builder().content_length(5).build());
    let get = mock!(aws_sdk_s3::Client::get_object).then_output(|| {
        GetObjectOutput::builder()
            .body(ByteStream::from_static(b"hello"))
            .build()
    });
    let client = client(&[&head, &get]);
    let dest = tempfile::tempdir().unwrap();

    let result = client
        .download()
        .bucket("test-bucket")
        .key("greetings/hello.txt")
        .destination(dest.path())
        .send()
        .await
        .unwrap();

    assert_eq!(TransferOutcome::Success, result.outcome());
    assert_eq!(5, result.bytes_transferred());
    assert_eq!(
        "hello",
        std::fs::read_to_string(dest.path().join("hello.txt")).unwrap()
    );
}

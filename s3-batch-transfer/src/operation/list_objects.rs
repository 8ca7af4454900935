/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

mod input;
pub use input::{ListObjectsInput, ListObjectsInputBuilder};

pub(crate) mod paginator;

use std::sync::Arc;

use crate::catalog::ObjectTree;
use crate::client::Handle;
use crate::error::Error;
use crate::operation::DEFAULT_DELIMITER;
use paginator::ListObjectsPaginator;

/// Operation struct for listing the objects under a prefix
#[derive(Clone, Default, Debug)]
pub(crate) struct ListObjects;

impl ListObjects {
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        input: ListObjectsInput,
    ) -> Result<ObjectTree, Error> {
        let mut paginator = ListObjectsPaginator::new(
            handle.config.client().clone(),
            input.bucket(),
            Some(input.prefix().to_owned()),
            Some(DEFAULT_DELIMITER.to_owned()),
            input.recursive(),
        );

        let mut tree = ObjectTree::new(input.bucket(), input.prefix());
        let mut pages = 0;
        while let Some(page) = paginator.next_page().await {
            let page = page?;
            pages += 1;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    let size = u64::try_from(object.size().unwrap_or_default()).unwrap_or_default();
                    tree.insert_object(key, size);
                }
            }
            for prefix in page.common_prefixes() {
                if let Some(prefix) = prefix.prefix() {
                    tree.insert_folder(prefix);
                }
            }
        }

        tracing::debug!(
            "listed {} objects under s3://{}/{} in {pages} pages",
            tree.object_count(),
            input.bucket(),
            input.prefix()
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::types::{CommonPrefix, Object};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};

    use crate::error::ErrorKind;

    fn client(rules: &[&aws_smithy_mocks_experimental::Rule]) -> crate::Client {
        let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, rules);
        let config = crate::Config::builder().client(s3).build().unwrap();
        crate::Client::new(config)
    }

    fn page(prefix: &str, keys: &[(&str, i64)], folders: &[&str]) -> ListObjectsV2Output {
        let mut output = ListObjectsV2Output::builder().prefix(prefix);
        for (key, size) in keys {
            output = output.contents(Object::builder().key(*key).size(*size).build());
        }
        for folder in folders {
            output = output.common_prefixes(CommonPrefix::builder().prefix(*folder).build());
        }
        output.build()
    }

    #[tokio::test]
    async fn test_recursive_listing_descends() {
        let top = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.prefix() == Some("logs/") && r.delimiter() == Some("/"))
            .then_output(|| page("logs/", &[("logs/a.log", 2048)], &["logs/2024/"]));
        let nested = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.prefix() == Some("logs/2024/"))
            .then_output(|| page("logs/2024/", &[("logs/2024/b.log", 1024)], &[]));
        let client = client(&[&top, &nested]);

        let tree = client
            .list_objects()
            .bucket("bucket")
            .prefix("logs/")
            .send()
            .await
            .unwrap();

        assert_eq!(2, tree.object_count());
        assert_eq!(3072, tree.total_bytes());
        assert_eq!(1, nested.num_calls());
        assert_eq!(
            "s3://bucket/logs/\n├── 2024/\n│   └── b.log (1 KiB)\n└── a.log (2 KiB)\n2 objects, 3 KiB",
            tree.to_string()
        );
    }

    #[tokio::test]
    async fn test_flat_listing_reports_folders() {
        let top = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.prefix() == Some("logs/"))
            .then_output(|| page("logs/", &[("logs/a.log", 10)], &["logs/2024/"]));
        let nested = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.prefix() == Some("logs/2024/"))
            .then_output(|| page("logs/2024/", &[("logs/2024/b.log", 1)], &[]));
        let client = client(&[&top, &nested]);

        let tree = client
            .list_objects()
            .bucket("bucket")
            .prefix("logs/")
            .recursive(false)
            .send()
            .await
            .unwrap();

        assert_eq!(0, nested.num_calls());
        assert_eq!(1, tree.object_count());
        assert_eq!(
            "s3://bucket/logs/\n├── 2024/\n└── a.log (10 B)\n1 objects, 10 B",
            tree.to_string()
        );
    }

    #[tokio::test]
    async fn test_listing_requires_bucket() {
        let client = client(&[]);
        let err = client.list_objects().send().await.unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }
}

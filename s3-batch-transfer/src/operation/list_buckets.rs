/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

use std::sync::Arc;

use aws_sdk_s3::config::Region;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};

use crate::catalog::{BucketCatalog, BucketSummary};
use crate::client::Handle;
use crate::error::Error;
use crate::operation::list_objects::paginator::ListObjectsPaginator;

/// Region reported as an empty location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// Operation struct for listing buckets
#[derive(Clone, Default, Debug)]
pub(crate) struct ListBuckets;

impl ListBuckets {
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        with_size: bool,
    ) -> Result<BucketCatalog, Error> {
        let output = handle.config.client().list_buckets().send().await?;
        let buckets: Vec<BucketSummary> = output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                let name = bucket.name()?;
                let created = bucket
                    .creation_date()
                    .and_then(|d| DateTime::<Utc>::from_timestamp(d.secs(), d.subsec_nanos()));
                Some(BucketSummary::new(name, created))
            })
            .collect();
        tracing::debug!("found {} buckets", buckets.len());

        if !with_size {
            return Ok(BucketCatalog { buckets });
        }

        let buckets = stream::iter(buckets)
            .map(|bucket| size_bucket(&handle, bucket))
            .buffered(handle.num_workers())
            .collect()
            .await;
        Ok(BucketCatalog { buckets })
    }
}

/// Resolve the region and size of a bucket. Failures are logged and leave the size unknown.
async fn size_bucket(handle: &Handle, mut bucket: BucketSummary) -> BucketSummary {
    let base = handle.config.client();
    // providers with a fixed region serve every bucket from the base client
    let (region, client) = match handle.config.provider().forced_region() {
        Some(region) => (region.to_owned(), base.clone()),
        None => match bucket_region(base, &bucket.name).await {
            Ok(region) => {
                let client = regional_client(base, &region);
                (region, client)
            }
            Err(err) => {
                tracing::warn!(
                    "unable to resolve region of {}: {}",
                    bucket.name,
                    aws_smithy_types::error::display::DisplayErrorContext(&err)
                );
                return bucket;
            }
        },
    };

    bucket.region = Some(region);
    match bucket_size(handle, client, &bucket.name).await {
        Ok((objects, bytes)) => {
            bucket.object_count = Some(objects);
            bucket.size_bytes = Some(bytes);
        }
        Err(err) => tracing::warn!(
            "unable to size {}: {}",
            bucket.name,
            aws_smithy_types::error::display::DisplayErrorContext(&err)
        ),
    }
    bucket
}

async fn bucket_region(client: &aws_sdk_s3::Client, bucket: &str) -> Result<String, Error> {
    let output = client.get_bucket_location().bucket(bucket).send().await?;
    Ok(normalize_region(
        output.location_constraint().map(|c| c.as_str()),
    ))
}

/// Map a location constraint to a region name
fn normalize_region(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => DEFAULT_REGION.to_owned(),
        // legacy constraint for Ireland
        Some("EU") => "eu-west-1".to_owned(),
        Some(region) => region.to_owned(),
    }
}

/// A client for `region`, or the base client if it is already configured for it
fn regional_client(base: &aws_sdk_s3::Client, region: &str) -> aws_sdk_s3::Client {
    if base.config().region().map(|r| r.to_string()).as_deref() == Some(region) {
        return base.clone();
    }
    tracing::debug!("using a client for region {region}");
    let config = base
        .config()
        .to_builder()
        .region(Region::new(region.to_owned()))
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

/// Count the objects of a bucket and sum their sizes
async fn bucket_size(
    handle: &Handle,
    client: aws_sdk_s3::Client,
    bucket: &str,
) -> Result<(u64, u64), Error> {
    let mut paginator = ListObjectsPaginator::new(client, bucket, None, None, false);
    let first = match paginator.next_page().await {
        Some(page) => page?,
        None => return Ok((0, 0)),
    };
    if first.contents().is_empty() && !first.is_truncated().unwrap_or(false) {
        return Ok((0, 0));
    }

    // the bar's total grows page by page as sizes are discovered
    let sink = handle.config.progress_sink();
    let mut item = None;
    let mut objects = 0;
    let mut bytes = 0;
    let mut page = Some(Ok(first));
    while let Some(result) = page {
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                if let Some(item) = item {
                    sink.complete(item);
                }
                return Err(err);
            }
        };
        let sizes: Vec<u64> = output
            .contents()
            .iter()
            .map(|object| u64::try_from(object.size().unwrap_or_default()).unwrap_or_default())
            .collect();
        let page_bytes = sizes.iter().sum();
        let id = match item {
            Some(id) => {
                sink.grow(id, page_bytes);
                id
            }
            None => *item.insert(sink.add_item(&format!("Sizing {bucket}"), page_bytes)),
        };
        for size in sizes {
            objects += 1;
            bytes += size;
            sink.advance(id, size);
        }
        sink.set_message(id, &format!("{objects} objects"));
        page = paginator.next_page().await;
    }
    if let Some(item) = item {
        sink.complete(item);
    }

    Ok((objects, bytes))
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::operation::get_bucket_location::GetBucketLocationOutput;
    use aws_sdk_s3::operation::list_buckets::ListBucketsOutput;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::types::{Bucket, Object};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};

    use std::sync::Arc;

    use super::normalize_region;
    use crate::progress::tests::{Event, RecordingSink};

    #[test]
    fn test_normalize_region() {
        assert_eq!("us-east-1", normalize_region(None));
        assert_eq!("us-east-1", normalize_region(Some("")));
        assert_eq!("eu-west-1", normalize_region(Some("EU")));
        assert_eq!("ap-south-1", normalize_region(Some("ap-south-1")));
    }

    fn buckets() -> ListBucketsOutput {
        ListBucketsOutput::builder()
            .buckets(
                Bucket::builder()
                    .name("archive")
                    .creation_date(aws_smithy_types::DateTime::from_secs(1_700_000_000))
                    .build(),
            )
            .buckets(Bucket::builder().name("empty").build())
            .build()
    }

    #[tokio::test]
    async fn test_list_without_sizes() {
        let list_buckets = mock!(aws_sdk_s3::Client::list_buckets).then_output(buckets);
        let list_objects = mock!(aws_sdk_s3::Client::list_objects_v2)
            .then_output(|| ListObjectsV2Output::builder().build());
        let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&list_buckets, &list_objects]);
        let client = crate::Client::new(crate::Config::builder().client(s3).build().unwrap());

        let catalog = client.list_buckets().send().await.unwrap();
        let names: Vec<_> = catalog.buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(vec!["archive", "empty"], names);
        assert_eq!(
            "2023-11-14 22:13:20",
            catalog.buckets[0]
                .creation_date
                .unwrap()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        );
        assert!(catalog.buckets.iter().all(|b| b.size_bytes.is_none()));
        assert_eq!(0, list_objects.num_calls());
    }

    #[tokio::test]
    async fn test_list_with_sizes() {
        let list_buckets = mock!(aws_sdk_s3::Client::list_buckets).then_output(buckets);
        let location = mock!(aws_sdk_s3::Client::get_bucket_location)
            .then_output(|| GetBucketLocationOutput::builder().build());
        let archive_first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.bucket() == Some("archive") && r.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("a").size(1024).build())
                    .contents(Object::builder().key("b").size(1024).build())
                    .is_truncated(true)
                    .next_continuation_token("more")
                    .build()
            });
        let archive_second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.bucket() == Some("archive") && r.continuation_token() == Some("more"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("c").size(7).build())
                    .build()
            });
        let empty = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.bucket() == Some("empty"))
            .then_output(|| ListObjectsV2Output::builder().key_count(0).build());
        let s3 = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&list_buckets, &location, &archive_first, &archive_second, &empty]
        );
        let sink = Arc::new(RecordingSink::default());
        let config = crate::Config::builder()
            .client(s3)
            .progress_sink(sink.clone())
            .build()
            .unwrap();
        let client = crate::Client::new(config);

        let catalog = client.list_buckets().with_size(true).send().await.unwrap();

        let archive = &catalog.buckets[0];
        assert_eq!(Some("us-east-1"), archive.region.as_deref());
        assert_eq!(Some(3), archive.object_count);
        assert_eq!(Some(2055), archive.size_bytes);

        let empty_bucket = &catalog.buckets[1];
        assert_eq!(Some(0), empty_bucket.size_bytes);
        assert_eq!(Some(0), empty_bucket.object_count);
        assert_eq!(1, empty.num_calls());
        assert_eq!(2055, catalog.total_bytes());

        // one sizing item for the non empty bucket, its total follows the listed pages
        let events = sink.events();
        let added: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Add(id, label, total) => Some((*id, label.as_str(), *total)),
                _ => None,
            })
            .collect();
        assert_eq!(1, added.len());
        let (id, label, total) = added[0];
        assert_eq!(("Sizing archive", 2048), (label, total));
        assert!(events.contains(&Event::Grow(id, 7)));
        let advanced: u64 = events
            .iter()
            .filter_map(|e| match e {
                Event::Advance(i, n) if *i == id => Some(*n),
                _ => None,
            })
            .sum();
        assert_eq!(2055, advanced);
        assert!(events.contains(&Event::Complete(id)));
    }
}

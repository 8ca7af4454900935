/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::VecDeque;

use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;

use crate::error::Error;

/// Paginator for `ListObjectsV2` that can recurse over `CommonPrefixes` when a delimiter is
/// set.
///
/// With `descend` every common prefix of a page is queued and listed after the current
/// prefix is exhausted. Without it common prefixes are only reported in the pages.
#[derive(Debug)]
pub(crate) struct ListObjectsPaginator {
    client: aws_sdk_s3::Client,
    bucket: String,
    delimiter: Option<String>,
    descend: bool,
    state: Option<State>,
}

#[derive(Debug, PartialEq)]
enum State {
    Paginating {
        next_token: Option<String>,
        prefix: Option<String>,
        common_prefixes: VecDeque<String>,
    },
    Done,
}

impl State {
    fn next_state(self, output: &ListObjectsV2Output, descend: bool) -> State {
        let is_truncated =
            output.is_truncated().unwrap_or(false) && output.next_continuation_token().is_some();
        let mut found_prefixes: VecDeque<String> = if descend {
            output
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_owned))
                .collect()
        } else {
            VecDeque::new()
        };

        match self {
            // more results with this prefix
            State::Paginating {
                prefix,
                mut common_prefixes,
                ..
            } if is_truncated => {
                common_prefixes.append(&mut found_prefixes);
                State::Paginating {
                    next_token: output.next_continuation_token().map(str::to_owned),
                    prefix,
                    common_prefixes,
                }
            }

            // move on to the next queued prefix, if any
            State::Paginating {
                mut common_prefixes,
                ..
            } => {
                common_prefixes.append(&mut found_prefixes);
                match common_prefixes.pop_front() {
                    Some(prefix) => State::Paginating {
                        next_token: None,
                        prefix: Some(prefix),
                        common_prefixes,
                    },
                    None => State::Done,
                }
            }
            State::Done => State::Done,
        }
    }
}

impl ListObjectsPaginator {
    pub(crate) fn new(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        prefix: Option<String>,
        delimiter: Option<String>,
        descend: bool,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            delimiter,
            descend,
            state: Some(State::Paginating {
                next_token: None,
                prefix: prefix.filter(|p| !p.is_empty()),
                common_prefixes: VecDeque::new(),
            }),
        }
    }

    /// Fetch the next page, `None` once every page has been returned
    pub(crate) async fn next_page(&mut self) -> Option<Result<ListObjectsV2Output, Error>> {
        let request = match self.state.as_ref()? {
            State::Done => return None,
            State::Paginating {
                next_token, prefix, ..
            } => self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(prefix.clone())
                .set_continuation_token(next_token.clone())
                .set_delimiter(self.delimiter.clone()),
        };

        match request.send().await {
            Ok(output) => {
                let next_state = self
                    .state
                    .take()
                    .map(|prev| prev.next_state(&output, self.descend));
                self.state = next_state;
                Some(Ok(output))
            }
            Err(err) => {
                // a failed page ends the listing
                self.state = Some(State::Done);
                Some(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::types::{CommonPrefix, Object};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};

    use super::{ListObjectsPaginator, State};

    /*
     *              initial-prefix
     * /   /  |  |     \              \
     * k1 k2 k3 k4   pre1             pre2
     *              / /   \ \          \  \
     *             k5 k6  k7 k8        k9 k10
     *
     *  Should see pages with following keys:
     *   * [k1, k2], [k3, k4]
     *   * [pre1/k5, pre1/k6], [pre1/k7, pre1/k8]
     *   * [pre2/k9, pre2/k10]
     */
    #[test]
    fn test_next_state_descends_into_common_prefixes() {
        let start = State::Paginating {
            next_token: None,
            prefix: Some("initial-prefix".to_string()),
            common_prefixes: VecDeque::new(),
        };

        let output1 = list_resp(
            Some("token1"),
            "initial-prefix",
            Some(vec!["pre1", "pre2"]),
            vec!["k1", "k2"],
        );
        let output2 = list_resp(None, "initial-prefix", None, vec!["k3", "k4"]);
        let output3 = list_resp(Some("token2"), "pre1", None, vec!["pre1/k5", "pre1/k6"]);
        let output4 = list_resp(None, "pre1", None, vec!["pre1/k7", "pre1/k8"]);
        let output5 = list_resp(None, "pre2", None, vec!["pre2/k9", "pre2/k10"]);

        let state2 = start.next_state(&output1, true);
        assert_eq!(
            state2,
            State::Paginating {
                next_token: Some("token1".to_owned()),
                prefix: Some("initial-prefix".to_owned()),
                common_prefixes: VecDeque::from_iter(vec!["pre1".to_owned(), "pre2".to_owned()]),
            }
        );

        let state3 = state2.next_state(&output2, true);
        assert_eq!(
            state3,
            State::Paginating {
                next_token: None,
                prefix: Some("pre1".to_owned()),
                common_prefixes: VecDeque::from_iter(vec!["pre2".to_owned()]),
            }
        );

        let state4 = state3.next_state(&output3, true);
        assert_eq!(
            state4,
            State::Paginating {
                next_token: Some("token2".to_owned()),
                prefix: Some("pre1".to_owned()),
                common_prefixes: VecDeque::from_iter(vec!["pre2".to_owned()]),
            }
        );

        let state5 = state4.next_state(&output4, true);
        assert_eq!(
            state5,
            State::Paginating {
                next_token: None,
                prefix: Some("pre2".to_owned()),
                common_prefixes: VecDeque::new(),
            }
        );

        assert_eq!(State::Done, state5.next_state(&output5, true));
    }

    #[test]
    fn test_next_state_without_descending() {
        let start = State::Paginating {
            next_token: None,
            prefix: Some("logs/".to_string()),
            common_prefixes: VecDeque::new(),
        };
        let page = list_resp(
            Some("token1"),
            "logs/",
            Some(vec!["logs/2023/", "logs/2024/"]),
            vec!["logs/a"],
        );
        let last = list_resp(None, "logs/", Some(vec!["logs/2025/"]), vec!["logs/b"]);

        let next = start.next_state(&page, false);
        assert_eq!(
            next,
            State::Paginating {
                next_token: Some("token1".to_owned()),
                prefix: Some("logs/".to_owned()),
                common_prefixes: VecDeque::new(),
            }
        );
        assert_eq!(State::Done, next.next_state(&last, false));
    }

    #[tokio::test]
    async fn test_pages_follow_continuation_tokens() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.continuation_token().is_none())
            .then_output(|| list_resp(Some("next"), "", None, vec!["a", "b"]));
        let second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.continuation_token() == Some("next"))
            .then_output(|| list_resp(None, "", None, vec!["c"]));
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&first, &second]);

        let mut paginator = ListObjectsPaginator::new(client, "bucket", None, None, true);
        let mut keys = Vec::new();
        while let Some(page) = paginator.next_page().await {
            for object in page.unwrap().contents() {
                keys.push(object.key().unwrap().to_owned());
            }
        }

        assert_eq!(vec!["a", "b", "c"], keys);
        assert!(paginator.next_page().await.is_none());
    }

    fn list_resp(
        next_token: Option<&'static str>,
        prefix: &'static str,
        common_prefixes: Option<Vec<&'static str>>,
        keys: Vec<&'static str>,
    ) -> ListObjectsV2Output {
        let common_prefixes = common_prefixes.map(|p| {
            p.iter()
                .map(|v| CommonPrefix::builder().prefix(*v).build())
                .collect()
        });
        let contents = keys
            .iter()
            .map(|k| Object::builder().key(*k).build())
            .collect();
        ListObjectsV2Output::builder()
            .is_truncated(next_token.is_some())
            .set_next_continuation_token(next_token.map(str::to_owned))
            .prefix(prefix.to_owned())
            .set_common_prefixes(common_prefixes)
            .set_contents(Some(contents))
            .build()
    }
}

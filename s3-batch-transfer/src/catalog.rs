/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

use crate::metrics::unit::ByteUnit;
use crate::operation::DEFAULT_DELIMITER;

/// One bucket of a [`BucketCatalog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    /// Bucket name
    pub name: String,
    /// When the bucket was created, if reported
    pub creation_date: Option<DateTime<Utc>>,
    /// Region the bucket lives in, only resolved when sizes are computed
    pub region: Option<String>,
    /// Sum of all object sizes, only when sizes are computed
    pub size_bytes: Option<u64>,
    /// Number of objects, only when sizes are computed
    pub object_count: Option<u64>,
}

impl BucketSummary {
    /// A bucket without size information
    pub fn new(name: impl Into<String>, creation_date: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            creation_date,
            region: None,
            size_bytes: None,
            object_count: None,
        }
    }
}

/// Buckets visible to the configured credentials, rendered as a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketCatalog {
    /// Buckets in the order `ListBuckets` returned them
    pub buckets: Vec<BucketSummary>,
}

impl BucketCatalog {
    /// Sum of the sizes of every bucket whose size was computed
    pub fn total_bytes(&self) -> u64 {
        self.buckets.iter().filter_map(|b| b.size_bytes).sum()
    }

    fn with_sizes(&self) -> bool {
        self.buckets.iter().any(|b| b.size_bytes.is_some())
    }
}

impl BucketCatalog {
    fn table(&self) -> Table {
        let with_sizes = self.with_sizes();
        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled);

        let mut header = vec!["NAME", "CREATED"];
        if with_sizes {
            header.extend(["REGION", "OBJECTS", "SIZE"]);
        }
        table.set_header(header);

        for bucket in &self.buckets {
            let created = bucket
                .creation_date
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_owned());
            let mut row = vec![Cell::new(&bucket.name), Cell::new(created)];
            if with_sizes {
                row.push(Cell::new(bucket.region.as_deref().unwrap_or("-")));
                row.push(
                    Cell::new(
                        bucket
                            .object_count
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "-".to_owned()),
                    )
                    .set_alignment(CellAlignment::Right),
                );
                row.push(
                    Cell::new(
                        bucket
                            .size_bytes
                            .map(|n| ByteUnit::display(n).to_string())
                            .unwrap_or_else(|| "-".to_owned()),
                    )
                    .set_alignment(CellAlignment::Right),
                );
            }
            table.add_row(row);
        }
        table
    }
}

impl fmt::Display for BucketCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.table().lines() {
            writeln!(f, "{}", line.trim_end())?;
        }

        if self.with_sizes() {
            write!(
                f,
                "{} buckets, {} total",
                self.buckets.len(),
                ByteUnit::display(self.total_bytes())
            )
        } else {
            write!(f, "{} buckets", self.buckets.len())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TreeNode {
    dirs: BTreeMap<String, TreeNode>,
    files: BTreeMap<String, u64>,
}

impl TreeNode {
    fn render(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let count = self.dirs.len() + self.files.len();
        let dirs = self.dirs.iter().map(|(name, node)| (name, Some(node), None));
        let files = self.files.iter().map(|(name, size)| (name, None, Some(*size)));

        for (i, (name, node, size)) in dirs.chain(files).enumerate() {
            let last = i + 1 == count;
            let branch = if last { "└── " } else { "├── " };
            match (node, size) {
                (Some(node), _) => {
                    writeln!(f, "{indent}{branch}{name}/")?;
                    let child_indent = format!("{indent}{}", if last { "    " } else { "│   " });
                    node.render(f, &child_indent)?;
                }
                (None, Some(size)) => {
                    writeln!(f, "{indent}{branch}{name} ({})", ByteUnit::display(size))?
                }
                (None, None) => {}
            }
        }
        Ok(())
    }
}

/// Objects under a prefix arranged as a directory tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTree {
    bucket: String,
    prefix: String,
    root: TreeNode,
    object_count: u64,
    total_bytes: u64,
}

impl ObjectTree {
    /// An empty tree for the objects of `bucket` under `prefix`
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// The bucket listed
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The prefix listed
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of objects in the tree
    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    /// Sum of all object sizes in the tree
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Path segments of `key` below the last `/` of the listed prefix
    fn segments<'a>(&self, key: &'a str) -> Vec<&'a str> {
        let cut = self
            .prefix
            .rfind(DEFAULT_DELIMITER)
            .map(|i| i + DEFAULT_DELIMITER.len())
            .unwrap_or(0);
        let relative = if key.starts_with(&self.prefix[..cut]) {
            &key[cut..]
        } else {
            key
        };
        relative
            .split(DEFAULT_DELIMITER)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Add an object
    pub(crate) fn insert_object(&mut self, key: &str, size: u64) {
        let segments = self.segments(key);
        let Some((name, parents)) = segments.split_last() else {
            return;
        };
        if key.ends_with(DEFAULT_DELIMITER) {
            // folder marker
            self.insert_folder(key);
            return;
        }

        let mut node = &mut self.root;
        for parent in parents {
            node = node.dirs.entry((*parent).to_owned()).or_default();
        }
        node.files.insert((*name).to_owned(), size);
        self.object_count += 1;
        self.total_bytes += size;
    }

    /// Add a folder whose content is not listed
    pub(crate) fn insert_folder(&mut self, prefix: &str) {
        let segments = self.segments(prefix);
        let mut node = &mut self.root;
        for segment in segments {
            node = node.dirs.entry(segment.to_owned()).or_default();
        }
    }
}

impl fmt::Display for ObjectTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "s3://{}/{}", self.bucket, self.prefix)?;
        self.root.render(f, "")?;
        write!(
            f,
            "{} objects, {}",
            self.object_count,
            ByteUnit::display(self.total_bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_rendering() {
        let mut tree = ObjectTree::new("bucket", "backups/");
        tree.insert_object("backups/2024/db.tar.gz", 1536);
        tree.insert_object("backups/2024/03/notes.txt", 10);
        tree.insert_object("backups/readme", 0);
        tree.insert_folder("backups/2025/");

        let expected = "\
s3://bucket/backups/
├── 2024/
│   ├── 03/
│   │   └── notes.txt (10 B)
│   └── db.tar.gz (1.500 KiB)
├── 2025/
└── readme (0 B)
3 objects, 1.510 KiB";
        assert_eq!(expected, tree.to_string());
    }

    #[test]
    fn test_partial_prefix_keeps_last_segment() {
        let mut tree = ObjectTree::new("bucket", "logs/20");
        tree.insert_object("logs/2024/app.log", 1);
        assert_eq!(
            "s3://bucket/logs/20\n└── 2024/\n    └── app.log (1 B)\n1 objects, 1 B",
            tree.to_string()
        );
    }

    #[test]
    fn test_empty_tree() {
        let tree = ObjectTree::new("bucket", "");
        assert_eq!("s3://bucket/\n0 objects, 0 B", tree.to_string());
    }

    #[test]
    fn test_bucket_table() {
        let mut sized = BucketSummary::new("archive", None);
        sized.region = Some("eu-west-1".to_owned());
        sized.size_bytes = Some(2048);
        sized.object_count = Some(2);
        let mut empty = BucketSummary::new("empty", None);
        empty.region = Some("us-east-1".to_owned());
        empty.size_bytes = Some(0);
        empty.object_count = Some(0);

        let catalog = BucketCatalog {
            buckets: vec![sized, empty],
        };
        let rendered = catalog.to_string();
        let rows: Vec<Vec<&str>> = rendered
            .lines()
            .map(|l| l.split_whitespace().collect())
            .collect();
        assert_eq!(vec!["NAME", "CREATED", "REGION", "OBJECTS", "SIZE"], rows[0]);
        assert_eq!(vec!["archive", "-", "eu-west-1", "2", "2", "KiB"], rows[1]);
        assert_eq!(vec!["empty", "-", "us-east-1", "0", "0", "B"], rows[2]);
        assert_eq!("2 buckets, 2 KiB total", rendered.lines().last().unwrap());
        assert_eq!(4, rows.len());
    }

    #[test]
    fn test_bucket_table_without_sizes() {
        let catalog = BucketCatalog {
            buckets: vec![BucketSummary::new("logs", None)],
        };
        let rendered = catalog.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(vec!["NAME", "CREATED"], lines[0].split_whitespace().collect::<Vec<_>>());
        assert_eq!(vec!["logs", "-"], lines[1].split_whitespace().collect::<Vec<_>>());
        assert_eq!("1 buckets", lines[2]);
        assert!(rendered.lines().all(|l| l == l.trim_end()));
    }
}

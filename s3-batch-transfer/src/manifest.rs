/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{self, Error};
use crate::operation::{normalized_base, resolve_below, suffixed_base, DEFAULT_DELIMITER};

/// One uploaded object recorded in a [`BatchManifest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Object key the file was uploaded to
    pub file_name: String,
    /// Size of the object in bytes
    pub size: u64,
    /// When the object was uploaded (or found to be already present)
    #[serde(with = "timestamp")]
    pub upload_time: DateTime<Utc>,
}

impl ManifestEntry {
    /// Create a new entry
    pub fn new(file_name: impl Into<String>, size: u64, upload_time: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            size,
            upload_time,
        }
    }
}

/// Record of a completed upload batch, persisted as a single JSON object.
///
/// Reading a manifest back gives enough information to place every recorded object under
/// the directory it was originally uploaded from, see [`BatchManifest::local_path_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchManifest {
    /// When the manifest was written
    #[serde(with = "timestamp", default)]
    pub upload_date: DateTime<Utc>,
    /// Uploaded objects, ordered by key
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
    /// The local source directory as given to the upload
    #[serde(default)]
    pub directory: String,
    /// Suffix injected into the first segment of every key, empty if none
    #[serde(default)]
    pub append_suffix: String,
    /// Sum of `size` over all entries
    #[serde(default)]
    pub total_uploaded_size: u64,
    /// Key prefix the files were uploaded below, before the suffix is applied.
    ///
    /// Manifests without it are read as if the keys were derived from `directory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_base: Option<String>,
}

impl BatchManifest {
    /// Create an empty manifest for an upload of `directory`
    pub fn new(directory: impl Into<String>, append_suffix: impl Into<String>) -> Self {
        Self {
            upload_date: Utc::now(),
            files: Vec::new(),
            directory: directory.into(),
            append_suffix: append_suffix.into(),
            total_uploaded_size: 0,
            key_base: None,
        }
    }

    /// Record the key prefix the files were uploaded below
    pub fn with_key_base(mut self, key_base: impl Into<String>) -> Self {
        self.key_base = Some(key_base.into());
        self
    }

    /// Record an uploaded object
    pub fn push(&mut self, entry: ManifestEntry) {
        self.total_uploaded_size += entry.size;
        self.files.push(entry);
    }

    /// Serialize the manifest as pretty printed JSON
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse and validate a manifest
    pub fn from_slice(data: &[u8]) -> Result<Self, Error> {
        let manifest: BatchManifest = serde_json::from_slice(data)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check that the manifest names a directory and at least one file
    pub fn validate(&self) -> Result<(), Error> {
        if self.directory.is_empty() || self.files.is_empty() {
            return Err(error::invalid_manifest(
                "'directory' or 'files' field is missing or empty",
            ));
        }
        if let Some(entry) = self.files.iter().find(|e| e.file_name.is_empty()) {
            return Err(error::invalid_manifest(format!(
                "entry uploaded at {} has an empty 'file_name'",
                entry.upload_time
            )));
        }
        Ok(())
    }

    /// Local destination of `entry` when re-downloading the batch below `root`.
    ///
    /// The result is `root/<directory>/<key relative to the key base>`. Keys that do not
    /// live under the (suffixed) key base are placed at their full key below `root/<directory>`.
    pub fn local_path_for(&self, entry: &ManifestEntry, root: &Path) -> Result<PathBuf, Error> {
        let base = normalized_base(Path::new(&self.directory));
        let key_base = match &self.key_base {
            Some(key_base) => key_base.trim_matches('/').to_owned(),
            None => base.clone(),
        };
        let key = entry.file_name.as_str();

        let relative = [suffixed_base(&key_base, &self.append_suffix), key_base]
            .iter()
            .filter(|b| !b.is_empty())
            .find_map(|b| {
                key.strip_prefix(b.as_str())
                    .and_then(|rest| rest.strip_prefix(DEFAULT_DELIMITER))
            })
            .unwrap_or(key);

        let directory = root.join(&base);
        resolve_below(&directory, Path::new(relative)).ok_or_else(|| {
            error::invalid_manifest(format!(
                "entry '{key}' resolves outside of '{}'",
                directory.display()
            ))
        })
    }
}

/// RFC 3339 timestamps that also accept the naive ISO-8601 form (no offset), read as UTC
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(de::Error::custom)
    }
}

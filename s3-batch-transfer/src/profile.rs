/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::MEBIBYTE;

/// Objects at or above this size use the large transfer profile
const LARGE_OBJECT_BYTES: u64 = 100 * MEBIBYTE;

/// Objects at or above this size use the medium transfer profile
const MEDIUM_OBJECT_BYTES: u64 = 5 * MEBIBYTE;

/// Concurrency and chunking parameters for a single object transfer.
///
/// A profile is chosen once per object, either by [`TransferProfile::select`] from the object
/// size or from the fixed defaults on [`Config`](crate::Config), and does not change for the
/// lifetime of that transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProfile {
    use_concurrency: bool,
    max_concurrency: usize,
    multipart_threshold_bytes: u64,
    multipart_chunk_bytes: u64,
}

impl TransferProfile {
    /// Create a profile with explicit parameters.
    ///
    /// `max_concurrency` and `multipart_chunk_bytes` are raised to at least 1.
    pub const fn new(
        use_concurrency: bool,
        max_concurrency: usize,
        multipart_threshold_bytes: u64,
        multipart_chunk_bytes: u64,
    ) -> Self {
        Self {
            use_concurrency,
            max_concurrency: if max_concurrency == 0 { 1 } else { max_concurrency },
            multipart_threshold_bytes,
            multipart_chunk_bytes: if multipart_chunk_bytes == 0 {
                1
            } else {
                multipart_chunk_bytes
            },
        }
    }

    /// Profile for objects of 100 MiB and above
    pub const LARGE: TransferProfile =
        TransferProfile::new(true, 20, 256 * MEBIBYTE, 16 * MEBIBYTE);

    /// Profile for objects between 5 MiB (inclusive) and 100 MiB
    pub const MEDIUM: TransferProfile = TransferProfile::new(true, 10, 5 * MEBIBYTE, 5 * MEBIBYTE);

    /// Profile for objects below 5 MiB. Such objects never reach the multipart threshold.
    pub const SMALL: TransferProfile = TransferProfile::new(false, 1, 5 * MEBIBYTE, 5 * MEBIBYTE);

    /// Fixed profile used for uploads when adaptive selection is disabled
    pub const DEFAULT_UPLOAD: TransferProfile =
        TransferProfile::new(true, 20, 256 * MEBIBYTE, 16 * MEBIBYTE);

    /// Fixed profile used for downloads when adaptive selection is disabled
    pub const DEFAULT_DOWNLOAD: TransferProfile =
        TransferProfile::new(true, 10, 8 * MEBIBYTE, 8 * MEBIBYTE);

    /// Choose the transfer profile for an object of `size_bytes`.
    ///
    /// Returns `None` for empty objects; those are written with a single empty request and
    /// need no profile.
    pub fn select(size_bytes: u64) -> Option<TransferProfile> {
        match size_bytes {
            0 => None,
            s if s >= LARGE_OBJECT_BYTES => Some(Self::LARGE),
            s if s >= MEDIUM_OBJECT_BYTES => Some(Self::MEDIUM),
            _ => Some(Self::SMALL),
        }
    }

    /// Whether parts of a single object may be transferred concurrently
    pub fn use_concurrency(&self) -> bool {
        self.use_concurrency
    }

    /// Maximum number of parts of a single object in flight at once
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Object size at which a transfer is split into parts
    pub fn multipart_threshold_bytes(&self) -> u64 {
        self.multipart_threshold_bytes
    }

    /// Size of each part of a split transfer
    pub fn multipart_chunk_bytes(&self) -> u64 {
        self.multipart_chunk_bytes
    }

    /// Number of parts that may be in flight at once under this profile
    pub(crate) fn part_concurrency(&self) -> usize {
        if self.use_concurrency {
            self.max_concurrency
        } else {
            1
        }
    }

    /// Whether an object of `size_bytes` is transferred in parts under this profile
    pub fn is_multipart(&self, size_bytes: u64) -> bool {
        size_bytes > 0 && size_bytes >= self.multipart_threshold_bytes
    }

    /// Number of parts an object of `size_bytes` is split into under this profile
    pub fn part_count(&self, size_bytes: u64) -> u64 {
        if !self.is_multipart(size_bytes) {
            return 1;
        }
        size_bytes.div_ceil(self.multipart_chunk_bytes)
    }

    /// Byte ranges (start, length) of each part of an object of `size_bytes`
    pub(crate) fn part_ranges(&self, size_bytes: u64) -> Vec<(u64, u64)> {
        if !self.is_multipart(size_bytes) {
            return vec![(0, size_bytes)];
        }
        let chunk = self.multipart_chunk_bytes;
        (0..self.part_count(size_bytes))
            .map(|i| {
                let start = i * chunk;
                (start, chunk.min(size_bytes - start))
            })
            .collect()
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Component, Path, PathBuf};

use async_channel::{Receiver, Sender};
use chrono::Utc;
use walkdir::{DirEntry, WalkDir};

use super::{UploadObjectsContext, UploadObjectsInput};
use crate::error::{self, Error};
use crate::operation::upload::ObjectUpload;
use crate::operation::{apply_suffix, normalized_base, Disposition, DEFAULT_DELIMITER};
use crate::progress::ProgressReporter;
use crate::types::{TransferOutcome, TransferResult, WorkItem};

#[derive(Debug)]
pub(super) struct UploadObjectJob {
    pub(super) item: WorkItem,
    path: PathBuf,
    key: String,
}

#[derive(Debug)]
pub(super) struct Enumerated {
    pub(super) jobs: Vec<UploadObjectJob>,
    pub(super) base_directory: PathBuf,
    /// Prefix every key was derived below, before any suffix
    pub(super) key_base: String,
}

fn walker(input: &UploadObjectsInput) -> WalkDir {
    let mut walker = WalkDir::new(input.source()).sort_by_file_name();
    if input.follow_symlinks() {
        walker = walker.follow_links(true);
    }
    if !input.recursive() {
        walker = walker.max_depth(1);
    }
    walker
}

/// Socket files are never uploaded, whether detected by file type or by a `.sock` extension
fn is_socket(entry: &DirEntry) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if entry.file_type().is_socket() {
            return true;
        }
    }
    entry.path().extension().is_some_and(|ext| ext == "sock")
}

/// `/` separated path of `path` below `root`
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(DEFAULT_DELIMITER)
}

/// Enumerate the files of a batch in a stable order and derive their object keys.
///
/// Blocking, run it off the async runtime.
pub(super) fn enumerate(input: &UploadObjectsInput) -> Result<Enumerated, Error> {
    let source = input.source();
    let metadata = std::fs::metadata(source).map_err(|err| {
        error::invalid_input(format!(
            "the source {} does not exist or is not accessible: {err}",
            source.display()
        ))
    })?;

    let (root, base_directory) = if metadata.is_dir() {
        (source.to_path_buf(), source.to_path_buf())
    } else if metadata.is_file() {
        let parent = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        (parent.to_path_buf(), parent.to_path_buf())
    } else {
        return Err(error::invalid_input(format!(
            "the source {} is neither a file nor a directory",
            source.display()
        )));
    };

    let base = match input.key_prefix() {
        Some(prefix) => prefix.trim_matches('/').to_owned(),
        None => normalized_base(&base_directory),
    };
    let key_base = if input.keep_path() {
        normalized_base(&absolute(&root)?)
    } else {
        base.clone()
    };

    let mut jobs = Vec::new();
    let entries = if metadata.is_dir() {
        walker(input)
    } else {
        WalkDir::new(source).max_depth(0)
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if is_socket(&entry) {
            tracing::info!("skipping socket file {}", entry.path().display());
            continue;
        }
        if !entry.file_type().is_file() {
            tracing::debug!("skipping {}, not a regular file", entry.path().display());
            continue;
        }

        let size_bytes = entry.metadata()?.len();
        let relative = relative_path(entry.path(), &root);
        let key = derive_object_key(input, entry.path(), &relative, &base)?;
        jobs.push(UploadObjectJob {
            item: WorkItem::new(entry.path().display().to_string(), relative, size_bytes),
            path: entry.path().to_path_buf(),
            key,
        });
    }

    Ok(Enumerated {
        jobs,
        base_directory,
        key_base,
    })
}

fn absolute(path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn derive_object_key(
    input: &UploadObjectsInput,
    path: &Path,
    relative: &str,
    base: &str,
) -> Result<String, Error> {
    let key = if input.keep_path() {
        normalized_base(&absolute(path)?)
    } else if base.is_empty() {
        relative.to_owned()
    } else {
        format!("{base}{DEFAULT_DELIMITER}{relative}")
    };

    Ok(match input.append_suffix() {
        Some(suffix) => apply_suffix(&key, suffix),
        None => key,
    })
}

// feed jobs to the workers in enumeration order
pub(super) async fn distribute_work(
    jobs: Vec<UploadObjectJob>,
    work_tx: Sender<UploadObjectJob>,
) -> Result<(), Error> {
    for job in jobs {
        if work_tx.send(job).await.is_err() {
            tracing::error!("all receiver ends have been dropped, unable to send a job!");
            break;
        }
    }
    Ok(())
}

pub(super) async fn upload_objects(
    ctx: UploadObjectsContext,
    work_rx: Receiver<UploadObjectJob>,
) -> Result<(), Error> {
    while let Ok(job) = work_rx.recv().await {
        tracing::debug!(
            "worker recv'd request for {} ({} bytes)",
            job.key,
            job.item.size_bytes()
        );
        let started_at = Utc::now();
        let state = ctx.state();

        let result = if state.input.dry_run() {
            tracing::info!(
                "[dry run] would upload {} to s3://{}/{}",
                job.path.display(),
                state.input.bucket(),
                job.key
            );
            advance_batch(&ctx, job.item.size_bytes());
            TransferResult::new(job.item, job.key, TransferOutcome::Skipped, 0, started_at)
        } else {
            match upload_single_obj(&ctx, &job).await {
                Ok(Disposition::Transferred(bytes)) => {
                    tracing::debug!("worker finished uploading object {:?}", job.key);
                    TransferResult::new(job.item, job.key, TransferOutcome::Success, bytes, started_at)
                }
                Ok(Disposition::Skipped) => {
                    tracing::info!("skipping {}, already exists", job.key);
                    advance_batch(&ctx, job.item.size_bytes());
                    TransferResult::new(job.item, job.key, TransferOutcome::Skipped, 0, started_at)
                }
                Err(err) => {
                    tracing::error!(
                        "error uploading {}: {}",
                        job.path.display(),
                        aws_smithy_types::error::display::DisplayErrorContext(&err)
                    );
                    TransferResult::failed(job.item, job.key, started_at, &err)
                }
            }
        };

        state.tally.lock()?.record(result);
    }

    tracing::trace!("req channel closed, worker finished");
    Ok(())
}

fn advance_batch(ctx: &UploadObjectsContext, n: u64) {
    let sink = ctx.handle().config.progress_sink();
    sink.advance(ctx.state().batch.id(), n);
}

async fn upload_single_obj(
    ctx: &UploadObjectsContext,
    job: &UploadObjectJob,
) -> Result<Disposition, Error> {
    let state = ctx.state();
    let config = &ctx.handle().config;
    let size_bytes = job.item.size_bytes();
    let upload = ObjectUpload {
        client: ctx.client(),
        bucket: state.input.bucket(),
        key: &job.key,
        source: &job.path,
        size_bytes,
    };

    if !state.input.overwrite() && upload.exists().await? {
        return Ok(Disposition::Skipped);
    }

    let profile = ctx.handle().upload_profile(size_bytes);
    let mut progress = ProgressReporter::new(
        config.progress_sink().clone(),
        &job.key,
        size_bytes,
        config.progress_unit(),
        Some(state.batch),
    );
    match upload.send(profile, &mut progress).await {
        Ok(bytes) => Ok(Disposition::Transferred(bytes)),
        Err(err) => {
            progress.abandon();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn input(source: &Path) -> super::super::UploadObjectsInputBuilder {
        UploadObjectsInput::builder().bucket("bucket").source(source)
    }

    fn keys(enumerated: &Enumerated) -> Vec<&str> {
        enumerated.jobs.iter().map(|j| j.key.as_str()).collect()
    }

    #[test]
    fn test_derive_object_key() {
        let base_input = input(Path::new("data")).build().unwrap();
        assert_eq!(
            "data/a/b.txt",
            derive_object_key(&base_input, Path::new("data/a/b.txt"), "a/b.txt", "data").unwrap()
        );
        assert_eq!(
            "b.txt",
            derive_object_key(&base_input, Path::new("b.txt"), "b.txt", "").unwrap()
        );

        let suffixed = input(Path::new("data"))
            .append_suffix("_prod")
            .build()
            .unwrap();
        assert_eq!(
            "data_prod/a/b.txt",
            derive_object_key(&suffixed, Path::new("data/a/b.txt"), "a/b.txt", "data").unwrap()
        );
        // a single segment key keeps its file name intact
        assert_eq!(
            "b.txt",
            derive_object_key(&suffixed, Path::new("b.txt"), "b.txt", "").unwrap()
        );

        let keep = input(Path::new("/srv/data")).keep_path(true).build().unwrap();
        assert_eq!(
            "srv/data/a/b.txt",
            derive_object_key(&keep, Path::new("/srv/data/./a/b.txt"), "a/b.txt", "srv/data")
                .unwrap()
        );
    }

    #[cfg(target_family = "unix")]
    #[test]
    fn test_enumerate_directory() {
        let dir = test_common::create_test_dir(
            Some("snapshots"),
            vec![("empty.bin", 0), ("nested/ten.bin", 10), ("app.sock", 1)],
        );
        let source = dir.path().to_path_buf();
        let (_listener, _socket) = test_common::create_socket(&source, "live");

        let enumerated = enumerate(
            &input(&source)
                .key_prefix("/backups/")
                .append_suffix("_dev")
                .build()
                .unwrap(),
        )
        .unwrap();

        assert_eq!(
            vec!["backups_dev/empty.bin", "backups_dev/nested/ten.bin"],
            keys(&enumerated)
        );
        assert_eq!(
            vec![0, 10],
            enumerated
                .jobs
                .iter()
                .map(|j| j.item.size_bytes())
                .collect::<Vec<_>>()
        );
        assert_eq!("nested/ten.bin", enumerated.jobs[1].item.relative_path());
    }

    #[cfg(target_family = "unix")]
    #[test]
    fn test_keys_are_injective_with_suffix() {
        let dir = test_common::create_test_dir(
            None,
            vec![("a", 1), ("b/a", 1), ("b/b/a", 1), ("c/a", 1), ("ab", 1)],
        );
        let enumerated = enumerate(
            &input(dir.path())
                .key_prefix("run")
                .append_suffix("-42")
                .build()
                .unwrap(),
        )
        .unwrap();

        let unique: HashSet<_> = keys(&enumerated).into_iter().collect();
        assert_eq!(5, enumerated.jobs.len());
        assert_eq!(5, unique.len());
        assert!(unique.iter().all(|k| k.starts_with("run-42/")));
        assert_eq!("run", enumerated.key_base);
    }

    #[cfg(target_family = "unix")]
    #[test]
    fn test_enumerate_single_file_and_non_recursive() {
        let dir = test_common::create_test_dir(None, vec![("top.txt", 3), ("sub/deep.txt", 4)]);

        let single = enumerate(&input(&dir.path().join("top.txt")).build().unwrap()).unwrap();
        assert_eq!(1, single.jobs.len());
        assert_eq!("top.txt", single.jobs[0].item.relative_path());
        assert_eq!(dir.path(), single.base_directory.as_path());

        let shallow = enumerate(&input(dir.path()).recursive(false).build().unwrap()).unwrap();
        assert_eq!(1, shallow.jobs.len());
        assert!(shallow.jobs[0].key.ends_with("/top.txt"));
    }

    #[test]
    fn test_missing_source_is_invalid_input() {
        let err = enumerate(&input(Path::new("/definitely/not/here")).build().unwrap()).unwrap_err();
        assert_eq!(&crate::error::ErrorKind::InputInvalid, err.kind());
    }
}

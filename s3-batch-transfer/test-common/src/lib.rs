/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![cfg(target_family = "unix")]

use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::{fs, io::Write};
use tempfile::{tempdir, TempDir};

/// Create a directory tree rooted at a fresh temporary directory, containing files with
/// sizes specified in `files` (paths relative to the root).
///
/// `root_prefix` controls the name prefix of the temporary directory itself, which is
/// useful when a test asserts on derived object keys.
pub fn create_test_dir(root_prefix: Option<&str>, files: Vec<(&str, usize)>) -> TempDir {
    let temp_dir = match root_prefix {
        Some(prefix) => TempDir::with_prefix(prefix).unwrap(),
        None => tempdir().unwrap(),
    };

    for (path, size) in files {
        write_file(&temp_dir.path().join(path), size);
    }

    temp_dir
}

/// Write `size` zero bytes to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, size: usize) {
    let parent = path.parent().unwrap();
    fs::create_dir_all(parent).unwrap();

    let mut file = fs::File::create(path).unwrap();
    file.write_all(&vec![0; size]).unwrap();
}

/// Bind a unix domain socket at `dir/name`.
///
/// The returned listener must be kept alive for as long as the socket file should exist.
pub fn create_socket(dir: &Path, name: &str) -> (UnixListener, PathBuf) {
    let path = dir.join(name);
    let listener = UnixListener::bind(&path).unwrap();
    (listener, path)
}

/// Collect every regular file under `root` as `(relative path, size)`, sorted by path.
pub fn list_files(root: &Path) -> Vec<(String, u64)> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let meta = entry.metadata().unwrap();
            if meta.is_dir() {
                pending.push(entry.path());
            } else if meta.is_file() {
                let rel = entry.path().strip_prefix(root).unwrap().to_owned();
                found.push((rel.to_string_lossy().into_owned(), meta.len()));
            }
        }
    }
    found.sort();
    found
}

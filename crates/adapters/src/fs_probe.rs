// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure filesystem primitives for a training run's output directory:
//! recursively list checkpoint (`.safetensors`) subdirectories, list the
//! `.png` files within one of them, and open a file by path. `probe`
//! composes the three into a one-shot walk used by the scan route.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("directory not found: {0}")]
    NotFound(PathBuf),
    #[error("io error walking {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

fn is_checkpoint_dir_name(name: &str) -> bool {
    name.ends_with(".safetensors")
}

fn is_png(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.eq_ignore_ascii_case("png")).unwrap_or(false)
}

/// Recursively list every `.safetensors` checkpoint subdirectory under
/// `root`, as paths relative to `root`. Directories are visited depth-first;
/// a directory that disappears mid-walk is skipped rather than failing the
/// whole call.
pub async fn list_safetensors(root: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    if fs::metadata(root).await.is_err() {
        return Err(ProbeError::NotFound(root.to_path_buf()));
    }

    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        while let Some(entry) = entries.next_entry().await.map_err(|source| ProbeError::Io { path: dir.clone(), source })? {
            let path = entry.path();
            let Ok(file_type) = entry.file_type().await else { continue };
            if !file_type.is_dir() {
                continue;
            }
            let is_checkpoint = path.file_name().and_then(|name| name.to_str()).map(is_checkpoint_dir_name).unwrap_or(false);
            if is_checkpoint {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            } else {
                stack.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Non-recursively list the `.png` files directly inside `dir`, as bare
/// filenames (no directory component).
pub async fn list_png(dir: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Err(ProbeError::NotFound(dir.to_path_buf()));
        }
        Err(source) => return Err(ProbeError::Io { path: dir.to_path_buf(), source }),
    };

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|source| ProbeError::Io { path: dir.to_path_buf(), source })? {
        let path = entry.path();
        let Ok(file_type) = entry.file_type().await else { continue };
        if file_type.is_file() && is_png(&path) {
            if let Some(name) = path.file_name() {
                found.push(PathBuf::from(name));
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Open a file by path. A missing file is an expected condition (another
/// process can delete between readdir and open) and logged at debug; any
/// other failure is logged at error.
pub async fn open_file(path: &Path) -> Result<File, ProbeError> {
    match File::open(path).await {
        Ok(file) => Ok(file),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "file not found");
            Err(ProbeError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            tracing::error!(path = %path.display(), %source, "failed to open file");
            Err(ProbeError::Io { path: path.to_path_buf(), source })
        }
    }
}

/// One-shot probe of a training run's output directory: every checkpoint
/// subdirectory's `.png` files, as paths relative to `root`. Entries whose
/// file disappears between listing and opening are skipped.
pub async fn probe(root: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    let mut found = Vec::new();

    for checkpoint_dir in list_safetensors(root).await? {
        let absolute_dir = root.join(&checkpoint_dir);
        let filenames = match list_png(&absolute_dir).await {
            Ok(filenames) => filenames,
            Err(ProbeError::NotFound(_)) => continue,
            Err(err) => return Err(err),
        };
        for filename in filenames {
            let absolute_path = absolute_dir.join(&filename);
            if open_file(&absolute_path).await.is_ok() {
                found.push(checkpoint_dir.join(filename));
            }
        }
    }

    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probes_missing_directory_returns_not_found() {
        let err = probe(Path::new("/nonexistent/definitely/not/here")).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotFound(_)));
    }

    #[tokio::test]
    async fn finds_nested_images_under_checkpoint_directories_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::create_dir_all(dir.path().join("checkpoint-1000.safetensors")).await.expect("mkdir");
        tokio::fs::write(dir.path().join("checkpoint-1000.safetensors/a.png"), b"x").await.expect("write");
        tokio::fs::write(dir.path().join("checkpoint-1000.safetensors/notes.txt"), b"x").await.expect("write");
        // not inside a .safetensors directory, so it's ignored
        tokio::fs::write(dir.path().join("b.png"), b"x").await.expect("write");

        let mut found = probe(dir.path()).await.expect("probe");
        found.sort();
        assert_eq!(found, vec![PathBuf::from("checkpoint-1000.safetensors/a.png")]);
    }

    #[tokio::test]
    async fn list_safetensors_finds_nested_checkpoint_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::create_dir_all(dir.path().join("group/checkpoint-2000.safetensors")).await.expect("mkdir");
        tokio::fs::create_dir_all(dir.path().join("group/plain-subdir")).await.expect("mkdir");

        let found = list_safetensors(dir.path()).await.expect("list");
        assert_eq!(found, vec![PathBuf::from("group/checkpoint-2000.safetensors")]);
    }

    #[tokio::test]
    async fn list_png_ignores_subdirectories_and_non_png_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join("a.png"), b"x").await.expect("write");
        tokio::fs::write(dir.path().join("a.json"), b"{}").await.expect("write");
        tokio::fs::create_dir_all(dir.path().join("nested")).await.expect("mkdir");
        tokio::fs::write(dir.path().join("nested/b.png"), b"x").await.expect("write");

        let found = list_png(dir.path()).await.expect("list");
        assert_eq!(found, vec![PathBuf::from("a.png")]);
    }

    #[tokio::test]
    async fn open_file_reports_not_found_for_a_missing_path() {
        let err = open_file(Path::new("/nonexistent/definitely/not/here.png")).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotFound(_)));
    }

    #[tokio::test]
    async fn open_file_succeeds_for_an_existing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.png");
        tokio::fs::write(&path, b"x").await.expect("write");
        open_file(&path).await.expect("open");
    }
}

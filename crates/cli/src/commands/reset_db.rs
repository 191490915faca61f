// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sg-cli reset-db` — delete the database file (and its WAL/SHM
//! companions) so the next `Store::open` recreates an empty schema.
//! Destructive, so it refuses without `--yes`.

use anyhow::{anyhow, Context};
use std::path::PathBuf;

pub async fn run(database_path: Option<PathBuf>, yes: bool) -> anyhow::Result<()> {
    let path = super::env::database_path(database_path);
    if !yes {
        return Err(anyhow!("refusing to delete {} without --yes", path.display()));
    }

    for suffix in ["", "-wal", "-shm"] {
        let candidate = append_suffix(&path, suffix);
        match std::fs::remove_file(&candidate) {
            Ok(()) => tracing::info!(path = %candidate.display(), "removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err).context(format!("failed to remove {}", candidate.display())),
        }
    }

    println!("database reset: {}", path.display());
    Ok(())
}

fn append_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

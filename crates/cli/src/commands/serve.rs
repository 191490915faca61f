// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sg-cli serve` — locate and exec the `sg-server` binary in the
//! foreground, forwarding its exit status.

use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::process::Command;

pub async fn run(database_path: Option<PathBuf>) -> anyhow::Result<()> {
    let server_path = find_server_binary()?;
    let mut command = Command::new(&server_path);
    if let Some(path) = database_path {
        command.env("SG_DATABASE_PATH", path);
    }
    let status = command.status().with_context(|| format!("failed to launch {}", server_path.display()))?;
    if !status.success() {
        return Err(anyhow!("sg-server exited with status: {status}"));
    }
    Ok(())
}

/// Check the current executable's own directory first (the install
/// layout), then a sibling `target/debug` or `target/release` build next
/// to it (the development layout), falling back to `PATH`.
fn find_server_binary() -> anyhow::Result<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(found) = sibling_binary(dir) {
                return Ok(found);
            }
        }
    }
    Ok(PathBuf::from("sg-server"))
}

fn sibling_binary(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join("sg-server");
    if candidate.exists() {
        return Some(candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_path_lookup_when_no_sibling_binary_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(sibling_binary(dir.path()).is_none());
    }
}

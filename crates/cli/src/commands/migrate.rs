// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sg-cli migrate` — apply pending schema migrations and exit. Useful
//! for a deploy step that wants migrations applied before the server
//! starts accepting traffic, separate from `Store::open`'s normal
//! apply-on-startup behavior.

use anyhow::Context;
use sg_storage::Store;
use std::path::PathBuf;

pub async fn run(database_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = super::env::database_path(database_path);
    tracing::info!(path = %path.display(), "applying migrations");
    Store::open(&path).with_context(|| format!("failed to open database at {}", path.display()))?;
    println!("migrations applied to {}", path.display());
    Ok(())
}

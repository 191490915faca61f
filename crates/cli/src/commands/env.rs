// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable access shared by the maintenance subcommands.

use std::path::PathBuf;

pub fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

pub fn database_path(override_path: Option<PathBuf>) -> PathBuf {
    override_path
        .or_else(|| std::env::var("SG_DATABASE_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("sample-grid.db"))
}

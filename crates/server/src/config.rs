// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server binary.

use std::path::PathBuf;

/// Resolve the log level: `LOG_LEVEL` env var, defaulting to `info`.
pub fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// SQLite database path: `SG_DATABASE_PATH`, defaulting to `./sample-grid.db`.
pub fn database_path() -> PathBuf {
    std::env::var("SG_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("sample-grid.db"))
}

/// Base URL of the render service, e.g. `http://127.0.0.1:8188`.
pub fn render_service_url() -> String {
    std::env::var("SG_RENDER_SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:8188".to_string())
}

/// Root directory under which training-run output trees live.
pub fn training_runs_root() -> PathBuf {
    std::env::var("SG_TRAINING_RUNS_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./runs"))
}

/// TCP port the HTTP server listens on: `SG_PORT`, defaulting to 4500.
pub fn port() -> u16 {
    std::env::var("SG_PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(4500)
}

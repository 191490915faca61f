// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state handed to every route handler.

use sg_adapters::FsWatcher;
use sg_engine::{Dispatcher, Hub};
use sg_storage::Store;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Watchers keyed by training-run id, kept alive only as long as at
/// least one client has asked to scan that run; dropping the value
/// stops the underlying OS watch.
#[derive(Default)]
pub struct WatcherRegistry {
    watchers: parking_lot::Mutex<HashMap<String, FsWatcher>>,
}

impl WatcherRegistry {
    /// Insert a watcher for `training_run_id`, replacing (and stopping)
    /// any watcher already registered for the same run.
    pub fn insert(&self, training_run_id: String, watcher: FsWatcher) {
        self.watchers.lock().insert(training_run_id, watcher);
    }

    pub fn is_watching(&self, training_run_id: &str) -> bool {
        self.watchers.lock().contains_key(training_run_id)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub dispatcher: Dispatcher,
    pub hub: Hub,
    pub training_runs_root: PathBuf,
    pub watchers: Arc<WatcherRegistry>,
}

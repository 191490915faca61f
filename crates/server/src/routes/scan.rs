// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /api/scan` — one-shot probe + scan of a training run's output
//! tree, and (on first request for a given run) starts the filesystem
//! watcher that feeds the broadcast hub for the rest of the run's life.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sg_core::{AppError, PublishedEvent, ScanResult};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/scan", get(scan_training_run))
}

#[derive(Deserialize)]
struct ScanQuery {
    #[serde(rename = "trainingRunId")]
    training_run_id: String,
}

async fn scan_training_run(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> ApiResult<Json<ScanResult>> {
    let root = state.training_runs_root.join(&query.training_run_id);
    let relative_paths = sg_adapters::probe(&root)
        .await
        .map_err(|err| AppError::NotFound(format!("training run {}: {err}", query.training_run_id)))?;

    ensure_watching(&state, &query.training_run_id, &root);

    Ok(Json(sg_adapters::scan(&relative_paths)))
}

fn ensure_watching(state: &AppState, training_run_id: &str, root: &std::path::Path) {
    if state.watchers.is_watching(training_run_id) {
        return;
    }
    let (fs_tx, mut fs_rx) = tokio::sync::mpsc::channel(256);
    match sg_adapters::watch(root, training_run_id.to_string(), fs_tx) {
        Ok(watcher) => {
            let hub = state.hub.clone();
            tokio::spawn(async move {
                while let Some(event) = fs_rx.recv().await {
                    hub.publish(PublishedEvent::Fs(event));
                }
            });
            state.watchers.insert(training_run_id.to_string(), watcher);
        }
        Err(err) => {
            tracing::warn!(%err, training_run_id, "failed to start filesystem watcher");
        }
    }
}

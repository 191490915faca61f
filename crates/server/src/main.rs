// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample grid service: HTTP + WebSocket boundary wiring the store, the
//! job engine, and the render-service adapters together.

mod config;
mod error;
mod recovery;
mod routes;
mod state;

use anyhow::Context;
use sg_adapters::RenderHttpClient;
use sg_engine::{Dispatcher, Hub};
use sg_storage::Store;
use state::{AppState, WatcherRegistry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config::log_level()))
        .init();

    let database_path = config::database_path();
    let store = Store::open(&database_path)
        .with_context(|| format!("failed to open database at {}", database_path.display()))?;

    recovery::recover_interrupted_jobs(&store).await.context("failed to reconcile state after restart")?;

    let hub = Hub::new();
    let render = RenderHttpClient::new(config::render_service_url());
    let client_id = uuid::Uuid::new_v4().to_string();

    let dispatcher = Dispatcher::spawn(store.clone(), render, hub.clone(), client_id.clone());

    spawn_render_service_listener(&dispatcher, client_id);
    dispatcher.command_sender().send(sg_engine::EngineCommand::PollJobs).await.ok();

    let state = AppState {
        store,
        dispatcher,
        hub,
        training_runs_root: config::training_runs_root(),
        watchers: Arc::new(WatcherRegistry::default()),
    };
    let app = routes::build(state);

    let port = config::port();
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!(port, "sample grid service listening");

    axum::serve(listener, app).await.context("server loop exited")?;
    Ok(())
}

/// Forward the render service's progress/completion events into the
/// dispatcher's mailbox for the lifetime of the process.
fn spawn_render_service_listener(dispatcher: &Dispatcher, client_id: String) {
    let base = config::render_service_url();
    let ws_url = format!("{}/ws", base.replacen("http", "ws", 1));
    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel(256);

    tokio::spawn(sg_adapters::render_client::ws::listen(ws_url, client_id, event_tx));

    let command_tx = dispatcher.command_sender();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if command_tx.send(sg_engine::EngineCommand::RenderEvent(event)).await.is_err() {
                break;
            }
        }
    });
}

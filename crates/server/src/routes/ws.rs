// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /api/ws` — the live-update fabric's client transport. Each
//! connection owns a writer loop draining its hub mailbox; a write that
//! blocks past the slow-consumer timeout closes the session, matching
//! the hub's drop-oldest-on-overflow policy with an equivalent policy
//! for a transport that's stuck rather than merely behind.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sg_engine::SLOW_CONSUMER_TIMEOUT;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ws", get(ws_handler))
}

#[derive(Deserialize)]
struct WsQuery {
    #[serde(rename = "trainingRunId")]
    training_run_id: Option<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.training_run_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, training_run_id: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (session_id, handle) = state.hub.register(training_run_id);
    tracing::info!(%session_id, "websocket session opened");

    // The client never sends anything meaningful; draining the receiver
    // is how we notice the peer closed the connection.
    let mut closed = Box::pin(async move { while receiver.next().await.is_some() {} });

    loop {
        tokio::select! {
            _ = &mut closed => break,
            batch = handle.recv_batch() => {
                let mut broken = false;
                for message in batch {
                    let payload = match serde_json::to_string(&message) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::error!(%err, "failed to serialize broadcast message");
                            continue;
                        }
                    };
                    let write = tokio::time::timeout(SLOW_CONSUMER_TIMEOUT, sender.send(Message::Text(payload)));
                    match write.await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            tracing::warn!(%session_id, %err, "websocket write failed, closing session");
                            broken = true;
                            break;
                        }
                        Err(_) => {
                            tracing::warn!(%session_id, "websocket write exceeded slow-consumer timeout, closing session");
                            broken = true;
                            break;
                        }
                    }
                }
                if broken {
                    break;
                }
            }
        }
    }

    state.hub.unregister(&session_id);
    tracing::info!(%session_id, "websocket session closed");
}

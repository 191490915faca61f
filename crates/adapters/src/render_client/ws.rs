// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Receive-only WebSocket listener for the render service's progress
//! stream. Runs its own reconnect/backoff loop, independent of the
//! UI-facing broadcast hub — a flaky render service shouldn't tear down
//! client connections, and a flaky client connection shouldn't affect this
//! listener.

use futures_util::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum RenderServiceEvent {
    ExecutionStart { prompt_id: String },
    Executing { prompt_id: String, node: Option<String> },
    Progress { value: u32, max: u32 },
    Executed { prompt_id: String, output_path: Option<String> },
    ExecutionError { prompt_id: String, message: String },
    StatusUpdate { queue_remaining: u32 },
}

/// Parse one `{"type": ..., "data": ...}` frame from the render service
/// into a typed event. Unrecognized or malformed frames are silently
/// dropped — the service is known to send other message types this
/// listener has no use for.
fn parse_event(text: &str) -> Option<RenderServiceEvent> {
    let json: Value = serde_json::from_str(text).ok()?;
    let kind = json.get("type")?.as_str()?;
    let data = json.get("data")?;

    match kind {
        "execution_start" => Some(RenderServiceEvent::ExecutionStart {
            prompt_id: data.get("prompt_id")?.as_str()?.to_string(),
        }),
        "executing" => Some(RenderServiceEvent::Executing {
            prompt_id: data.get("prompt_id")?.as_str()?.to_string(),
            node: data.get("node").and_then(|v| v.as_str()).map(str::to_string),
        }),
        "progress" => Some(RenderServiceEvent::Progress {
            value: data.get("value")?.as_u64()? as u32,
            max: data.get("max")?.as_u64()? as u32,
        }),
        "executed" => {
            let output_path = data
                .get("output")
                .and_then(|o| o.get("images"))
                .and_then(|images| images.as_array())
                .and_then(|images| images.first())
                .and_then(|first| {
                    let filename = first.get("filename")?.as_str()?;
                    let subfolder = first.get("subfolder").and_then(|v| v.as_str()).unwrap_or("");
                    Some(if subfolder.is_empty() {
                        filename.to_string()
                    } else {
                        format!("{subfolder}/{filename}")
                    })
                });
            Some(RenderServiceEvent::Executed {
                prompt_id: data.get("prompt_id")?.as_str()?.to_string(),
                output_path,
            })
        }
        "execution_error" => Some(RenderServiceEvent::ExecutionError {
            prompt_id: data.get("prompt_id")?.as_str()?.to_string(),
            message: data
                .get("exception_message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        }),
        "status" => Some(RenderServiceEvent::StatusUpdate {
            queue_remaining: data
                .get("status")
                .and_then(|s| s.get("exec_info"))
                .and_then(|e| e.get("queue_remaining"))
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        }),
        _ => None,
    }
}

/// Connect to the render service's WebSocket endpoint and forward decoded
/// events to `event_tx` until the channel closes. Reconnects with
/// exponential backoff (1s, 2s, 4s, 8s, 16s, capped at 30s) on every drop;
/// never gives up, since the render service may simply not be up yet.
pub async fn listen(ws_url: String, client_id: String, event_tx: mpsc::Sender<RenderServiceEvent>) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let url = format!("{}?clientId={}", ws_url.trim_end_matches('/'), client_id);
        match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _)) => {
                tracing::info!("render service ws connected");
                backoff = INITIAL_BACKOFF;
                let (_, mut read) = stream.split();

                loop {
                    match read.next().await {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = parse_event(&text) {
                                if event_tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::warn!("render service ws closed, reconnecting");
                            break;
                        }
                        Some(Err(err)) => {
                            tracing::warn!(%err, "render service ws error, reconnecting");
                            break;
                        }
                        _ => {}
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, backoff_ms = backoff.as_millis() as u64, "render service ws connect failed");
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

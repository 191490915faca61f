// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of the render service: submitting prompts, cancelling work,
//! and reading back history/object-info/view/system-stats.

use super::queue_decode::{self, QueueEntry};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderHttpError {
    #[error("render service unreachable: {0}")]
    Unreachable(String),
    #[error("render service returned an error: {0}")]
    ServiceError(String),
    #[error("render service response was malformed: {0}")]
    Malformed(String),
}

/// Thin wrapper over the render service's HTTP API. Cloning is cheap —
/// `reqwest::Client` is itself an `Arc`-backed handle.
#[derive(Clone)]
pub struct RenderHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl RenderHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, RenderHttpError> {
        let response = request.send().await.map_err(|e| RenderHttpError::Unreachable(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| RenderHttpError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(RenderHttpError::ServiceError(format!("{status}: {body}")));
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RenderHttpError::Malformed(e.to_string()))
    }

    /// Submit a workflow graph, returning the assigned prompt id.
    pub async fn submit_prompt(&self, workflow: Value, client_id: &str) -> Result<String, RenderHttpError> {
        let body = serde_json::json!({ "prompt": workflow, "client_id": client_id });
        let response = self
            .send_json(self.client.post(self.url("/prompt")).json(&body))
            .await?;
        response
            .get("prompt_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| RenderHttpError::Malformed("response missing prompt_id".into()))
    }

    /// Remove a queued (not yet running) prompt.
    pub async fn cancel_queued(&self, prompt_id: &str) -> Result<(), RenderHttpError> {
        let body = serde_json::json!({ "delete": [prompt_id] });
        self.send_json(self.client.post(self.url("/queue")).json(&body)).await?;
        Ok(())
    }

    /// Interrupt whatever is currently executing.
    pub async fn interrupt(&self) -> Result<(), RenderHttpError> {
        self.send_json(self.client.post(self.url("/interrupt"))).await?;
        Ok(())
    }

    /// Current queue state: running and pending entries, decoded
    /// positionally (see [`queue_decode`]).
    pub async fn queue(&self) -> Result<(Vec<QueueEntry>, Vec<QueueEntry>), RenderHttpError> {
        let response = self.send_json(self.client.get(self.url("/queue"))).await?;
        let running = response.get("queue_running").map(queue_decode::decode_queue_list).unwrap_or_default();
        let pending = response.get("queue_pending").map(queue_decode::decode_queue_list).unwrap_or_default();
        Ok((running, pending))
    }

    /// Fetch the history entry for one prompt, if it has completed.
    pub async fn history(&self, prompt_id: &str) -> Result<Option<Value>, RenderHttpError> {
        let response = self.send_json(self.client.get(self.url(&format!("/history/{prompt_id}")))).await?;
        Ok(response.get(prompt_id).cloned())
    }

    /// Object-info describing available node types and their inputs.
    pub async fn object_info(&self) -> Result<Value, RenderHttpError> {
        self.send_json(self.client.get(self.url("/object_info"))).await
    }

    /// Download an output image's bytes.
    pub async fn view(&self, filename: &str, subfolder: &str, image_type: &str) -> Result<Vec<u8>, RenderHttpError> {
        let response = self
            .client
            .get(self.url("/view"))
            .query(&[("filename", filename), ("subfolder", subfolder), ("type", image_type)])
            .send()
            .await
            .map_err(|e| RenderHttpError::Unreachable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RenderHttpError::ServiceError(response.status().to_string()));
        }
        response.bytes().await.map(|b| b.to_vec()).map_err(|e| RenderHttpError::Unreachable(e.to_string()))
    }

    pub async fn system_stats(&self) -> Result<Value, RenderHttpError> {
        self.send_json(self.client.get(self.url("/system_stats"))).await
    }
}

#[async_trait::async_trait]
impl super::RenderClient for RenderHttpClient {
    async fn submit_prompt(&self, workflow: Value, client_id: &str) -> Result<String, RenderHttpError> {
        RenderHttpClient::submit_prompt(self, workflow, client_id).await
    }

    async fn interrupt(&self) -> Result<(), RenderHttpError> {
        RenderHttpClient::interrupt(self).await
    }
}

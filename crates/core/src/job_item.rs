// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One point of the Cartesian product expanded from a sample preset.
//! Per-item execution state for a sample job.

use crate::define_id;
use crate::job::SampleJobId;
use crate::simple_display;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

define_id! {
    /// Identifier for a [`SampleJobItem`].
    pub struct SampleJobItemId("item");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleJobItemStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

simple_display! {
    SampleJobItemStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl SampleJobItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SampleJobItemStatus::Completed | SampleJobItemStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleJobItem {
    pub id: SampleJobItemId,
    pub job_id: SampleJobId,
    pub checkpoint_filename: String,
    pub comfy_ui_model_path: String,
    pub prompt_name: String,
    pub prompt_text: String,
    pub steps: u32,
    pub cfg: f64,
    pub sampler_name: String,
    pub scheduler: String,
    pub seed: i64,
    pub width: u32,
    pub height: u32,
    pub status: SampleJobItemStatus,
    pub comfy_ui_prompt_id: Option<String>,
    pub output_path: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SampleJobItem {
    /// Every item that has been running carries a
    /// non-empty prompt id.
    pub fn prompt_id_invariant_holds(&self) -> bool {
        if self.status == SampleJobItemStatus::Pending {
            return true;
        }
        self.comfy_ui_prompt_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
#[path = "job_item_tests.rs"]
mod tests;
// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample job: one launch of a sample preset against a set of checkpoints.
//! Job-level domain types and the dispatcher's eligibility rules.

use crate::define_id;
use crate::sample_preset::SamplePresetId;
use crate::simple_display;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

define_id! {
    /// Identifier for a [`SampleJob`].
    pub struct SampleJobId("jobb");
}

/// Job-level state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleJobStatus {
    Pending,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
    Stopped,
}

simple_display! {
    SampleJobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        CompletedWithErrors => "completed_with_errors",
        Failed => "failed",
        Stopped => "stopped",
    }
}

impl SampleJobStatus {
    /// Whether the dispatcher may pick this job up: only the oldest
    /// job in status pending or stopped is eligible.
    pub fn is_dispatchable(self) -> bool {
        matches!(self, SampleJobStatus::Pending | SampleJobStatus::Stopped)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SampleJobStatus::Completed
                | SampleJobStatus::CompletedWithErrors
                | SampleJobStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleJob {
    pub id: SampleJobId,
    pub training_run_name: String,
    pub sample_preset_id: SamplePresetId,
    pub workflow_name: String,
    pub vae: Option<String>,
    pub clip: Option<String>,
    pub shift: Option<f64>,
    pub status: SampleJobStatus,
    pub total_items: u32,
    pub completed_items: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SampleJob {
    /// completed_items must never exceed total_items.
    pub fn completed_items_in_bounds(&self) -> bool {
        self.completed_items <= self.total_items
    }
}

/// Parameters accepted by `launchJob`.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchJobRequest {
    pub sample_preset_id: SamplePresetId,
    pub training_run_name: String,
    pub checkpoint_filenames: Vec<String>,
    pub workflow: serde_json::Value,
    pub workflow_name: String,
    #[serde(default)]
    pub vae: Option<String>,
    #[serde(default)]
    pub clip: Option<String>,
    #[serde(default)]
    pub shift: Option<f64>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
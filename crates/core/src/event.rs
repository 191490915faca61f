// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events carried across the live-update fabric: from the filesystem
//! watcher and the job engine, through the broadcast hub, to UI clients.

use crate::job::{SampleJobId, SampleJobStatus};
use serde::{Deserialize, Serialize};

/// A change observed under a training-run output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FsEvent {
    DirectoryAdded { training_run_id: String, path: String },
    ImageAdded { training_run_id: String, path: String },
    ImageRemoved { training_run_id: String, path: String },
}

impl FsEvent {
    pub fn training_run_id(&self) -> &str {
        match self {
            FsEvent::DirectoryAdded { training_run_id, .. }
            | FsEvent::ImageAdded { training_run_id, .. }
            | FsEvent::ImageRemoved { training_run_id, .. } => training_run_id,
        }
    }
}

/// Optional within-checkpoint progress, reported while a checkpoint's
/// items are being worked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointItemProgress {
    pub index: u32,
    pub count: u32,
}

/// Derived job progress, recomputed from item rows on every terminal
/// transition — never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: SampleJobId,
    pub status: SampleJobStatus,
    pub total_items: u32,
    pub completed_items: u32,
    pub failed_items: u32,
    pub pending_items: u32,
    pub checkpoints_completed: u32,
    pub total_checkpoints: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_checkpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_checkpoint_progress: Option<CheckpointItemProgress>,
}

/// Server→client messages broadcast over `/api/ws`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastMessage {
    DirectoryAdded { path: String },
    ImageAdded { path: String },
    ImageRemoved { path: String },
    JobProgress {
        job_id: SampleJobId,
        status: SampleJobStatus,
        total_items: u32,
        completed_items: u32,
        failed_items: u32,
        pending_items: u32,
        checkpoints_completed: u32,
        total_checkpoints: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_checkpoint: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_checkpoint_progress: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_checkpoint_total: Option<u32>,
    },
}

impl From<FsEvent> for BroadcastMessage {
    fn from(event: FsEvent) -> Self {
        match event {
            FsEvent::DirectoryAdded { path, .. } => BroadcastMessage::DirectoryAdded { path },
            FsEvent::ImageAdded { path, .. } => BroadcastMessage::ImageAdded { path },
            FsEvent::ImageRemoved { path, .. } => BroadcastMessage::ImageRemoved { path },
        }
    }
}

impl From<JobProgress> for BroadcastMessage {
    fn from(progress: JobProgress) -> Self {
        BroadcastMessage::JobProgress {
            job_id: progress.job_id,
            status: progress.status,
            total_items: progress.total_items,
            completed_items: progress.completed_items,
            failed_items: progress.failed_items,
            pending_items: progress.pending_items,
            checkpoints_completed: progress.checkpoints_completed,
            total_checkpoints: progress.total_checkpoints,
            current_checkpoint: progress.current_checkpoint,
            current_checkpoint_progress: progress.current_checkpoint_progress.map(|p| p.index),
            current_checkpoint_total: progress.current_checkpoint_progress.map(|p| p.count),
        }
    }
}

/// Published to the broadcast hub; carries enough context for per-training-
/// run filtering: FS events are filtered, job progress is not.
#[derive(Debug, Clone)]
pub enum PublishedEvent {
    Fs(FsEvent),
    JobProgress(JobProgress),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_event_carries_training_run_id() {
        let event = FsEvent::ImageAdded {
            training_run_id: "run-1".into(),
            path: "m.safetensors/a.png".into(),
        };
        assert_eq!(event.training_run_id(), "run-1");
    }

    #[test]
    fn job_progress_converts_to_broadcast_message_without_checkpoint_detail() {
        let progress = JobProgress {
            job_id: SampleJobId::new(),
            status: SampleJobStatus::Running,
            total_items: 10,
            completed_items: 3,
            failed_items: 1,
            pending_items: 6,
            checkpoints_completed: 0,
            total_checkpoints: 2,
            current_checkpoint: None,
            current_checkpoint_progress: None,
        };
        let message: BroadcastMessage = progress.into();
        match message {
            BroadcastMessage::JobProgress { current_checkpoint_progress, .. } => {
                assert_eq!(current_checkpoint_progress, None);
            }
            _ => panic!("wrong variant"),
        }
    }
}
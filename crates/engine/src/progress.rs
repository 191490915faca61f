// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derives [`JobProgress`] from a job's item rows. Never stored — callers
//! recompute it fresh every time a broadcast is due.

use sg_core::{CheckpointItemProgress, JobProgress, SampleJob, SampleJobItem, SampleJobItemStatus};
use std::collections::BTreeSet;

/// Recompute progress for `job` from its current item rows. `items` must
/// belong to `job` (callers fetch them via `Store::list_job_items`).
pub fn compute_job_progress(job: &SampleJob, items: &[SampleJobItem]) -> JobProgress {
    let total_items = items.len() as u32;
    let completed_items = items.iter().filter(|i| i.status == SampleJobItemStatus::Completed).count() as u32;
    let failed_items = items.iter().filter(|i| i.status == SampleJobItemStatus::Failed).count() as u32;
    let pending_items = items.iter().filter(|i| i.status == SampleJobItemStatus::Pending).count() as u32;

    let checkpoints: BTreeSet<&str> = items.iter().map(|i| i.checkpoint_filename.as_str()).collect();
    let total_checkpoints = checkpoints.len() as u32;

    let checkpoints_completed = checkpoints
        .iter()
        .filter(|checkpoint| {
            items
                .iter()
                .filter(|i| i.checkpoint_filename == **checkpoint)
                .all(|i| i.status.is_terminal())
        })
        .count() as u32;

    let current_checkpoint = items
        .iter()
        .find(|i| i.status == SampleJobItemStatus::Running)
        .map(|i| i.checkpoint_filename.clone())
        .or_else(|| items.iter().find(|i| i.status == SampleJobItemStatus::Pending).map(|i| i.checkpoint_filename.clone()));

    let current_checkpoint_progress = current_checkpoint.as_deref().map(|checkpoint| {
        let in_checkpoint: Vec<&SampleJobItem> =
            items.iter().filter(|i| i.checkpoint_filename == checkpoint).collect();
        let done = in_checkpoint.iter().filter(|i| i.status.is_terminal()).count() as u32;
        CheckpointItemProgress { index: done, count: in_checkpoint.len() as u32 }
    });

    JobProgress {
        job_id: job.id.clone(),
        status: job.status,
        total_items,
        completed_items,
        failed_items,
        pending_items,
        checkpoints_completed,
        total_checkpoints,
        current_checkpoint,
        current_checkpoint_progress,
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;

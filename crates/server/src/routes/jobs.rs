// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/sample-jobs` — launch, list, and control sample jobs. Every
//! response carries progress derived fresh from item rows rather than
//! the job's own (possibly stale) stored counters.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sg_core::{CheckpointItemProgress, LaunchJobRequest, SampleJob, SampleJobId, SampleJobStatus, SamplePresetId};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sample-jobs", get(list_jobs).post(launch_job))
        .route("/api/sample-jobs/:id", get(get_job).delete(delete_job))
        .route("/api/sample-jobs/:id/stop", post(stop_job))
        .route("/api/sample-jobs/:id/resume", post(resume_job))
}

#[derive(Serialize)]
pub struct SampleJobView {
    id: SampleJobId,
    training_run_name: String,
    sample_preset_id: SamplePresetId,
    workflow_name: String,
    vae: Option<String>,
    clip: Option<String>,
    shift: Option<f64>,
    status: SampleJobStatus,
    total_items: u32,
    completed_items: u32,
    failed_items: u32,
    pending_items: u32,
    checkpoints_completed: u32,
    total_checkpoints: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_checkpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_checkpoint_progress: Option<CheckpointItemProgress>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

async fn view_of(state: &AppState, job: SampleJob) -> Result<SampleJobView, sg_core::AppError> {
    let items = state.store.list_job_items(job.id.clone()).await?;
    let progress = sg_engine::compute_job_progress(&job, &items);
    Ok(SampleJobView {
        id: job.id,
        training_run_name: job.training_run_name,
        sample_preset_id: job.sample_preset_id,
        workflow_name: job.workflow_name,
        vae: job.vae,
        clip: job.clip,
        shift: job.shift,
        status: progress.status,
        total_items: progress.total_items,
        completed_items: progress.completed_items,
        failed_items: progress.failed_items,
        pending_items: progress.pending_items,
        checkpoints_completed: progress.checkpoints_completed,
        total_checkpoints: progress.total_checkpoints,
        current_checkpoint: progress.current_checkpoint,
        current_checkpoint_progress: progress.current_checkpoint_progress,
        created_at: job.created_at,
        updated_at: job.updated_at,
    })
}

async fn launch_job(
    State(state): State<AppState>,
    Json(request): Json<LaunchJobRequest>,
) -> ApiResult<Json<SampleJobView>> {
    let job = state.dispatcher.launch(request).await?;
    Ok(Json(view_of(&state, job).await?))
}

async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<SampleJobView>>> {
    let jobs = state.store.list_jobs().await.map_err(sg_core::AppError::from)?;
    let mut views = Vec::with_capacity(jobs.len());
    for job in jobs {
        views.push(view_of(&state, job).await?);
    }
    Ok(Json(views))
}

async fn get_job(State(state): State<AppState>, Path(id): Path<SampleJobId>) -> ApiResult<Json<SampleJobView>> {
    let job = state.store.get_job(id).await.map_err(sg_core::AppError::from)?;
    Ok(Json(view_of(&state, job).await?))
}

async fn stop_job(State(state): State<AppState>, Path(id): Path<SampleJobId>) -> ApiResult<Json<SampleJobView>> {
    let job = state.dispatcher.stop(id).await?;
    Ok(Json(view_of(&state, job).await?))
}

async fn resume_job(State(state): State<AppState>, Path(id): Path<SampleJobId>) -> ApiResult<Json<SampleJobView>> {
    let job = state.dispatcher.resume(id).await?;
    Ok(Json(view_of(&state, job).await?))
}

async fn delete_job(State(state): State<AppState>, Path(id): Path<SampleJobId>) -> ApiResult<()> {
    state.dispatcher.delete(id).await?;
    Ok(())
}

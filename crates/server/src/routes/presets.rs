// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/presets` and `/api/sample-presets` — thin pass-throughs to
//! `sg-storage`. Unexciting by design: the grid viewer's own UI state
//! (axis bindings, sliders) lives client-side; these just give it
//! somewhere durable to save a named configuration.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use sg_core::{NewPreset, NewSamplePreset, Preset, PresetId, PresetUpdate, SamplePreset, SamplePresetId};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/presets", get(list_presets).post(create_preset))
        .route("/api/presets/:id", get(get_preset).put(update_preset).delete(delete_preset))
        .route("/api/sample-presets", get(list_sample_presets).post(create_sample_preset))
        .route(
            "/api/sample-presets/:id",
            get(get_sample_preset).put(update_sample_preset).delete(delete_sample_preset),
        )
}

async fn list_presets(State(state): State<AppState>) -> ApiResult<Json<Vec<Preset>>> {
    Ok(Json(state.store.list_presets().await.map_err(sg_core::AppError::from)?))
}

async fn create_preset(State(state): State<AppState>, Json(new): Json<NewPreset>) -> ApiResult<Json<Preset>> {
    Ok(Json(state.store.create_preset(new).await.map_err(sg_core::AppError::from)?))
}

async fn get_preset(State(state): State<AppState>, Path(id): Path<PresetId>) -> ApiResult<Json<Preset>> {
    Ok(Json(state.store.get_preset(id).await.map_err(sg_core::AppError::from)?))
}

async fn update_preset(
    State(state): State<AppState>,
    Path(id): Path<PresetId>,
    Json(update): Json<PresetUpdate>,
) -> ApiResult<Json<Preset>> {
    Ok(Json(state.store.update_preset(id, update).await.map_err(sg_core::AppError::from)?))
}

async fn delete_preset(State(state): State<AppState>, Path(id): Path<PresetId>) -> ApiResult<()> {
    state.store.delete_preset(id).await.map_err(sg_core::AppError::from)?;
    Ok(())
}

async fn list_sample_presets(State(state): State<AppState>) -> ApiResult<Json<Vec<SamplePreset>>> {
    Ok(Json(state.store.list_sample_presets().await.map_err(sg_core::AppError::from)?))
}

async fn create_sample_preset(
    State(state): State<AppState>,
    Json(new): Json<NewSamplePreset>,
) -> ApiResult<Json<SamplePreset>> {
    Ok(Json(state.store.create_sample_preset(new).await.map_err(sg_core::AppError::from)?))
}

async fn get_sample_preset(
    State(state): State<AppState>,
    Path(id): Path<SamplePresetId>,
) -> ApiResult<Json<SamplePreset>> {
    Ok(Json(state.store.get_sample_preset(id).await.map_err(sg_core::AppError::from)?))
}

async fn update_sample_preset(
    State(state): State<AppState>,
    Path(id): Path<SamplePresetId>,
    Json(new): Json<NewSamplePreset>,
) -> ApiResult<Json<SamplePreset>> {
    Ok(Json(state.store.update_sample_preset(id, new).await.map_err(sg_core::AppError::from)?))
}

async fn delete_sample_preset(State(state): State<AppState>, Path(id): Path<SamplePresetId>) -> ApiResult<()> {
    state.store.delete_sample_preset(id).await.map_err(sg_core::AppError::from)?;
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin row<->domain mappers. Columns that hold nested structures are
//! stored as `*_json TEXT` and round-tripped through serde here, keeping
//! the domain types free of any SQL-specific derives.
//!
//! Mapper functions return `rusqlite::Result` rather than `StoreResult`
//! because they're handed straight to `query_row`/`query_map`, which fix
//! the closure's error type to `rusqlite::Error`; a JSON decode failure is
//! wrapped as a column conversion failure so it still surfaces through the
//! normal `?` chain in `store.rs`.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Error as SqlError, Result as SqlResult, Row};
use sg_core::{
    Preset, PresetId, PresetMapping, PromptEntry, SampleJob, SampleJobId, SampleJobItem,
    SampleJobItemId, SamplerSchedulerPair, SamplePreset, SamplePresetId,
};

fn column_error(index: usize, err: impl std::error::Error + Send + Sync + 'static) -> SqlError {
    SqlError::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn parse_timestamp(index: usize, raw: &str) -> SqlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| column_error(index, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(index: usize, raw: &str) -> SqlResult<T> {
    serde_json::from_str(raw).map_err(|e| column_error(index, e))
}

fn parse_enum<T: serde::de::DeserializeOwned>(index: usize, raw: &str) -> SqlResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|e| column_error(index, e))
}

pub fn preset_from_row(row: &Row<'_>) -> SqlResult<Preset> {
    let mapping_json: String = row.get("mapping_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(Preset {
        id: PresetId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        mapping: parse_json::<PresetMapping>(0, &mapping_json)?,
        created_at: parse_timestamp(0, &created_at)?,
        updated_at: parse_timestamp(0, &updated_at)?,
    })
}

pub fn sample_preset_from_row(row: &Row<'_>) -> SqlResult<SamplePreset> {
    let prompts_json: String = row.get("prompts_json")?;
    let steps_json: String = row.get("steps_json")?;
    let cfgs_json: String = row.get("cfgs_json")?;
    let pairs_json: String = row.get("sampler_scheduler_pairs_json")?;
    let seeds_json: String = row.get("seeds_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(SamplePreset {
        id: SamplePresetId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        prompts: parse_json::<Vec<PromptEntry>>(0, &prompts_json)?,
        negative_prompt: row.get("negative_prompt")?,
        steps: parse_json::<Vec<u32>>(0, &steps_json)?,
        cfgs: parse_json::<Vec<f64>>(0, &cfgs_json)?,
        sampler_scheduler_pairs: parse_json::<Vec<SamplerSchedulerPair>>(0, &pairs_json)?,
        seeds: parse_json::<Vec<i64>>(0, &seeds_json)?,
        width: row.get("width")?,
        height: row.get("height")?,
        created_at: parse_timestamp(0, &created_at)?,
        updated_at: parse_timestamp(0, &updated_at)?,
    })
}

pub fn sample_job_from_row(row: &Row<'_>) -> SqlResult<SampleJob> {
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(SampleJob {
        id: SampleJobId::from_string(row.get::<_, String>("id")?),
        training_run_name: row.get("training_run_name")?,
        sample_preset_id: SamplePresetId::from_string(row.get::<_, String>("sample_preset_id")?),
        workflow_name: row.get("workflow_name")?,
        vae: row.get("vae")?,
        clip: row.get("clip")?,
        shift: row.get("shift")?,
        status: parse_enum(0, &status)?,
        total_items: row.get("total_items")?,
        completed_items: row.get("completed_items")?,
        error_message: row.get("error_message")?,
        created_at: parse_timestamp(0, &created_at)?,
        updated_at: parse_timestamp(0, &updated_at)?,
    })
}

pub fn sample_job_item_from_row(row: &Row<'_>) -> SqlResult<SampleJobItem> {
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(SampleJobItem {
        id: SampleJobItemId::from_string(row.get::<_, String>("id")?),
        job_id: SampleJobId::from_string(row.get::<_, String>("job_id")?),
        checkpoint_filename: row.get("checkpoint_filename")?,
        comfy_ui_model_path: row.get("comfy_ui_model_path")?,
        prompt_name: row.get("prompt_name")?,
        prompt_text: row.get("prompt_text")?,
        steps: row.get("steps")?,
        cfg: row.get("cfg")?,
        sampler_name: row.get("sampler_name")?,
        scheduler: row.get("scheduler")?,
        seed: row.get("seed")?,
        width: row.get("width")?,
        height: row.get("height")?,
        status: parse_enum(0, &status)?,
        comfy_ui_prompt_id: row.get("comfy_ui_prompt_id")?,
        output_path: row.get("output_path")?,
        error_message: row.get("error_message")?,
        duration_ms: row.get("duration_ms")?,
        created_at: parse_timestamp(0, &created_at)?,
        updated_at: parse_timestamp(0, &updated_at)?,
    })
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async facade over a blocking SQLite connection. Every public method
//! hands its SQL work to `spawn_blocking`; nothing here ever holds the
//! connection mutex across an `.await`.

use crate::entities;
use crate::error::{StoreError, StoreResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sg_core::{
    NewPreset, NewSamplePreset, Preset, PresetId, PresetUpdate, SampleJob, SampleJobId,
    SampleJobItem, SampleJobItemId, SampleJobItemStatus, SampleJobStatus, SamplePreset,
    SamplePresetId,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

/// Runs `f` against the shared connection on a blocking thread, mapping a
/// panicked or cancelled task to `StoreError::TaskJoin`.
async fn with_conn<F, T>(conn: Arc<Mutex<Connection>>, f: F) -> StoreResult<T>
where
    F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        #[allow(clippy::unwrap_used)]
        let guard = conn.lock().unwrap();
        f(&guard)
    })
    .await
    .map_err(|e| StoreError::TaskJoin(e.to_string()))?
}

impl Store {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = crate::connection::open(path)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = crate::connection::open_in_memory()?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Drops every row from every table. Test-only: production callers have
    /// no legitimate reason to wipe the database wholesale.
    #[cfg(feature = "test-support")]
    pub async fn reset_for_test(&self) -> StoreResult<()> {
        with_conn(self.conn.clone(), |conn| {
            conn.execute_batch(
                "DELETE FROM sample_job_items; DELETE FROM sample_jobs; \
                 DELETE FROM sample_presets; DELETE FROM presets;",
            )?;
            Ok(())
        })
        .await
    }

    // --- presets ---------------------------------------------------

    pub async fn create_preset(&self, new: NewPreset) -> StoreResult<Preset> {
        with_conn(self.conn.clone(), move |conn| {
            let id = PresetId::new();
            let now = Utc::now();
            let mapping_json = serde_json::to_string(&new.mapping)?;
            conn.execute(
                "INSERT INTO presets (id, name, mapping_json, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id.as_str(), new.name, mapping_json, now.to_rfc3339()],
            )?;
            fetch_preset(conn, id.as_str())
        })
        .await
    }

    pub async fn get_preset(&self, id: PresetId) -> StoreResult<Preset> {
        with_conn(self.conn.clone(), move |conn| fetch_preset(conn, id.as_str())).await
    }

    pub async fn list_presets(&self) -> StoreResult<Vec<Preset>> {
        with_conn(self.conn.clone(), |conn| {
            let mut stmt = conn.prepare("SELECT * FROM presets ORDER BY created_at ASC")?;
            let rows = stmt.query_map([], entities::preset_from_row)?.collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    pub async fn update_preset(&self, id: PresetId, update: PresetUpdate) -> StoreResult<Preset> {
        with_conn(self.conn.clone(), move |conn| {
            let existing = fetch_preset(conn, id.as_str())?;
            let name = update.name.unwrap_or(existing.name);
            let mapping = update.mapping.unwrap_or(existing.mapping);
            let mapping_json = serde_json::to_string(&mapping)?;
            conn.execute(
                "UPDATE presets SET name = ?1, mapping_json = ?2, updated_at = ?3 WHERE id = ?4",
                params![name, mapping_json, Utc::now().to_rfc3339(), id.as_str()],
            )?;
            fetch_preset(conn, id.as_str())
        })
        .await
    }

    pub async fn delete_preset(&self, id: PresetId) -> StoreResult<()> {
        with_conn(self.conn.clone(), move |conn| {
            let affected = conn.execute("DELETE FROM presets WHERE id = ?1", params![id.as_str()])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("preset {id}")));
            }
            Ok(())
        })
        .await
    }

    // --- sample presets ----------------------------------------------

    pub async fn create_sample_preset(&self, new: NewSamplePreset) -> StoreResult<SamplePreset> {
        with_conn(self.conn.clone(), move |conn| {
            let id = SamplePresetId::new();
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO sample_presets (
                    id, name, prompts_json, negative_prompt, steps_json, cfgs_json,
                    sampler_scheduler_pairs_json, seeds_json, width, height, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    id.as_str(),
                    new.name,
                    serde_json::to_string(&new.prompts)?,
                    new.negative_prompt,
                    serde_json::to_string(&new.steps)?,
                    serde_json::to_string(&new.cfgs)?,
                    serde_json::to_string(&new.sampler_scheduler_pairs)?,
                    serde_json::to_string(&new.seeds)?,
                    new.width,
                    new.height,
                    now,
                ],
            )?;
            fetch_sample_preset(conn, id.as_str())
        })
        .await
    }

    pub async fn get_sample_preset(&self, id: SamplePresetId) -> StoreResult<SamplePreset> {
        with_conn(self.conn.clone(), move |conn| fetch_sample_preset(conn, id.as_str())).await
    }

    /// Full replace (PUT semantics): every field is overwritten from
    /// `new`, unlike `update_preset`'s partial-field `PresetUpdate`.
    pub async fn update_sample_preset(
        &self,
        id: SamplePresetId,
        new: NewSamplePreset,
    ) -> StoreResult<SamplePreset> {
        with_conn(self.conn.clone(), move |conn| {
            let affected = conn.execute(
                "UPDATE sample_presets SET
                    name = ?1, prompts_json = ?2, negative_prompt = ?3, steps_json = ?4,
                    cfgs_json = ?5, sampler_scheduler_pairs_json = ?6, seeds_json = ?7,
                    width = ?8, height = ?9, updated_at = ?10
                 WHERE id = ?11",
                params![
                    new.name,
                    serde_json::to_string(&new.prompts)?,
                    new.negative_prompt,
                    serde_json::to_string(&new.steps)?,
                    serde_json::to_string(&new.cfgs)?,
                    serde_json::to_string(&new.sampler_scheduler_pairs)?,
                    serde_json::to_string(&new.seeds)?,
                    new.width,
                    new.height,
                    Utc::now().to_rfc3339(),
                    id.as_str(),
                ],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("sample preset {id}")));
            }
            fetch_sample_preset(conn, id.as_str())
        })
        .await
    }

    pub async fn list_sample_presets(&self) -> StoreResult<Vec<SamplePreset>> {
        with_conn(self.conn.clone(), |conn| {
            let mut stmt = conn.prepare("SELECT * FROM sample_presets ORDER BY created_at ASC")?;
            let rows = stmt
                .query_map([], entities::sample_preset_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    pub async fn delete_sample_preset(&self, id: SamplePresetId) -> StoreResult<()> {
        with_conn(self.conn.clone(), move |conn| {
            let affected =
                conn.execute("DELETE FROM sample_presets WHERE id = ?1", params![id.as_str()])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("sample preset {id}")));
            }
            Ok(())
        })
        .await
    }

    // --- sample jobs ---------------------------------------------------

    /// Whether any job currently has status `running`. Callers use this to
    /// enforce the single-running-job invariant before launching a new one.
    pub async fn has_running_job(&self) -> StoreResult<bool> {
        with_conn(self.conn.clone(), |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sample_jobs WHERE status = 'running'",
                [],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    pub async fn insert_job(&self, job: SampleJob, workflow: serde_json::Value) -> StoreResult<SampleJob> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "INSERT INTO sample_jobs (
                    id, training_run_name, sample_preset_id, workflow_name, workflow_json,
                    vae, clip, shift, status, total_items, completed_items, error_message,
                    created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                params![
                    job.id.as_str(),
                    job.training_run_name,
                    job.sample_preset_id.as_str(),
                    job.workflow_name,
                    serde_json::to_string(&workflow)?,
                    job.vae,
                    job.clip,
                    job.shift,
                    job.status.to_string(),
                    job.total_items,
                    job.completed_items,
                    job.error_message,
                    job.created_at.to_rfc3339(),
                ],
            )?;
            fetch_job(conn, job.id.as_str())
        })
        .await
    }

    pub async fn get_job(&self, id: SampleJobId) -> StoreResult<SampleJob> {
        with_conn(self.conn.clone(), move |conn| fetch_job(conn, id.as_str())).await
    }

    /// The workflow graph template a job was launched with. Kept separate
    /// from `SampleJob` since nothing but the dispatcher's submission path
    /// needs it.
    pub async fn get_job_workflow(&self, id: SampleJobId) -> StoreResult<serde_json::Value> {
        with_conn(self.conn.clone(), move |conn| {
            let raw: String = conn
                .query_row(
                    "SELECT workflow_json FROM sample_jobs WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("sample job {id}")))?;
            Ok(serde_json::from_str(&raw)?)
        })
        .await
    }

    pub async fn list_jobs(&self) -> StoreResult<Vec<SampleJob>> {
        with_conn(self.conn.clone(), |conn| {
            let mut stmt = conn.prepare("SELECT * FROM sample_jobs ORDER BY created_at ASC")?;
            let rows =
                stmt.query_map([], entities::sample_job_from_row)?.collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    /// The oldest job in status `pending` or `stopped`, if any.
    pub async fn next_dispatchable_job(&self) -> StoreResult<Option<SampleJob>> {
        with_conn(self.conn.clone(), |conn| {
            let id: Option<String> = conn
                .query_row(
                    "SELECT id FROM sample_jobs WHERE status IN ('pending', 'stopped') \
                     ORDER BY created_at ASC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            id.map(|id| fetch_job(conn, &id)).transpose()
        })
        .await
    }

    pub async fn set_job_status(
        &self,
        id: SampleJobId,
        status: SampleJobStatus,
        error_message: Option<String>,
    ) -> StoreResult<SampleJob> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "UPDATE sample_jobs SET status = ?1, error_message = ?2, updated_at = ?3 WHERE id = ?4",
                params![status.to_string(), error_message, Utc::now().to_rfc3339(), id.as_str()],
            )?;
            fetch_job(conn, id.as_str())
        })
        .await
    }

    pub async fn increment_job_completed(&self, id: SampleJobId) -> StoreResult<SampleJob> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "UPDATE sample_jobs SET completed_items = completed_items + 1, updated_at = ?1 \
                 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), id.as_str()],
            )?;
            fetch_job(conn, id.as_str())
        })
        .await
    }

    pub async fn delete_job(&self, id: SampleJobId) -> StoreResult<()> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute("DELETE FROM sample_job_items WHERE job_id = ?1", params![id.as_str()])?;
            let affected = conn.execute("DELETE FROM sample_jobs WHERE id = ?1", params![id.as_str()])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("sample job {id}")));
            }
            Ok(())
        })
        .await
    }

    // --- sample job items ------------------------------------------

    pub async fn insert_job_items(&self, items: Vec<SampleJobItem>) -> StoreResult<()> {
        with_conn(self.conn.clone(), move |conn| {
            for item in &items {
                conn.execute(
                    "INSERT INTO sample_job_items (
                        id, job_id, checkpoint_filename, comfy_ui_model_path, prompt_name,
                        prompt_text, steps, cfg, sampler_name, scheduler, seed, width, height,
                        status, comfy_ui_prompt_id, output_path, error_message, duration_ms,
                        created_at, updated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)",
                    params![
                        item.id.as_str(),
                        item.job_id.as_str(),
                        item.checkpoint_filename,
                        item.comfy_ui_model_path,
                        item.prompt_name,
                        item.prompt_text,
                        item.steps,
                        item.cfg,
                        item.sampler_name,
                        item.scheduler,
                        item.seed,
                        item.width,
                        item.height,
                        item.status.to_string(),
                        item.comfy_ui_prompt_id,
                        item.output_path,
                        item.error_message,
                        item.duration_ms,
                        item.created_at.to_rfc3339(),
                    ],
                )?;
            }
            Ok(())
        })
        .await
    }

    pub async fn list_job_items(&self, job_id: SampleJobId) -> StoreResult<Vec<SampleJobItem>> {
        with_conn(self.conn.clone(), move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM sample_job_items WHERE job_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map(params![job_id.as_str()], entities::sample_job_item_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    /// The oldest pending item for a job, if any (dispatcher work loop).
    pub async fn next_pending_item(&self, job_id: SampleJobId) -> StoreResult<Option<SampleJobItem>> {
        with_conn(self.conn.clone(), move |conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM sample_job_items WHERE job_id = ?1 AND status = 'pending' \
                     ORDER BY created_at ASC LIMIT 1",
                    params![job_id.as_str()],
                    entities::sample_job_item_from_row,
                )
                .optional()?)
        })
        .await
    }

    pub async fn mark_item_running(&self, id: SampleJobItemId, prompt_id: String) -> StoreResult<SampleJobItem> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "UPDATE sample_job_items SET status = ?1, comfy_ui_prompt_id = ?2, updated_at = ?3 \
                 WHERE id = ?4",
                params![
                    SampleJobItemStatus::Running.to_string(),
                    prompt_id,
                    Utc::now().to_rfc3339(),
                    id.as_str(),
                ],
            )?;
            fetch_item(conn, id.as_str())
        })
        .await
    }

    pub async fn mark_item_completed(
        &self,
        id: SampleJobItemId,
        output_path: String,
        duration_ms: i64,
    ) -> StoreResult<SampleJobItem> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "UPDATE sample_job_items SET status = ?1, output_path = ?2, duration_ms = ?3, \
                 updated_at = ?4 WHERE id = ?5",
                params![
                    SampleJobItemStatus::Completed.to_string(),
                    output_path,
                    duration_ms,
                    Utc::now().to_rfc3339(),
                    id.as_str(),
                ],
            )?;
            fetch_item(conn, id.as_str())
        })
        .await
    }

    /// Puts a running item back to pending with its prompt id cleared —
    /// used when a submission is interrupted (stop command, watchdog
    /// timeout with a retryable cause) rather than failed outright.
    pub async fn reset_item_to_pending(&self, id: SampleJobItemId) -> StoreResult<SampleJobItem> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "UPDATE sample_job_items SET status = ?1, comfy_ui_prompt_id = NULL, updated_at = ?2 \
                 WHERE id = ?3",
                params![SampleJobItemStatus::Pending.to_string(), Utc::now().to_rfc3339(), id.as_str()],
            )?;
            fetch_item(conn, id.as_str())
        })
        .await
    }

    pub async fn mark_item_failed(&self, id: SampleJobItemId, error_message: String) -> StoreResult<SampleJobItem> {
        with_conn(self.conn.clone(), move |conn| {
            conn.execute(
                "UPDATE sample_job_items SET status = ?1, error_message = ?2, updated_at = ?3 \
                 WHERE id = ?4",
                params![
                    SampleJobItemStatus::Failed.to_string(),
                    error_message,
                    Utc::now().to_rfc3339(),
                    id.as_str(),
                ],
            )?;
            fetch_item(conn, id.as_str())
        })
        .await
    }
}

fn fetch_preset(conn: &Connection, id: &str) -> StoreResult<Preset> {
    conn.query_row("SELECT * FROM presets WHERE id = ?1", params![id], entities::preset_from_row)
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("preset {id}")))
}

fn fetch_sample_preset(conn: &Connection, id: &str) -> StoreResult<SamplePreset> {
    conn.query_row(
        "SELECT * FROM sample_presets WHERE id = ?1",
        params![id],
        entities::sample_preset_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("sample preset {id}")))
}

fn fetch_job(conn: &Connection, id: &str) -> StoreResult<SampleJob> {
    conn.query_row("SELECT * FROM sample_jobs WHERE id = ?1", params![id], entities::sample_job_from_row)
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("sample job {id}")))
}

fn fetch_item(conn: &Connection, id: &str) -> StoreResult<SampleJobItem> {
    conn.query_row(
        "SELECT * FROM sample_job_items WHERE id = ?1",
        params![id],
        entities::sample_job_item_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("sample job item {id}")))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

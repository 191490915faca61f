// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State reconciliation after a restart: a job left `running` when the
//! process died has an item left `running` with no dispatcher task alive
//! to ever resolve it. Reset that item to `pending` and the job to
//! `stopped` so the user's explicit `resume` is what restarts it, rather
//! than the dispatcher silently picking up an item whose render-service
//! prompt may or may not still be in flight.

use sg_core::{SampleJobItemStatus, SampleJobStatus};
use sg_storage::Store;

pub async fn recover_interrupted_jobs(store: &Store) -> sg_storage::StoreResult<()> {
    let jobs = store.list_jobs().await?;
    for job in jobs.into_iter().filter(|job| job.status == SampleJobStatus::Running) {
        let items = store.list_job_items(job.id.clone()).await?;
        for item in items.into_iter().filter(|item| item.status == SampleJobItemStatus::Running) {
            tracing::warn!(job_id = %job.id, item_id = %item.id, "resetting item left running across restart");
            store.reset_item_to_pending(item.id).await?;
        }
        store.set_job_status(job.id.clone(), SampleJobStatus::Stopped, None).await?;
        tracing::info!(job_id = %job.id, "job left running across restart, marked stopped");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{NewSamplePreset, PromptEntry, SamplerSchedulerPair};

    async fn seeded_preset(store: &Store) -> sg_core::SamplePreset {
        store
            .create_sample_preset(NewSamplePreset {
                name: "grid".into(),
                prompts: vec![PromptEntry { name: "a".into(), text: "A cat".into() }],
                negative_prompt: "blurry".into(),
                steps: vec![20],
                cfgs: vec![5.0],
                sampler_scheduler_pairs: vec![SamplerSchedulerPair {
                    sampler: "euler".into(),
                    scheduler: "normal".into(),
                }],
                seeds: vec![1],
                width: 512,
                height: 512,
            })
            .await
            .expect("create preset")
    }

    #[tokio::test]
    async fn resets_running_job_and_its_running_item_to_stopped_and_pending() {
        let store = Store::open_in_memory().expect("open");
        let preset = seeded_preset(&store).await;
        let job_id = sg_core::SampleJobId::new();
        let job = sg_core::SampleJob {
            id: job_id.clone(),
            training_run_name: "run-1".into(),
            sample_preset_id: preset.id,
            workflow_name: "basic".into(),
            vae: None,
            clip: None,
            shift: None,
            status: SampleJobStatus::Running,
            total_items: 1,
            completed_items: 0,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        store.insert_job(job, serde_json::json!({})).await.expect("insert job");

        let item = sg_core::SampleJobItem {
            id: sg_core::SampleJobItemId::new(),
            job_id: job_id.clone(),
            checkpoint_filename: "m.safetensors".into(),
            comfy_ui_model_path: "m.safetensors".into(),
            prompt_name: "a".into(),
            prompt_text: "A cat".into(),
            steps: 20,
            cfg: 5.0,
            sampler_name: "euler".into(),
            scheduler: "normal".into(),
            seed: 1,
            width: 512,
            height: 512,
            status: SampleJobItemStatus::Pending,
            comfy_ui_prompt_id: None,
            output_path: None,
            error_message: None,
            duration_ms: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let item_id = item.id.clone();
        store.insert_job_items(vec![item]).await.expect("insert items");
        store.mark_item_running(item_id.clone(), "prompt-1".into()).await.expect("mark running");

        recover_interrupted_jobs(&store).await.expect("recover");

        let job = store.get_job(job_id.clone()).await.expect("get job");
        assert_eq!(job.status, SampleJobStatus::Stopped);
        let items = store.list_job_items(job_id).await.expect("list items");
        assert_eq!(items[0].status, SampleJobItemStatus::Pending);
        assert_eq!(items[0].comfy_ui_prompt_id, None);
    }

    #[tokio::test]
    async fn leaves_non_running_jobs_untouched() {
        let store = Store::open_in_memory().expect("open");
        let preset = seeded_preset(&store).await;
        let job_id = sg_core::SampleJobId::new();
        let job = sg_core::SampleJob {
            id: job_id.clone(),
            training_run_name: "run-1".into(),
            sample_preset_id: preset.id,
            workflow_name: "basic".into(),
            vae: None,
            clip: None,
            shift: None,
            status: SampleJobStatus::Completed,
            total_items: 0,
            completed_items: 0,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        store.insert_job(job, serde_json::json!({})).await.expect("insert job");

        recover_interrupted_jobs(&store).await.expect("recover");

        let job = store.get_job(job_id).await.expect("get job");
        assert_eq!(job.status, SampleJobStatus::Completed);
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sg_core::{NewPreset, NewSamplePreset, PresetMapping, PromptEntry, SamplerSchedulerPair};

fn sample_preset_payload() -> NewSamplePreset {
    NewSamplePreset {
        name: "grid".into(),
        prompts: vec![PromptEntry { name: "a".into(), text: "A cat".into() }],
        negative_prompt: "blurry".into(),
        steps: vec![20, 30],
        cfgs: vec![5.0, 7.0],
        sampler_scheduler_pairs: vec![SamplerSchedulerPair {
            sampler: "euler".into(),
            scheduler: "normal".into(),
        }],
        seeds: vec![1],
        width: 512,
        height: 512,
    }
}

#[tokio::test]
async fn create_and_get_preset_round_trips() {
    let store = Store::open_in_memory().expect("open");
    let created = store
        .create_preset(NewPreset {
            name: "default".into(),
            mapping: PresetMapping { x: Some("steps".into()), ..Default::default() },
        })
        .await
        .expect("create");

    let fetched = store.get_preset(created.id).await.expect("get");
    assert_eq!(fetched.name, "default");
    assert_eq!(fetched.mapping.x.as_deref(), Some("steps"));
}

#[tokio::test]
async fn get_missing_preset_is_not_found() {
    let store = Store::open_in_memory().expect("open");
    let err = store.get_preset(sg_core::PresetId::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn delete_preset_removes_row() {
    let store = Store::open_in_memory().expect("open");
    let created = store
        .create_preset(NewPreset { name: "p".into(), mapping: PresetMapping::default() })
        .await
        .expect("create");
    store.delete_preset(created.id.clone()).await.expect("delete");
    assert!(store.get_preset(created.id).await.is_err());
}

#[tokio::test]
async fn sample_preset_lists_in_creation_order() {
    let store = Store::open_in_memory().expect("open");
    let first = store.create_sample_preset(sample_preset_payload()).await.expect("create first");
    let mut second_payload = sample_preset_payload();
    second_payload.name = "second".into();
    let second = store.create_sample_preset(second_payload).await.expect("create second");

    let listed = store.list_sample_presets().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
}

#[tokio::test]
async fn update_sample_preset_replaces_every_field() {
    let store = Store::open_in_memory().expect("open");
    let created = store.create_sample_preset(sample_preset_payload()).await.expect("create");

    let mut replacement = sample_preset_payload();
    replacement.name = "replaced".into();
    replacement.seeds = vec![9, 10];
    let updated = store.update_sample_preset(created.id.clone(), replacement).await.expect("update");
    assert_eq!(updated.name, "replaced");
    assert_eq!(updated.seeds, vec![9, 10]);

    let fetched = store.get_sample_preset(created.id).await.expect("get");
    assert_eq!(fetched.name, "replaced");
}

#[tokio::test]
async fn update_sample_preset_missing_id_is_not_found() {
    let store = Store::open_in_memory().expect("open");
    let err = store
        .update_sample_preset(sg_core::SamplePresetId::new(), sample_preset_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn job_lifecycle_tracks_status_and_items() {
    let store = Store::open_in_memory().expect("open");
    let preset = store.create_sample_preset(sample_preset_payload()).await.expect("create preset");

    let job = sg_core::SampleJob {
        id: sg_core::SampleJobId::new(),
        training_run_name: "run-1".into(),
        sample_preset_id: preset.id,
        workflow_name: "basic".into(),
        vae: None,
        clip: None,
        shift: None,
        status: sg_core::SampleJobStatus::Pending,
        total_items: 1,
        completed_items: 0,
        error_message: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let job_id = job.id.clone();
    let inserted = store.insert_job(job.clone(), serde_json::json!({})).await.expect("insert job");
    assert_eq!(inserted.status, sg_core::SampleJobStatus::Pending);

    let dispatchable = store.next_dispatchable_job().await.expect("query").expect("one job");
    assert_eq!(dispatchable.id, job_id);

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
        status: sg_core::SampleJobItemStatus::Pending,
        comfy_ui_prompt_id: None,
        output_path: None,
        error_message: None,
        duration_ms: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let item_id = item.id.clone();
    store.insert_job_items(vec![item.clone()]).await.expect("insert items");

    let pending = store.next_pending_item(job_id.clone()).await.expect("query").expect("one item");
    assert_eq!(pending.id, item_id);

    store.mark_item_running(item_id.clone(), "prompt-1".into()).await.expect("mark running");
    let completed = store
        .mark_item_completed(item_id.clone(), "out/a.png".into(), 1200)
        .await
        .expect("mark completed");
    assert_eq!(completed.output_path.as_deref(), Some("out/a.png"));
    assert_eq!(completed.duration_ms, Some(1200));

    assert!(store.next_pending_item(job_id.clone()).await.expect("query").is_none());

    let bumped = store.increment_job_completed(job_id.clone()).await.expect("increment");
    assert_eq!(bumped.completed_items, 1);

    let finished = store
        .set_job_status(job_id.clone(), sg_core::SampleJobStatus::Completed, None)
        .await
        .expect("set status");
    assert_eq!(finished.status, sg_core::SampleJobStatus::Completed);
    assert!(store.next_dispatchable_job().await.expect("query").is_none());
}

#[tokio::test]
async fn has_running_job_reflects_job_status() {
    let store = Store::open_in_memory().expect("open");
    let preset = store.create_sample_preset(sample_preset_payload()).await.expect("create preset");
    let job = sg_core::SampleJob {
        id: sg_core::SampleJobId::new(),
        training_run_name: "run-1".into(),
        sample_preset_id: preset.id,
        workflow_name: "basic".into(),
        vae: None,
        clip: None,
        shift: None,
        status: sg_core::SampleJobStatus::Pending,
        total_items: 1,
        completed_items: 0,
        error_message: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let job_id = job.id.clone();
    store.insert_job(job, serde_json::json!({})).await.expect("insert job");
    assert!(!store.has_running_job().await.expect("query"));

    store.set_job_status(job_id, sg_core::SampleJobStatus::Running, None).await.expect("set status");
    assert!(store.has_running_job().await.expect("query"));
}

#[tokio::test]
async fn delete_job_cascades_to_items() {
    let store = Store::open_in_memory().expect("open");
    let preset = store.create_sample_preset(sample_preset_payload()).await.expect("create preset");
    let job_id = sg_core::SampleJobId::new();
    let job = sg_core::SampleJob {
        id: job_id.clone(),
        training_run_name: "run-1".into(),
        sample_preset_id: preset.id,
        workflow_name: "basic".into(),
        vae: None,
        clip: None,
        shift: None,
        status: sg_core::SampleJobStatus::Pending,
        total_items: 1,
        completed_items: 0,
        error_message: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    store.insert_job(job, serde_json::json!({})).await.expect("insert job");

    store.delete_job(job_id.clone()).await.expect("delete");
    assert!(store.get_job(job_id).await.is_err());
}

#[tokio::test]
async fn get_job_workflow_round_trips_the_submitted_graph() {
    let store = Store::open_in_memory().expect("open");
    let preset = store.create_sample_preset(sample_preset_payload()).await.expect("create preset");
    let job_id = sg_core::SampleJobId::new();
    let job = sg_core::SampleJob {
        id: job_id.clone(),
        training_run_name: "run-1".into(),
        sample_preset_id: preset.id,
        workflow_name: "basic".into(),
        vae: None,
        clip: None,
        shift: None,
        status: sg_core::SampleJobStatus::Pending,
        total_items: 0,
        completed_items: 0,
        error_message: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let workflow = serde_json::json!({"3": {"inputs": {"seed": "${seed}"}}});
    store.insert_job(job, workflow.clone()).await.expect("insert job");

    let fetched = store.get_job_workflow(job_id).await.expect("get workflow");
    assert_eq!(fetched, workflow);
}

#[tokio::test]
async fn reset_item_to_pending_clears_prompt_id() {
    let store = Store::open_in_memory().expect("open");
    let preset = store.create_sample_preset(sample_preset_payload()).await.expect("create preset");
    let job_id = sg_core::SampleJobId::new();
    let job = sg_core::SampleJob {
        id: job_id.clone(),
        training_run_name: "run-1".into(),
        sample_preset_id: preset.id,
        workflow_name: "basic".into(),
        vae: None,
        clip: None,
        shift: None,
        status: sg_core::SampleJobStatus::Running,
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
        status: sg_core::SampleJobItemStatus::Pending,
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

    let reset = store.reset_item_to_pending(item_id).await.expect("reset");
    assert_eq!(reset.status, sg_core::SampleJobItemStatus::Pending);
    assert_eq!(reset.comfy_ui_prompt_id, None);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn item(status: SampleJobItemStatus, prompt_id: Option<&str>) -> SampleJobItem {
    SampleJobItem {
        id: SampleJobItemId::new(),
        job_id: SampleJobId::new(),
        checkpoint_filename: "m.safetensors".into(),
        comfy_ui_model_path: "m.safetensors".into(),
        prompt_name: "a".into(),
        prompt_text: "A cat".into(),
        steps: 20,
        cfg: 7.0,
        sampler_name: "euler".into(),
        scheduler: "normal".into(),
        seed: 42,
        width: 512,
        height: 512,
        status,
        comfy_ui_prompt_id: prompt_id.map(str::to_string),
        output_path: None,
        error_message: None,
        duration_ms: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pending_item_needs_no_prompt_id() {
    assert!(item(SampleJobItemStatus::Pending, None).prompt_id_invariant_holds());
}

#[test]
fn running_item_without_prompt_id_violates_invariant() {
    assert!(!item(SampleJobItemStatus::Running, None).prompt_id_invariant_holds());
}

#[test]
fn completed_item_with_prompt_id_holds() {
    assert!(item(SampleJobItemStatus::Completed, Some("abc")).prompt_id_invariant_holds());
}
// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sg_core::{PromptEntry, SamplerSchedulerPair};

fn preset() -> SamplePreset {
    SamplePreset {
        id: sg_core::SamplePresetId::new(),
        name: "grid".into(),
        prompts: vec![
            PromptEntry { name: "a".into(), text: "A cat".into() },
            PromptEntry { name: "b".into(), text: "A dog".into() },
        ],
        negative_prompt: "blurry".into(),
        steps: vec![20, 30],
        cfgs: vec![5.0],
        sampler_scheduler_pairs: vec![SamplerSchedulerPair {
            sampler: "euler".into(),
            scheduler: "normal".into(),
        }],
        seeds: vec![1, 2],
        width: 512,
        height: 512,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn expands_full_cartesian_product_per_checkpoint() {
    let preset = preset();
    let checkpoints = vec!["m1.safetensors".to_string(), "m2.safetensors".to_string()];
    let items = expand_job_items(SampleJobId::new(), &preset, &checkpoints);

    // 2 checkpoints * 2 prompts * 2 steps * 1 cfg * 1 pair * 2 seeds = 16
    assert_eq!(items.len(), 16);
    assert_eq!(compute_total_items(&preset, &checkpoints), 16);
    assert!(items.iter().all(|i| i.status == SampleJobItemStatus::Pending));
}

#[test]
fn every_item_carries_the_owning_job_id() {
    let job_id = SampleJobId::new();
    let items = expand_job_items(job_id.clone(), &preset(), &["m.safetensors".to_string()]);
    assert!(items.iter().all(|i| i.job_id == job_id));
}

#[test]
fn substitutes_known_placeholder_and_leaves_unknown_untouched() {
    let item = &expand_job_items(SampleJobId::new(), &preset(), &["m.safetensors".to_string()])[0];
    let fields = item_fields(item, "blurry");
    let workflow = serde_json::json!({
        "checkpoint": "${checkpoint}",
        "seed": "${seed}",
        "unknown": "${not_a_field}",
        "literal": "plain string",
        "nested": { "prompt": "${prompt}" }
    });

    let substituted = substitute_workflow(&workflow, &fields);
    assert_eq!(substituted["checkpoint"], "m.safetensors");
    assert_eq!(substituted["seed"], item.seed.to_string());
    assert_eq!(substituted["unknown"], "${not_a_field}");
    assert_eq!(substituted["literal"], "plain string");
    assert_eq!(substituted["nested"]["prompt"], item.prompt_text);
}

#[test]
fn substitution_only_matches_whole_string_not_embedded_tokens() {
    let mut fields = HashMap::new();
    fields.insert("seed".to_string(), "42".to_string());
    let workflow = serde_json::json!("value is ${seed} here");
    assert_eq!(substitute_workflow(&workflow, &fields), serde_json::json!("value is ${seed} here"));
}

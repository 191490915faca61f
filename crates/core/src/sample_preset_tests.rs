// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn minimal() -> SamplePreset {
    SamplePreset {
        id: SamplePresetId::new(),
        name: "test".into(),
        prompts: vec![PromptEntry { name: "a".into(), text: "A cat".into() }],
        negative_prompt: String::new(),
        steps: vec![20],
        cfgs: vec![7.0],
        sampler_scheduler_pairs: vec![SamplerSchedulerPair {
            sampler: "euler".into(),
            scheduler: "normal".into(),
        }],
        seeds: vec![42],
        width: 512,
        height: 512,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn axis_cardinality_multiplies_every_axis() {
    let mut preset = minimal();
    preset.steps = vec![10, 20];
    preset.seeds = vec![1, 2, 3];
    assert_eq!(preset.axis_cardinality(), 1 * 2 * 1 * 1 * 3);
}

#[test]
fn validate_rejects_empty_lists() {
    let mut preset = minimal();
    preset.seeds.clear();
    assert!(preset.validate().is_err());
}

#[test]
fn validate_rejects_zero_size() {
    let mut preset = minimal();
    preset.width = 0;
    assert!(preset.validate().is_err());
}

#[test]
fn validate_accepts_minimal_preset() {
    assert!(minimal().validate().is_ok());
}
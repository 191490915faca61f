// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expands a sample preset against a set of checkpoints into the flat
//! Cartesian product of [`SampleJobItem`] rows the dispatcher will work
//! through, and substitutes per-item values into a workflow graph.

use chrono::Utc;
use sg_core::{SampleJobId, SampleJobItem, SampleJobItemId, SampleJobItemStatus, SamplePreset};
use std::collections::HashMap;

/// Build one [`SampleJobItem`] per point of the Cartesian product over
/// checkpoints x prompts x steps x cfgs x sampler/scheduler pairs x seeds.
pub fn expand_job_items(job_id: SampleJobId, preset: &SamplePreset, checkpoints: &[String]) -> Vec<SampleJobItem> {
    let mut items = Vec::with_capacity(checkpoints.len() * preset.axis_cardinality());

    for checkpoint in checkpoints {
        for prompt in &preset.prompts {
            for &steps in &preset.steps {
                for &cfg in &preset.cfgs {
                    for pair in &preset.sampler_scheduler_pairs {
                        for &seed in &preset.seeds {
                            let now = Utc::now();
                            items.push(SampleJobItem {
                                id: SampleJobItemId::new(),
                                job_id: job_id.clone(),
                                checkpoint_filename: checkpoint.clone(),
                                comfy_ui_model_path: checkpoint.clone(),
                                prompt_name: prompt.name.clone(),
                                prompt_text: prompt.text.clone(),
                                steps,
                                cfg,
                                sampler_name: pair.sampler.clone(),
                                scheduler: pair.scheduler.clone(),
                                seed,
                                width: preset.width,
                                height: preset.height,
                                status: SampleJobItemStatus::Pending,
                                comfy_ui_prompt_id: None,
                                output_path: None,
                                error_message: None,
                                duration_ms: None,
                                created_at: now,
                                updated_at: now,
                            });
                        }
                    }
                }
            }
        }
    }

    items
}

/// Field values for one item's placeholders, keyed by the names usable in
/// a workflow template (e.g. `checkpoint`, `prompt`, `seed`).
pub fn item_fields(item: &SampleJobItem, negative_prompt: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert("checkpoint".to_string(), item.comfy_ui_model_path.clone());
    fields.insert("prompt".to_string(), item.prompt_text.clone());
    fields.insert("negative_prompt".to_string(), negative_prompt.to_string());
    fields.insert("steps".to_string(), item.steps.to_string());
    fields.insert("cfg".to_string(), item.cfg.to_string());
    fields.insert("sampler".to_string(), item.sampler_name.clone());
    fields.insert("scheduler".to_string(), item.scheduler.clone());
    fields.insert("seed".to_string(), item.seed.to_string());
    fields.insert("width".to_string(), item.width.to_string());
    fields.insert("height".to_string(), item.height.to_string());
    fields
}

/// Substitute `"${field}"` string placeholders throughout a workflow
/// graph. A leaf matches only when the entire string is exactly
/// `${field}` (no partial/embedded substitution); unknown placeholders
/// are left untouched so a template typo fails loudly downstream rather
/// than silently vanishing.
pub fn substitute_workflow(workflow: &serde_json::Value, fields: &HashMap<String, String>) -> serde_json::Value {
    match workflow {
        serde_json::Value::String(s) => {
            if let Some(field) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
                if let Some(value) = fields.get(field) {
                    return serde_json::Value::String(value.clone());
                }
            }
            workflow.clone()
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|v| substitute_workflow(v, fields)).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), substitute_workflow(v, fields))).collect(),
        ),
        other => other.clone(),
    }
}

pub fn compute_total_items(preset: &SamplePreset, checkpoints: &[String]) -> u32 {
    (checkpoints.len() * preset.axis_cardinality()) as u32
}

#[cfg(test)]
#[path = "expansion_tests.rs"]
mod tests;

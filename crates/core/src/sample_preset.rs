// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample preset: the job template expanded into a Cartesian batch of
//! render requests.

use crate::define_id;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

define_id! {
    /// Identifier for a [`SamplePreset`].
    pub struct SamplePresetId("smpl");
}

/// A single named positive prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub name: String,
    pub text: String,
}

/// A sampler/scheduler pair, sampled together (not crossed independently).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSchedulerPair {
    pub sampler: String,
    pub scheduler: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePreset {
    pub id: SamplePresetId,
    pub name: String,
    pub prompts: Vec<PromptEntry>,
    pub negative_prompt: String,
    pub steps: Vec<u32>,
    pub cfgs: Vec<f64>,
    pub sampler_scheduler_pairs: Vec<SamplerSchedulerPair>,
    pub seeds: Vec<i64>,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SamplePreset {
    /// Cardinality of the Cartesian product over this preset's axes alone
    /// (checkpoints are supplied separately at launch time).
    pub fn axis_cardinality(&self) -> usize {
        self.prompts.len()
            * self.steps.len()
            * self.cfgs.len()
            * self.sampler_scheduler_pairs.len()
            * self.seeds.len()
    }

    /// Validate the non-empty-list invariant for every axis.
    pub fn validate(&self) -> AppResult<()> {
        if self.prompts.is_empty() {
            return Err(AppError::ValidationFailed("prompts must not be empty".into()));
        }
        if self.steps.is_empty() {
            return Err(AppError::ValidationFailed("steps must not be empty".into()));
        }
        if self.cfgs.is_empty() {
            return Err(AppError::ValidationFailed("cfgs must not be empty".into()));
        }
        if self.sampler_scheduler_pairs.is_empty() {
            return Err(AppError::ValidationFailed(
                "samplerSchedulerPairs must not be empty".into(),
            ));
        }
        if self.seeds.is_empty() {
            return Err(AppError::ValidationFailed("seeds must not be empty".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(AppError::ValidationFailed("width and height must be positive".into()));
        }
        Ok(())
    }
}

/// Fields accepted when creating or replacing a sample preset.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSamplePreset {
    pub name: String,
    pub prompts: Vec<PromptEntry>,
    #[serde(default)]
    pub negative_prompt: String,
    pub steps: Vec<u32>,
    pub cfgs: Vec<f64>,
    pub sampler_scheduler_pairs: Vec<SamplerSchedulerPair>,
    pub seeds: Vec<i64>,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
#[path = "sample_preset_tests.rs"]
mod tests;
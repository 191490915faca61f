// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI grid preset (not core; exposed through the CRUD boundary).

use crate::define_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

define_id! {
    /// Identifier for a [`Preset`].
    pub struct PresetId("prst");
}

/// Which dimension name (if any) each axis of the grid view is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider: Option<String>,
    #[serde(default)]
    pub combos: Vec<String>,
}

/// A saved grid-viewer axis mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    pub mapping: PresetMapping,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a preset.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPreset {
    pub name: String,
    pub mapping: PresetMapping,
}

/// Fields accepted when updating a preset (name and/or mapping).
#[derive(Debug, Clone, Deserialize)]
pub struct PresetUpdate {
    pub name: Option<String>,
    pub mapping: Option<PresetMapping>,
}
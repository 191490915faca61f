// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ephemeral scan results. Never
//! persisted — recomputed on demand by walking the training-run tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One rendered image discovered under a training-run root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanImage {
    /// Path relative to the training-run root, forward-slash normalized.
    pub relative_path: String,
    /// Dimension name → string value, e.g. `{"checkpoint": "m.safetensors", "seed": "42"}`.
    pub dimensions: BTreeMap<String, String>,
}

/// Result of scanning a training run: the discovered images plus, per
/// dimension, the sorted distinct values observed across all images.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub images: Vec<ScanImage>,
    pub dimensions: Vec<DimensionValues>,
}

/// Sorted distinct values for one discovered dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionValues {
    pub name: String,
    pub values: Vec<String>,
}

/// Integer-sort when every value parses as an integer, else lexicographic
/// at scan time.
pub fn sort_dimension_values(values: &mut [String]) {
    let all_integers = values.iter().all(|v| v.parse::<i64>().is_ok());
    if all_integers {
        values.sort_by_key(|v| v.parse::<i64>().unwrap_or(0));
    } else {
        values.sort();
    }
}

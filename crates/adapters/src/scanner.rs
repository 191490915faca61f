// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a flat list of relative image paths into a [`ScanResult`]: each
//! path is decomposed into named dimension values using a fixed filename
//! convention, then the distinct values per dimension are collected.
//!
//! The convention: `{checkpoint}/{prompt}-steps-{n}-cfg-{c}-sampler-{s}-
//! scheduler-{sch}-seed-{seed}.png`. There is no upstream format to defer
//! to here, so this is the grid tool's own naming scheme, produced by the
//! same code that writes the render outputs.

use regex::Regex;
use sg_core::{sort_dimension_values, DimensionValues, ScanImage, ScanResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(
            r"^(?P<prompt>[^/]+)-steps-(?P<steps>\d+)-cfg-(?P<cfg>[\d.]+)-sampler-(?P<sampler>[^-]+)-scheduler-(?P<scheduler>[^-]+)-seed-(?P<seed>-?\d+)\.(png|jpg|jpeg|webp)$"
        ).unwrap()
    })
}

/// Extract dimension values from one relative path. Returns `None` if the
/// filename doesn't match the expected convention — such an image is
/// dropped by `scan` rather than kept with partial dimensions.
fn dimensions_for(relative_path: &Path) -> Option<BTreeMap<String, String>> {
    let filename = relative_path.file_name().and_then(|f| f.to_str())?;
    let captures = filename_pattern().captures(filename)?;

    let mut dims = BTreeMap::new();
    if let Some(checkpoint) = relative_path.parent().and_then(|p| p.to_str()).filter(|s| !s.is_empty()) {
        dims.insert("checkpoint".to_string(), checkpoint.to_string());
    }
    for name in ["prompt", "steps", "cfg", "sampler", "scheduler", "seed"] {
        if let Some(value) = captures.name(name) {
            dims.insert(name.to_string(), value.as_str().to_string());
        }
    }
    Some(dims)
}

/// Build a [`ScanResult`] from a set of relative image paths. An image
/// whose filename doesn't match the naming convention is dropped
/// silently rather than kept with partial dimensions.
pub fn scan(relative_paths: &[std::path::PathBuf]) -> ScanResult {
    let mut images = Vec::with_capacity(relative_paths.len());
    let mut by_dimension: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for path in relative_paths {
        let Some(dims) = dimensions_for(path) else {
            continue;
        };
        for (name, value) in &dims {
            let values = by_dimension.entry(name.clone()).or_default();
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
        images.push(ScanImage {
            relative_path: path.to_string_lossy().into_owned(),
            dimensions: dims,
        });
    }

    let dimensions = by_dimension
        .into_iter()
        .map(|(name, mut values)| {
            sort_dimension_values(&mut values);
            DimensionValues { name, values }
        })
        .collect();

    ScanResult { images, dimensions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_dimensions_from_conventional_filename() {
        let dims = dimensions_for(Path::new(
            "checkpoint-1000/a-steps-20-cfg-7.5-sampler-euler-scheduler-normal-seed-42.png",
        ))
        .expect("matches convention");
        assert_eq!(dims.get("checkpoint").map(String::as_str), Some("checkpoint-1000"));
        assert_eq!(dims.get("steps").map(String::as_str), Some("20"));
        assert_eq!(dims.get("seed").map(String::as_str), Some("42"));
    }

    #[test]
    fn unmatched_filename_yields_no_dimensions() {
        assert!(dimensions_for(Path::new("checkpoint-1000/weird-name.png")).is_none());
    }

    #[test]
    fn scan_collects_distinct_sorted_dimension_values() {
        let result = scan(&[
            PathBuf::from("checkpoint-2000/a-steps-30-cfg-5-sampler-euler-scheduler-normal-seed-1.png"),
            PathBuf::from("checkpoint-1000/a-steps-20-cfg-5-sampler-euler-scheduler-normal-seed-1.png"),
        ]);
        assert_eq!(result.images.len(), 2);
        let checkpoint_dim = result.dimensions.iter().find(|d| d.name == "checkpoint").expect("checkpoint dim");
        assert_eq!(checkpoint_dim.values, vec!["checkpoint-1000", "checkpoint-2000"]);
        let steps_dim = result.dimensions.iter().find(|d| d.name == "steps").expect("steps dim");
        assert_eq!(steps_dim.values, vec!["20", "30"]);
    }

    #[test]
    fn scan_drops_an_image_whose_filename_does_not_match_the_convention() {
        let result = scan(&[
            PathBuf::from("checkpoint-1000/a-steps-20-cfg-5-sampler-euler-scheduler-normal-seed-1.png"),
            PathBuf::from("checkpoint-1000/weird-name.png"),
        ]);
        assert_eq!(result.images.len(), 1);
    }
}

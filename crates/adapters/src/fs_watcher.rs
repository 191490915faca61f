// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watches a training run's output directory for added/removed images and
//! emits coalesced [`FsEvent`]s. Raw filesystem notifications arrive in
//! bursts (a renderer writes several files per checkpoint in quick
//! succession); they're batched over a 250ms window before being turned
//! into events so downstream consumers see one burst, not dozens of
//! single-file notifications.

use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sg_core::FsEvent;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

const COALESCE_WINDOW: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to start watcher on {path}: {source}")]
    Start { path: PathBuf, source: notify::Error },
}

/// Owns a `notify` watcher and the coalescing task draining it. Dropping
/// this stops the watch.
pub struct FsWatcher {
    _watcher: RecommendedWatcher,
    _coalescer: tokio::task::JoinHandle<()>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "webp"))
        .unwrap_or(false)
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.eq_ignore_ascii_case("json")).unwrap_or(false)
}

/// Whether `path` is a freshly created checkpoint directory: an actual
/// directory on disk whose name ends in `.safetensors`. Everything else
/// (files, `.json` sidecars, plain subdirectories) is not a checkpoint.
fn is_checkpoint_dir(path: &Path) -> bool {
    let is_dir = path.metadata().map(|meta| meta.file_type().is_dir()).unwrap_or(false);
    if !is_dir {
        return false;
    }
    path.file_name().and_then(|name| name.to_str()).map(|name| name.ends_with(".safetensors")).unwrap_or(false)
}

/// Start watching `root` for image and directory changes belonging to
/// `training_run_id`. Coalesced events are sent to `event_tx` as they're
/// flushed; the channel closing stops the coalescer but not the underlying
/// OS watch, so callers should drop the returned [`FsWatcher`] too.
pub fn watch(
    root: &Path,
    training_run_id: String,
    event_tx: mpsc::Sender<FsEvent>,
) -> Result<FsWatcher, WatchError> {
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<NotifyEvent>();

    let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
        if let Ok(event) = res {
            let _ = raw_tx.send(event);
        }
    })
    .map_err(|source| WatchError::Start { path: root.to_path_buf(), source })?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|source| WatchError::Start { path: root.to_path_buf(), source })?;

    let root = root.to_path_buf();
    let coalescer = tokio::spawn(async move {
        loop {
            let Some(first) = raw_rx.recv().await else { break };
            let mut batch = vec![first];
            let deadline = tokio::time::sleep(COALESCE_WINDOW);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    next = raw_rx.recv() => {
                        match next {
                            Some(event) => batch.push(event),
                            None => break,
                        }
                    }
                    _ = &mut deadline => break,
                }
            }

            for event in coalesce(&root, &training_run_id, batch) {
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
        }
    });

    Ok(FsWatcher { _watcher: watcher, _coalescer: coalescer })
}

/// Collapse a batch of raw notify events into deduplicated [`FsEvent`]s,
/// one per distinct (kind, path).
fn coalesce(root: &Path, training_run_id: &str, batch: Vec<NotifyEvent>) -> Vec<FsEvent> {
    let mut directories_added = HashSet::new();
    let mut images_added = HashSet::new();
    let mut images_removed = HashSet::new();

    for event in batch {
        let is_create = matches!(event.kind, EventKind::Create(_));
        let is_remove = matches!(event.kind, EventKind::Remove(_));
        if !is_create && !is_remove {
            continue;
        }
        for path in event.paths {
            let Ok(relative) = path.strip_prefix(root) else { continue };
            let relative = relative.to_string_lossy().into_owned();
            if relative.is_empty() {
                continue;
            }
            if is_create {
                if is_image(&path) {
                    images_added.insert(relative);
                } else if is_json(&path) {
                    // sidecar metadata, not a sample grid concern
                } else if is_checkpoint_dir(&path) {
                    directories_added.insert(relative);
                }
            } else if is_remove && is_image(&path) {
                images_removed.insert(relative);
            }
        }
    }

    let mut events = Vec::new();
    for path in directories_added {
        events.push(FsEvent::DirectoryAdded { training_run_id: training_run_id.to_string(), path });
    }
    for path in images_added {
        events.push(FsEvent::ImageAdded { training_run_id: training_run_id.to_string(), path });
    }
    for path in images_removed {
        events.push(FsEvent::ImageRemoved { training_run_id: training_run_id.to_string(), path });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    fn notify_event(kind: EventKind, paths: Vec<PathBuf>) -> NotifyEvent {
        NotifyEvent { kind, paths, attrs: Default::default() }
    }

    #[test]
    fn coalesce_dedupes_and_classifies_by_extension() {
        let root = tempfile::tempdir().expect("tempdir");
        let root = root.path();
        std::fs::create_dir_all(root.join("checkpoint-1000")).expect("mkdir");
        std::fs::write(root.join("checkpoint-1000/a.png"), b"").expect("write");
        std::fs::write(root.join("checkpoint-1000/b.png"), b"").expect("write");
        std::fs::create_dir_all(root.join("checkpoint-2000.safetensors")).expect("mkdir");

        let batch = vec![
            notify_event(EventKind::Create(CreateKind::File), vec![root.join("checkpoint-1000/a.png")]),
            notify_event(EventKind::Create(CreateKind::File), vec![root.join("checkpoint-1000/a.png")]),
            notify_event(EventKind::Create(CreateKind::Folder), vec![root.join("checkpoint-2000.safetensors")]),
            notify_event(EventKind::Remove(RemoveKind::File), vec![root.join("checkpoint-1000/b.png")]),
        ];

        let events = coalesce(root, "run-1", batch);
        assert_eq!(events.len(), 3);
        assert!(events.iter().any(|e| matches!(e, FsEvent::ImageAdded { path, .. } if path == "checkpoint-1000/a.png")));
        assert!(events
            .iter()
            .any(|e| matches!(e, FsEvent::DirectoryAdded { path, .. } if path == "checkpoint-2000.safetensors")));
        assert!(events.iter().any(|e| matches!(e, FsEvent::ImageRemoved { path, .. } if path == "checkpoint-1000/b.png")));
    }

    #[test]
    fn coalesce_ignores_events_outside_watched_root() {
        let root = Path::new("/runs/run-1");
        let batch =
            vec![notify_event(EventKind::Create(CreateKind::File), vec![PathBuf::from("/elsewhere/a.png")])];
        assert!(coalesce(root, "run-1", batch).is_empty());
    }

    #[test]
    fn coalesce_skips_json_sidecars_and_plain_subdirectories() {
        let root = tempfile::tempdir().expect("tempdir");
        let root = root.path();
        std::fs::write(root.join("checkpoint-1000.json"), b"{}").expect("write");
        std::fs::create_dir_all(root.join("checkpoint-1000")).expect("mkdir");

        let batch = vec![
            notify_event(EventKind::Create(CreateKind::File), vec![root.join("checkpoint-1000.json")]),
            notify_event(EventKind::Create(CreateKind::Folder), vec![root.join("checkpoint-1000")]),
        ];

        assert!(coalesce(root, "run-1", batch).is_empty());
    }

    #[test]
    fn coalesce_ignores_a_checkpoint_directory_that_no_longer_exists_on_disk() {
        let root = Path::new("/runs/run-1");
        let batch = vec![notify_event(
            EventKind::Create(CreateKind::Folder),
            vec![root.join("checkpoint-2000.safetensors")],
        )];
        assert!(coalesce(root, "run-1", batch).is_empty());
    }
}

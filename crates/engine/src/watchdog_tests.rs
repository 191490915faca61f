// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sg_core::SampleJobItemId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn fires_after_timeout_elapses() {
    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = fired.clone();
    let item_id = SampleJobItemId::new();
    let _watchdog = Watchdog::start(Duration::from_secs(10), item_id, move |_| {
        fired_clone.store(true, Ordering::SeqCst);
    });

    tokio::time::advance(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;
    assert!(fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn cancel_prevents_firing() {
    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = fired.clone();
    let item_id = SampleJobItemId::new();
    let watchdog = Watchdog::start(Duration::from_secs(10), item_id, move |_| {
        fired_clone.store(true, Ordering::SeqCst);
    });
    watchdog.cancel();

    tokio::time::advance(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;
    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn dropping_cancels_the_timer() {
    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = fired.clone();
    let item_id = SampleJobItemId::new();
    {
        let _watchdog = Watchdog::start(Duration::from_secs(10), item_id, move |_| {
            fired_clone.store(true, Ordering::SeqCst);
        });
    }

    tokio::time::advance(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;
    assert!(!fired.load(Ordering::SeqCst));
}

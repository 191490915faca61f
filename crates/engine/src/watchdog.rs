// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-item idle watchdog. The render service occasionally accepts a
//! prompt and then never reports progress on it (a silently dropped
//! submission, a crashed worker on its end); without a timeout the
//! dispatcher would wait forever on that single item.

use sg_core::SampleJobItemId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long an in-flight item may go without a progress event before the
/// watchdog declares it timed out.
pub const ITEM_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// A running timer for one in-flight item. Dropping it cancels the timer
/// without firing.
pub struct Watchdog {
    handle: JoinHandle<()>,
}

impl Watchdog {
    /// Start a timer that invokes `on_timeout` after `timeout` unless
    /// cancelled or dropped first.
    pub fn start<F>(timeout: Duration, item_id: SampleJobItemId, on_timeout: F) -> Self
    where
        F: FnOnce(SampleJobItemId) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_timeout(item_id);
        });
        Self { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Bridges a fired watchdog timer into the dispatcher's command mailbox.
pub fn start_for_mailbox(
    item_id: SampleJobItemId,
    command_tx: mpsc::Sender<crate::commands::EngineCommand>,
) -> Watchdog {
    Watchdog::start(ITEM_IDLE_TIMEOUT, item_id, move |timed_out_item| {
        let _ = command_tx.try_send(crate::commands::EngineCommand::ItemTimedOut(timed_out_item));
    })
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast hub: fans published events out to every connected `/api/ws`
//! session. Each session owns a bounded mailbox so one slow reader can
//! never back-pressure the publisher or the other sessions; when a
//! mailbox fills, the oldest queued message is dropped to make room for
//! the newest one rather than refusing the write.

use sg_core::{BroadcastMessage, PublishedEvent, SessionId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Mailboxes hold at most this many undelivered messages before the
/// oldest is evicted to make room.
const MAILBOX_CAPACITY: usize = 64;

/// How long a session's transport may go without delivering a queued
/// message before the hub considers it a dead/slow consumer worth
/// dropping. Enforced by the caller driving the transport (the
/// `/api/ws` route), not by the hub itself, since only the transport
/// knows whether a write is actually stuck.
pub const SLOW_CONSUMER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

struct Mailbox {
    queue: parking_lot::Mutex<VecDeque<BroadcastMessage>>,
    notify: Notify,
    dropped: AtomicU64,
}

impl Mailbox {
    fn new() -> Self {
        Self { queue: parking_lot::Mutex::new(VecDeque::new()), notify: Notify::new(), dropped: AtomicU64::new(0) }
    }

    fn push(&self, message: BroadcastMessage) {
        let mut queue = self.queue.lock();
        if queue.len() >= MAILBOX_CAPACITY {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(message);
        drop(queue);
        self.notify.notify_one();
    }

    /// Wait for at least one message, then drain everything queued.
    async fn recv_batch(&self) -> Vec<BroadcastMessage> {
        loop {
            {
                let mut queue = self.queue.lock();
                if !queue.is_empty() {
                    return queue.drain(..).collect();
                }
            }
            self.notify.notified().await;
        }
    }
}

struct Session {
    training_run_id: Option<String>,
    mailbox: Arc<Mailbox>,
}

/// Handle returned to a newly registered session; used to drain its
/// mailbox from the connection's write loop.
#[derive(Clone)]
pub struct SessionHandle {
    mailbox: Arc<Mailbox>,
}

impl SessionHandle {
    pub async fn recv_batch(&self) -> Vec<BroadcastMessage> {
        self.mailbox.recv_batch().await
    }

    /// Messages dropped from this session's mailbox because it fell
    /// behind, since registration.
    pub fn dropped_count(&self) -> u64 {
        self.mailbox.dropped.load(Ordering::Relaxed)
    }
}

/// Registry of live `/api/ws` connections. Cheap to clone; the session
/// list is guarded by a single mutex, held only briefly for
/// register/unregister and for the iteration that fans a publish out —
/// the actual delivery goes to each session's own mailbox without
/// holding the registry lock.
#[derive(Clone, Default)]
pub struct Hub {
    sessions: Arc<parking_lot::Mutex<HashMap<SessionId, Session>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session, optionally scoped to one training run's
    /// filesystem events (job-progress events go to everyone regardless
    /// of scope).
    pub fn register(&self, training_run_id: Option<String>) -> (SessionId, SessionHandle) {
        let id = SessionId::new();
        let mailbox = Arc::new(Mailbox::new());
        self.sessions.lock().insert(id.clone(), Session { training_run_id, mailbox: mailbox.clone() });
        (id, SessionHandle { mailbox })
    }

    pub fn unregister(&self, id: &SessionId) {
        self.sessions.lock().remove(id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Fan `event` out to every session it is relevant to. The registry
    /// lock is dropped before any mailbox push, so a push into a full
    /// mailbox (which only touches that mailbox's own lock) never
    /// contends with a concurrent register/unregister.
    pub fn publish(&self, event: PublishedEvent) {
        let training_run_id = match &event {
            PublishedEvent::Fs(fs_event) => Some(fs_event.training_run_id().to_string()),
            PublishedEvent::JobProgress(_) => None,
        };
        let message: BroadcastMessage = match event {
            PublishedEvent::Fs(fs_event) => fs_event.into(),
            PublishedEvent::JobProgress(progress) => progress.into(),
        };

        let targets: Vec<Arc<Mailbox>> = {
            let sessions = self.sessions.lock();
            sessions
                .values()
                .filter(|session| match &training_run_id {
                    Some(run_id) => session.training_run_id.as_deref() == Some(run_id.as_str()),
                    None => true,
                })
                .map(|session| session.mailbox.clone())
                .collect()
        };
        for mailbox in targets {
            mailbox.push(message.clone());
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;

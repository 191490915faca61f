// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher's single mailbox. Every external trigger — an HTTP
//! request, the render-service WebSocket listener, the watchdog, the
//! periodic retry tick — becomes one of these and is handled serially by
//! the dispatcher task, so state transitions never race each other.

use sg_adapters::RenderServiceEvent;
use sg_core::{LaunchJobRequest, SampleJob, SampleJobId, SampleJobItemId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum EngineCommand {
    /// Expand a preset against checkpoints, insert the job and its items,
    /// and wake the dispatch loop.
    Launch { request: LaunchJobRequest, reply: oneshot::Sender<sg_core::AppResult<SampleJob>> },
    /// Interrupt the in-flight item of a job (if it is the one currently
    /// running) and mark the job stopped. A stopped job is dispatchable
    /// again on the next idle cycle.
    Stop { job_id: SampleJobId, reply: oneshot::Sender<sg_core::AppResult<SampleJob>> },
    /// Mark a stopped job pending again.
    Resume { job_id: SampleJobId, reply: oneshot::Sender<sg_core::AppResult<SampleJob>> },
    /// Remove a job and its items; refuses while the job is running.
    Delete { job_id: SampleJobId, reply: oneshot::Sender<sg_core::AppResult<()>> },
    /// A job was inserted, stopped, or resumed; check for dispatchable work.
    PollJobs,
    /// Forwarded from the render-service WebSocket listener.
    RenderEvent(RenderServiceEvent),
    /// The in-flight item has been idle past its deadline.
    ItemTimedOut(SampleJobItemId),
    /// Periodic heartbeat driving retry of a previously failed submission.
    Tick,
}

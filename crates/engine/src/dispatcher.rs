// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-mailbox dispatcher: the only writer of job/item state once a job
//! has been launched. Exactly one item is ever in flight at a time — the
//! render service this talks to has no queue-priority concept worth
//! exploiting, and serializing submissions keeps the item state machine
//! trivially race-free.

use crate::commands::EngineCommand;
use crate::expansion;
use crate::hub::Hub;
use crate::progress::compute_job_progress;
use crate::watchdog::Watchdog;
use sg_adapters::RenderClient;
use sg_core::{
    AppError, AppResult, LaunchJobRequest, PublishedEvent, SampleJob, SampleJobId,
    SampleJobItem, SampleJobItemId, SampleJobStatus,
};
use sg_storage::Store;
use tokio::sync::{mpsc, oneshot};

const COMMAND_MAILBOX_CAPACITY: usize = 256;

/// Handle to a running dispatcher. Cloning shares the same mailbox.
#[derive(Clone)]
pub struct Dispatcher {
    command_tx: mpsc::Sender<EngineCommand>,
}

impl Dispatcher {
    /// Spawn the dispatcher task and return a handle to its mailbox.
    /// Generic over the render adapter so tests can inject a fake instead
    /// of talking to a real service; production callers pass a
    /// `RenderHttpClient`.
    ///
    /// `client_id` is submitted with every prompt and must equal the
    /// `clientId` query parameter the render-service WebSocket listener
    /// subscribes with — otherwise completion events for prompts this
    /// dispatcher submits are never delivered back to it.
    pub fn spawn<R: RenderClient>(store: Store, render: R, hub: Hub, client_id: String) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_MAILBOX_CAPACITY);
        let actor = Actor { store, render, hub, client_id, command_tx: command_tx.clone(), in_flight: None };
        tokio::spawn(actor.run(command_rx));
        Self { command_tx }
    }

    pub fn command_sender(&self) -> mpsc::Sender<EngineCommand> {
        self.command_tx.clone()
    }

    pub async fn launch(&self, request: LaunchJobRequest) -> AppResult<SampleJob> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Launch { request, reply }).await;
        rx.await.map_err(|_| AppError::Internal("dispatcher dropped the reply channel".into()))?
    }

    pub async fn stop(&self, job_id: SampleJobId) -> AppResult<SampleJob> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Stop { job_id, reply }).await;
        rx.await.map_err(|_| AppError::Internal("dispatcher dropped the reply channel".into()))?
    }

    pub async fn resume(&self, job_id: SampleJobId) -> AppResult<SampleJob> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Resume { job_id, reply }).await;
        rx.await.map_err(|_| AppError::Internal("dispatcher dropped the reply channel".into()))?
    }

    pub async fn delete(&self, job_id: SampleJobId) -> AppResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Delete { job_id, reply }).await;
        rx.await.map_err(|_| AppError::Internal("dispatcher dropped the reply channel".into()))?
    }

    async fn send(&self, command: EngineCommand) {
        if self.command_tx.send(command).await.is_err() {
            tracing::error!("dispatcher mailbox closed, dropping command");
        }
    }
}

/// One item currently submitted to the render service and awaiting a
/// terminal WebSocket event.
struct InFlight {
    job_id: SampleJobId,
    item_id: SampleJobItemId,
    prompt_id: String,
    started_at: std::time::Instant,
    watchdog: Watchdog,
}

struct Actor<R: RenderClient> {
    store: Store,
    render: R,
    hub: Hub,
    /// Submitted with every prompt; see [`Dispatcher::spawn`].
    client_id: String,
    command_tx: mpsc::Sender<EngineCommand>,
    in_flight: Option<InFlight>,
}

impl<R: RenderClient> Actor<R> {
    async fn run(mut self, mut command_rx: mpsc::Receiver<EngineCommand>) {
        while let Some(command) = command_rx.recv().await {
            self.handle(command).await;
        }
        tracing::info!("dispatcher mailbox closed, stopping");
    }

    async fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Launch { request, reply } => {
                let result = self.launch(request).await;
                if result.is_ok() {
                    self.dispatch_next().await;
                }
                let _ = reply.send(result);
            }
            EngineCommand::Stop { job_id, reply } => {
                let result = self.stop(job_id).await;
                let _ = reply.send(result);
            }
            EngineCommand::Resume { job_id, reply } => {
                let result = self.resume(job_id).await;
                self.dispatch_next().await;
                let _ = reply.send(result);
            }
            EngineCommand::Delete { job_id, reply } => {
                let result = self.delete(job_id).await;
                let _ = reply.send(result);
            }
            EngineCommand::PollJobs | EngineCommand::Tick => self.dispatch_next().await,
            EngineCommand::RenderEvent(event) => self.on_render_event(event).await,
            EngineCommand::ItemTimedOut(item_id) => self.on_item_timed_out(item_id).await,
        }
    }

    async fn launch(&mut self, request: LaunchJobRequest) -> AppResult<SampleJob> {
        if request.checkpoint_filenames.is_empty() {
            return Err(AppError::ValidationFailed("checkpointFilenames must not be empty".into()));
        }
        if self.store.has_running_job().await? {
            return Err(AppError::Conflict("a sample job is already running".into()));
        }

        let preset = self.store.get_sample_preset(request.sample_preset_id.clone()).await?;
        preset.validate()?;

        let job_id = SampleJobId::new();
        let items = expansion::expand_job_items(job_id.clone(), &preset, &request.checkpoint_filenames);
        let now = chrono::Utc::now();
        let job = SampleJob {
            id: job_id.clone(),
            training_run_name: request.training_run_name,
            sample_preset_id: request.sample_preset_id,
            workflow_name: request.workflow_name,
            vae: request.vae,
            clip: request.clip,
            shift: request.shift,
            status: SampleJobStatus::Pending,
            total_items: items.len() as u32,
            completed_items: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        let inserted = self.store.insert_job(job, request.workflow).await?;
        self.store.insert_job_items(items).await?;
        Ok(inserted)
    }

    async fn stop(&mut self, job_id: SampleJobId) -> AppResult<SampleJob> {
        if let Some(in_flight) = self.in_flight.take_if(|f| f.job_id == job_id) {
            if let Err(err) = self.render.interrupt().await {
                tracing::warn!(%err, "interrupt request to render service failed");
            }
            self.store.reset_item_to_pending(in_flight.item_id).await?;
        }
        let job = self.store.set_job_status(job_id.clone(), SampleJobStatus::Stopped, None).await?;
        self.publish_progress(&job).await;
        Ok(job)
    }

    async fn resume(&mut self, job_id: SampleJobId) -> AppResult<SampleJob> {
        let job = self.store.set_job_status(job_id, SampleJobStatus::Pending, None).await?;
        self.publish_progress(&job).await;
        Ok(job)
    }

    async fn delete(&mut self, job_id: SampleJobId) -> AppResult<()> {
        if self.in_flight.as_ref().is_some_and(|f| f.job_id == job_id) {
            return Err(AppError::Conflict("cannot delete a job with an item in flight".into()));
        }
        self.store.delete_job(job_id).await?;
        Ok(())
    }

    /// Take the oldest dispatchable job and submit its oldest pending item,
    /// unless an item is already in flight. Finalizes any job found to
    /// have no pending items left and keeps looking.
    async fn dispatch_next(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        loop {
            let job = match self.store.next_dispatchable_job().await {
                Ok(Some(job)) => job,
                Ok(None) => return,
                Err(err) => {
                    tracing::error!(%err, "failed to query for dispatchable jobs");
                    return;
                }
            };

            if job.status != SampleJobStatus::Running {
                match self.store.set_job_status(job.id.clone(), SampleJobStatus::Running, None).await {
                    Ok(updated) => self.publish_progress(&updated).await,
                    Err(err) => {
                        tracing::error!(%err, job_id = %job.id, "failed to mark job running");
                        return;
                    }
                }
            }

            match self.store.next_pending_item(job.id.clone()).await {
                Ok(Some(item)) => {
                    self.submit_item(job, item).await;
                    if self.in_flight.is_some() {
                        return;
                    }
                    // Submission failed outright (preset/workflow lookup or
                    // every retry exhausted) and the item was marked failed
                    // without ever reaching the render service — move on to
                    // the next pending item instead of stalling until the
                    // next tick.
                }
                Ok(None) => {
                    self.finalize_job(job.id.clone()).await;
                }
                Err(err) => {
                    tracing::error!(%err, job_id = %job.id, "failed to query pending items");
                    return;
                }
            }
        }
    }

    async fn submit_item(&mut self, job: SampleJob, item: SampleJobItem) {
        let item_id = item.id.clone();
        let job_id = job.id.clone();

        let preset = match self.store.get_sample_preset(job.sample_preset_id.clone()).await {
            Ok(preset) => preset,
            Err(err) => {
                self.fail_item(item_id, format!("preset lookup failed: {err}")).await;
                return;
            }
        };
        let workflow_template = match self.store.get_job_workflow(job_id.clone()).await {
            Ok(workflow) => workflow,
            Err(err) => {
                self.fail_item(item_id, format!("workflow lookup failed: {err}")).await;
                return;
            }
        };

        let fields = expansion::item_fields(&item, &preset.negative_prompt);
        let workflow = expansion::substitute_workflow(&workflow_template, &fields);

        match sg_adapters::submit_with_retry(&self.render, workflow, &self.client_id).await {
            Ok(prompt_id) => {
                match self.store.mark_item_running(item_id.clone(), prompt_id.clone()).await {
                    Ok(_) => {
                        let watchdog = crate::watchdog::start_for_mailbox(item_id.clone(), self.command_tx.clone());
                        self.in_flight = Some(InFlight {
                            job_id,
                            item_id,
                            prompt_id,
                            started_at: std::time::Instant::now(),
                            watchdog,
                        });
                    }
                    Err(err) => tracing::error!(%err, "failed to record item as running"),
                }
            }
            Err(err) => {
                self.fail_item(item_id, err.to_string()).await;
                // keep working through the job: dispatch_next() is called
                // by every public command handler after this returns.
            }
        }
    }

    async fn fail_item(&mut self, item_id: SampleJobItemId, error_message: String) {
        let job_id = match self.store.mark_item_failed(item_id, error_message).await {
            Ok(item) => item.job_id,
            Err(err) => {
                tracing::error!(%err, "failed to record item failure");
                return;
            }
        };
        if let Err(err) = self.store.increment_job_completed(job_id).await {
            tracing::error!(%err, "failed to bump job completed count");
        }
    }

    async fn finalize_job(&mut self, job_id: SampleJobId) {
        let items = match self.store.list_job_items(job_id.clone()).await {
            Ok(items) => items,
            Err(err) => {
                tracing::error!(%err, %job_id, "failed to list items while finalizing job");
                return;
            }
        };
        let status = if items.iter().any(|i| i.status == sg_core::SampleJobItemStatus::Failed) {
            SampleJobStatus::CompletedWithErrors
        } else {
            SampleJobStatus::Completed
        };
        match self.store.set_job_status(job_id, status, None).await {
            Ok(job) => self.publish_progress(&job).await,
            Err(err) => tracing::error!(%err, "failed to finalize job status"),
        }
    }

    async fn on_render_event(&mut self, event: sg_adapters::RenderServiceEvent) {
        use sg_adapters::RenderServiceEvent;

        let completion = match &event {
            RenderServiceEvent::Executed { prompt_id, output_path } => {
                Some((prompt_id.clone(), Ok(output_path.clone())))
            }
            RenderServiceEvent::ExecutionError { prompt_id, message } => {
                Some((prompt_id.clone(), Err(message.clone())))
            }
            _ => None,
        };

        let Some((prompt_id, outcome)) = completion else {
            if let Some(job) = self.current_job().await {
                self.publish_progress(&job).await;
            }
            return;
        };

        let Some(in_flight) = self.in_flight.take_if(|f| f.prompt_id == prompt_id) else {
            return;
        };
        in_flight.watchdog.cancel();
        let duration_ms = in_flight.started_at.elapsed().as_millis() as i64;

        match outcome {
            Ok(output_path) => {
                let output_path = output_path.unwrap_or_default();
                if let Err(err) =
                    self.store.mark_item_completed(in_flight.item_id, output_path, duration_ms).await
                {
                    tracing::error!(%err, "failed to record item completion");
                }
                if let Err(err) = self.store.increment_job_completed(in_flight.job_id.clone()).await {
                    tracing::error!(%err, "failed to bump job completed count");
                }
            }
            Err(message) => self.fail_item(in_flight.item_id, message).await,
        }

        if let Ok(job) = self.store.get_job(in_flight.job_id).await {
            self.publish_progress(&job).await;
        }
        self.dispatch_next().await;
    }

    async fn on_item_timed_out(&mut self, item_id: SampleJobItemId) {
        let Some(in_flight) = self.in_flight.take_if(|f| f.item_id == item_id) else {
            return;
        };
        if let Err(err) = self.render.interrupt().await {
            tracing::warn!(%err, "interrupt after watchdog timeout failed");
        }
        self.fail_item(in_flight.item_id, AppError::ItemTimeout.to_string()).await;
        if let Ok(job) = self.store.get_job(in_flight.job_id).await {
            self.publish_progress(&job).await;
        }
        self.dispatch_next().await;
    }

    async fn current_job(&self) -> Option<SampleJob> {
        let job_id = self.in_flight.as_ref()?.job_id.clone();
        self.store.get_job(job_id).await.ok()
    }

    async fn publish_progress(&self, job: &SampleJob) {
        let items = match self.store.list_job_items(job.id.clone()).await {
            Ok(items) => items,
            Err(err) => {
                tracing::error!(%err, "failed to list items for progress broadcast");
                return;
            }
        };
        let progress = compute_job_progress(job, &items);
        self.hub.publish(PublishedEvent::JobProgress(progress));
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

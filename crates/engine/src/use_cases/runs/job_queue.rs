//! Run job queue.
//!
//! Accepts run jobs, executes them on a bounded worker pool and exposes
//! their terminal results. Every job that got its leases gives them back
//! exactly once, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use cryptforge_domain::{PartyError, RunEvent, RunId, RunJob, RunResult, RunStatus};

use super::ExecuteDungeonRun;
use crate::infrastructure::ports::{
    ClockPort, LockCoordinator, LockError, QueueError, QueueItem, QueueItemStatus, RepoError,
    RunQueuePort, RunRepo,
};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Lock conflict: {0}")]
    LockConflict(#[from] LockError),
    #[error("Invalid party: {0}")]
    InvalidParty(#[from] PartyError),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] RepoError),
    #[error("Queue failed: {0}")]
    Queue(#[from] QueueError),
    #[error("Run execution failed: {0}")]
    Execution(String),
    #[error("Run {0} is already being processed")]
    InFlight(RunId),
}

/// What a caller sees when asking about a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatusView {
    /// Queued or running
    Pending,
    Finished(RunResult),
    /// The queue gave up on the run before it produced a result.
    Rejected { reason: String },
    /// Never submitted
    Unknown,
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub concurrency: usize,
    pub poll_interval: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Removes a run from the in-flight set when processing ends.
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<RunId, ()>,
    run_id: RunId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.run_id);
    }
}

pub struct RunJobQueue {
    queue: Arc<dyn RunQueuePort>,
    runs: Arc<dyn RunRepo>,
    locks: Arc<dyn LockCoordinator>,
    orchestrator: Arc<ExecuteDungeonRun>,
    clock: Arc<dyn ClockPort>,
    settings: WorkerSettings,
    in_flight: DashMap<RunId, ()>,
}

impl RunJobQueue {
    pub fn new(
        queue: Arc<dyn RunQueuePort>,
        runs: Arc<dyn RunRepo>,
        locks: Arc<dyn LockCoordinator>,
        orchestrator: Arc<ExecuteDungeonRun>,
        clock: Arc<dyn ClockPort>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            runs,
            locks,
            orchestrator,
            clock,
            settings,
            in_flight: DashMap::new(),
        }
    }

    pub async fn submit(&self, job: RunJob) -> Result<RunId, JobError> {
        job.check_party()?;
        let run_id = job.run_id;
        let item_id = self.queue.enqueue(job).await?;
        tracing::info!(run_id = %run_id, queue_item = %item_id, "Run submitted");
        Ok(run_id)
    }

    pub async fn get_result(&self, run_id: RunId) -> Result<RunStatusView, JobError> {
        if let Some(result) = self.runs.get_result(run_id).await? {
            return Ok(RunStatusView::Finished(result));
        }
        Ok(match self.queue.find_run(run_id).await? {
            Some(item) if item.status == QueueItemStatus::Failed => RunStatusView::Rejected {
                reason: item.error_message.unwrap_or_default(),
            },
            Some(_) => RunStatusView::Pending,
            None => RunStatusView::Unknown,
        })
    }

    /// Process the oldest pending job, if any.
    pub async fn process_next(&self) -> Result<Option<RunResult>, JobError> {
        match self.queue.dequeue().await? {
            Some(item) => self.process_item(item).await.map(Some),
            None => Ok(None),
        }
    }

    /// Process a claimed queue item and settle it with the queue.
    pub async fn process_item(&self, item: QueueItem) -> Result<RunResult, JobError> {
        let outcome = self.process_job(&item.job).await;

        let settled = match &outcome {
            Ok(result) if result.status != RunStatus::Error => self.queue.complete(item.id).await,
            Ok(result) => self.queue.fail(item.id, &error_message(result)).await,
            Err(e) => self.queue.fail(item.id, &e.to_string()).await,
        };
        if let Err(e) = settled {
            tracing::warn!(run_id = %item.job.run_id, error = %e, "Failed to settle queue item");
        }

        match outcome {
            Ok(result) if result.status == RunStatus::Error => {
                Err(JobError::Execution(error_message(&result)))
            }
            other => other,
        }
    }

    async fn process_job(&self, job: &RunJob) -> Result<RunResult, JobError> {
        let run_id = job.run_id;
        job.check_party()?;

        // 1. Single flight per run
        if self.in_flight.insert(run_id, ()).is_some() {
            return Err(JobError::InFlight(run_id));
        }
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            run_id,
        };
        if let Some(existing) = self.runs.get_result(run_id).await? {
            tracing::info!(run_id = %run_id, status = %existing.status, "Run already finished");
            self.backfill_events(&existing).await?;
            return Ok(existing);
        }

        // 2. Lease the party. A conflict leaves party and results untouched.
        self.locks.acquire(run_id, &job.party).await?;
        tracing::info!(run_id = %run_id, heroes = job.party.len(), "Run started");

        // 3. Execute; a panic inside the run becomes an error result
        let orchestrator = Arc::clone(&self.orchestrator);
        let spawned_job = job.clone();
        let task = tokio::spawn(async move { orchestrator.execute(&spawned_job).await });
        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => {
                tracing::error!(run_id = %run_id, error = %join_error, "Run task aborted");
                RunResult::error(
                    run_id,
                    job.dungeon_id.clone(),
                    format!("run task aborted: {join_error}"),
                    self.clock.now(),
                )
            }
        };

        // 4. Persist, falling back to an error record
        let persisted = self.persist(job, &result).await;

        // 5. Release, exactly once, on every path past acquisition
        self.locks.release(run_id, &job.party).await;
        tracing::info!(
            run_id = %run_id,
            status = %result.status,
            levels_completed = result.levels_completed,
            "Run finished"
        );

        persisted?;
        Ok(result)
    }

    /// Store the terminal result, then its events. The log is only written
    /// for the result that actually got stored.
    async fn persist(&self, job: &RunJob, result: &RunResult) -> Result<(), RepoError> {
        let run_id = result.run_id;
        let Err(e) = self.runs.save_result(result).await else {
            return self.runs.append_events(run_id, &result.events).await;
        };

        tracing::error!(run_id = %run_id, error = %e, "Failed to persist run result");
        let fallback = RunResult::error(
            run_id,
            job.dungeon_id.clone(),
            format!("failed to persist run result: {e}"),
            self.clock.now(),
        );
        let stored = match self.runs.save_result(&fallback).await {
            Ok(()) => self.runs.append_events(run_id, &fallback.events).await,
            Err(err) => Err(err),
        };
        if let Err(err) = stored {
            tracing::error!(run_id = %run_id, error = %err, "Failed to persist error result");
        }
        Err(e)
    }

    /// Write the events of a stored result whose log never made it.
    async fn backfill_events(&self, result: &RunResult) -> Result<(), RepoError> {
        if result.events.is_empty() || !self.runs.get_events(result.run_id).await?.is_empty() {
            return Ok(());
        }
        tracing::warn!(run_id = %result.run_id, "Backfilling run event log");
        self.runs.append_events(result.run_id, &result.events).await
    }

    /// Worker loop. Claims jobs while permits are free and stops claiming when
    /// `shutdown` fires. Running jobs are never cancelled; the loop returns
    /// once they have finished.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let width = self.settings.concurrency.max(1);
        let permits = Arc::new(Semaphore::new(width));
        tracing::info!(concurrency = width, "Run worker started");

        loop {
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let item = match self.queue.dequeue().await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    drop(permit);
                    if self.idle(&shutdown).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to dequeue run");
                    drop(permit);
                    if self.idle(&shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            let worker = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                let run_id = item.job.run_id;
                if let Err(e) = worker.process_item(item).await {
                    match e {
                        JobError::LockConflict(_)
                        | JobError::InFlight(_)
                        | JobError::InvalidParty(_) => {
                            tracing::warn!(run_id = %run_id, error = %e, "Run not started")
                        }
                        _ => tracing::error!(run_id = %run_id, error = %e, "Run failed"),
                    }
                }
            });
        }

        // Wait for running jobs so their leases are back before returning
        let _drained = permits
            .acquire_many(u32::try_from(width).unwrap_or(u32::MAX))
            .await;
        tracing::info!("Run worker stopped");
    }

    /// Wait one poll interval. True when shutdown fired meanwhile.
    async fn idle(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => true,
            _ = tokio::time::sleep(self.settings.poll_interval) => false,
        }
    }
}

fn error_message(result: &RunResult) -> String {
    result
        .events
        .iter()
        .find_map(|event| match event {
            RunEvent::Error { message } => Some(message.clone()),
            _ => None,
        })
        .unwrap_or_else(|| format!("run ended with status {}", result.status))
}

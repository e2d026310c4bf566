//! Dungeon run use cases: the level-by-level orchestrator, hero leases and
//! the background job queue.

mod job_queue;
mod locks;
mod orchestrator;

pub use job_queue::{JobError, RunJobQueue, RunStatusView, WorkerSettings};
pub use locks::LeaseLockCoordinator;
pub use orchestrator::{ExecuteDungeonRun, RunError};

use std::sync::Arc;

/// Container for run use cases.
pub struct RunUseCases {
    pub execute: Arc<ExecuteDungeonRun>,
    pub jobs: Arc<RunJobQueue>,
    pub locks: Arc<LeaseLockCoordinator>,
}

impl RunUseCases {
    pub fn new(
        execute: Arc<ExecuteDungeonRun>,
        jobs: Arc<RunJobQueue>,
        locks: Arc<LeaseLockCoordinator>,
    ) -> Self {
        Self {
            execute,
            jobs,
            locks,
        }
    }
}

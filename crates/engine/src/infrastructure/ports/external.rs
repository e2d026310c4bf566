//! Ports for capabilities owned by other services: hero stats, encounter
//! resolution, loot rolls, the run queue, hero leases and world context.

use async_trait::async_trait;
use cryptforge_domain::{
    CombatOutcome, Dungeon, Encounter, HeroRef, LootItem, MapCell, Monster, PartyMember,
    QueueItemId, RunId, RunJob, StatDeltas, TrapOutcome,
};

use super::error::{LockError, QueueError, RepoError, ResolverError};
use super::types::QueueItem;

// =============================================================================
// Hero Stats
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsPort: Send + Sync {
    /// Current stats of the heroes, in the order requested.
    async fn get_party(&self, heroes: &[HeroRef]) -> Result<Vec<PartyMember>, RepoError>;
    async fn apply_deltas(
        &self,
        hero: &HeroRef,
        deltas: StatDeltas,
        reason: &str,
    ) -> Result<(), RepoError>;
    async fn restore(&self, hero: &HeroRef, health: u32, mana: u32) -> Result<(), RepoError>;
}

// =============================================================================
// Resolution
// =============================================================================

/// Combat and trap math. Balance lives behind this port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncounterResolverPort: Send + Sync {
    async fn resolve_combat(
        &self,
        party: &[PartyMember],
        monsters: &[Monster],
    ) -> Result<CombatOutcome, ResolverError>;
    async fn resolve_trap(
        &self,
        encounter: &Encounter,
        party: &[PartyMember],
    ) -> Result<TrapOutcome, ResolverError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LootGeneratorPort: Send + Sync {
    async fn generate(&self, seed: &str, level: u32) -> Result<LootItem, ResolverError>;
}

// =============================================================================
// Run Queue
// =============================================================================

/// External job queue. Retry and backoff policy belong to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunQueuePort: Send + Sync {
    async fn enqueue(&self, job: RunJob) -> Result<QueueItemId, QueueError>;
    /// Claim the oldest pending item, marking it processing.
    async fn dequeue(&self) -> Result<Option<QueueItem>, QueueError>;
    async fn complete(&self, id: QueueItemId) -> Result<(), QueueError>;
    async fn fail(&self, id: QueueItemId, error: &str) -> Result<(), QueueError>;
    /// Number of pending items.
    async fn depth(&self) -> Result<usize, QueueError>;
    /// The latest item carrying `run_id`, in whatever state.
    async fn find_run(&self, run_id: RunId) -> Result<Option<QueueItem>, QueueError>;
}

// =============================================================================
// Hero Leases
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockCoordinator: Send + Sync {
    /// Lease every hero to `run_id`, or none of them.
    async fn acquire(&self, run_id: RunId, heroes: &[HeroRef]) -> Result<(), LockError>;
    /// Drop the leases `run_id` holds on `heroes`. Idempotent.
    async fn release(&self, run_id: RunId, heroes: &[HeroRef]);
}

// =============================================================================
// World Context
// =============================================================================

/// Optional hook into the wider world model, notified about generated content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorldContext: Send + Sync {
    /// Name to give a freshly generated dungeon, if the world has an opinion.
    async fn dungeon_name(&self, dungeon: &Dungeon) -> Option<String>;
    async fn dungeon_generated(&self, dungeon: &Dungeon);
    async fn cell_generated(&self, cell: &MapCell);
}

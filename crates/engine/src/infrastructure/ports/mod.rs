//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Storage (could swap SQLite -> Postgres)
//! - Hero stats, encounter resolution and loot (owned by other services)
//! - The run queue (could swap in-memory -> Redis)
//! - Hero leases and world context
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{MapRepo, RunRepo};

// =============================================================================
// Helper Types
// =============================================================================
pub use types::{
    CellFilter, CellPage, QueueItem, QueueItemStatus, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    EncounterResolverPort, LockCoordinator, LootGeneratorPort, RunQueuePort, StatsPort,
    WorldContext,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockMapRepo, MockRunRepo};

#[cfg(test)]
pub use external::{
    MockEncounterResolverPort, MockLockCoordinator, MockLootGeneratorPort, MockRunQueuePort,
    MockStatsPort, MockWorldContext,
};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{LockError, QueueError, RepoError, ResolverError};

//! In-memory adapters for the storage and stats ports.
//!
//! Used by tests and by the binary when no database path is configured.

mod map_store;
mod run_store;
mod stats_store;

pub use map_store::InMemoryMapRepo;
pub use run_store::InMemoryRunRepo;
pub use stats_store::{InMemoryStatsStore, StatsWrite};

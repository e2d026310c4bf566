//! Repository port traits for storage access.

use async_trait::async_trait;
use cryptforge_domain::{Dungeon, DungeonId, MapCell, RunEvent, RunId, RunResult};

use super::error::RepoError;
use super::types::{CellFilter, CellPage};

// =============================================================================
// Map Storage
// =============================================================================

/// Cells keyed by `(x, y)`, dungeons keyed by id.
///
/// A stored cell keeps its content forever; only its discoverers grow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapRepo: Send + Sync {
    async fn get_cell(&self, x: i32, y: i32) -> Result<Option<MapCell>, RepoError>;
    /// Insert the cell unless one is already stored at `(cell.x, cell.y)`.
    /// Returns the cell stored afterwards.
    async fn save_cell(&self, cell: &MapCell) -> Result<MapCell, RepoError>;
    /// Add `explorer` to the discoverers of the stored cell as one atomic
    /// step. `None` when no cell is stored at `(x, y)`.
    async fn record_discovery(
        &self,
        x: i32,
        y: i32,
        explorer: &str,
    ) -> Result<Option<MapCell>, RepoError>;
    async fn get_dungeon(&self, id: &DungeonId) -> Result<Option<Dungeon>, RepoError>;
    async fn save_dungeon(&self, dungeon: &Dungeon) -> Result<(), RepoError>;
    /// Store a generated cell with its dungeons. The cell is written only
    /// after every dungeon was; returns the cell stored afterwards.
    async fn save_generated(
        &self,
        cell: &MapCell,
        dungeons: &[Dungeon],
    ) -> Result<MapCell, RepoError> {
        for dungeon in dungeons {
            self.save_dungeon(dungeon).await?;
        }
        self.save_cell(cell).await
    }
    async fn query_cells(&self, filter: &CellFilter) -> Result<CellPage, RepoError>;
}

// =============================================================================
// Run Storage
// =============================================================================

/// Runs keyed by id: an append-only event list and a single terminal result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunRepo: Send + Sync {
    /// Persist the terminal result. A second result for the same run is a
    /// `ConstraintViolation`.
    async fn save_result(&self, result: &RunResult) -> Result<(), RepoError>;
    async fn get_result(&self, run_id: RunId) -> Result<Option<RunResult>, RepoError>;
    async fn append_events(&self, run_id: RunId, events: &[RunEvent]) -> Result<(), RepoError>;
    async fn get_events(&self, run_id: RunId) -> Result<Vec<RunEvent>, RepoError>;
}

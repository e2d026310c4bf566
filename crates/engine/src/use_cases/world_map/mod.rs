//! World map use cases: bulk generation, lazy exploration, dungeon lookup
//! and cell queries.

mod explore_cell;
mod generate_map;
mod get_dungeon;
mod materialize;
mod query_map;

pub use explore_cell::{ExploreCell, ExploreOptions};
pub use generate_map::{GenerateInitialMap, InitialMap, MapGenerationRequest};
pub use get_dungeon::GetDungeon;
pub use materialize::CellMaterializer;
pub use query_map::QueryMap;

use std::sync::Arc;

use cryptforge_domain::GenerationError;

use crate::infrastructure::ports::RepoError;

/// Container for world map use cases.
pub struct WorldMapUseCases {
    pub generate: Arc<GenerateInitialMap>,
    pub explore: Arc<ExploreCell>,
    pub get_dungeon: Arc<GetDungeon>,
    pub query: Arc<QueryMap>,
}

impl WorldMapUseCases {
    pub fn new(
        generate: Arc<GenerateInitialMap>,
        explore: Arc<ExploreCell>,
        get_dungeon: Arc<GetDungeon>,
        query: Arc<QueryMap>,
    ) -> Self {
        Self {
            generate,
            explore,
            get_dungeon,
            query,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Persistence failed: {0}")]
    Persistence(#[from] RepoError),
}

//! Generate initial map use case.
//!
//! Pre-generates every cell of a region. Cells already stored are returned as
//! they are and never rewritten.

use std::sync::Arc;

use cryptforge_domain::{GenerationError, MapCell, MapDensity, MapRegion};

use super::{CellMaterializer, MapError};
use crate::infrastructure::ports::MapRepo;

#[derive(Debug, Clone, PartialEq)]
pub struct MapGenerationRequest {
    pub seed: String,
    pub region: MapRegion,
    pub density: MapDensity,
    pub include_dungeons: bool,
}

/// Result of pre-generating a region.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialMap {
    /// Every cell of the region in `(x, then y)` order
    pub cells: Vec<MapCell>,
    pub newly_generated: usize,
}

pub struct GenerateInitialMap {
    map_repo: Arc<dyn MapRepo>,
    materializer: Arc<CellMaterializer>,
}

impl GenerateInitialMap {
    pub fn new(map_repo: Arc<dyn MapRepo>, materializer: Arc<CellMaterializer>) -> Self {
        Self {
            map_repo,
            materializer,
        }
    }

    pub async fn execute(&self, request: &MapGenerationRequest) -> Result<InitialMap, MapError> {
        // 1. Reject bad input before anything is written
        if request.seed.is_empty() {
            return Err(GenerationError::EmptySeed.into());
        }
        request.region.validate()?;

        let options = self
            .materializer
            .surface_options(request.density, request.include_dungeons);

        // 2. Walk the region, materializing only missing cells
        let mut cells = Vec::with_capacity(request.region.cell_count() as usize);
        let mut newly_generated = 0;
        for (x, y) in request.region.coordinates() {
            match self.map_repo.get_cell(x, y).await? {
                Some(existing) => cells.push(existing),
                None => {
                    let cell = self
                        .materializer
                        .materialize(&request.seed, x, y, &options)
                        .await?;
                    newly_generated += 1;
                    cells.push(cell);
                }
            }
        }

        tracing::info!(
            seed = %request.seed,
            cells = cells.len(),
            newly_generated,
            "Generated initial map"
        );

        Ok(InitialMap {
            cells,
            newly_generated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryMapRepo;
    use crate::infrastructure::ports::{MockMapRepo, RepoError};
    use crate::infrastructure::world_context::NoopWorldContext;

    fn build(repo: Arc<dyn MapRepo>) -> GenerateInitialMap {
        let materializer = Arc::new(CellMaterializer::new(
            repo.clone(),
            Arc::new(NoopWorldContext),
            2,
        ));
        GenerateInitialMap::new(repo, materializer)
    }

    fn request(seed: &str, region: MapRegion) -> MapGenerationRequest {
        MapGenerationRequest {
            seed: seed.to_string(),
            region,
            density: MapDensity::Normal,
            include_dungeons: true,
        }
    }

    #[tokio::test]
    async fn when_region_is_new_then_every_cell_is_stored_in_order() {
        let repo = Arc::new(InMemoryMapRepo::new());
        let use_case = build(repo.clone());

        let map = use_case
            .execute(&request("atlas", MapRegion::new(-1, 1, 0, 2)))
            .await
            .unwrap();

        assert_eq!(map.newly_generated, 9);
        assert_eq!(repo.cell_count().await, 9);
        let coords: Vec<_> = map.cells.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords[0], (-1, 0));
        assert_eq!(coords[1], (-1, 1));
        assert_eq!(coords[8], (1, 2));

        let with_dungeon = map.cells.iter().filter(|c| c.has_dungeon()).count();
        assert_eq!(repo.dungeon_count().await, with_dungeon);
    }

    #[tokio::test]
    async fn when_region_already_stored_then_nothing_is_regenerated() {
        let repo = Arc::new(InMemoryMapRepo::new());
        let use_case = build(repo.clone());
        let region = MapRegion::new(0, 2, 0, 2);

        let first = use_case.execute(&request("atlas", region)).await.unwrap();
        let second = use_case.execute(&request("atlas", region)).await.unwrap();

        assert_eq!(second.newly_generated, 0);
        assert_eq!(first.cells, second.cells);
    }

    #[tokio::test]
    async fn when_region_is_inverted_then_no_store_call_is_made() {
        let mut repo = MockMapRepo::new();
        repo.expect_get_cell().times(0);
        repo.expect_save_generated().times(0);
        let use_case = build(Arc::new(repo));

        let err = use_case
            .execute(&request("atlas", MapRegion::new(3, 1, 0, 0)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::Generation(GenerationError::InvalidRegion { .. })
        ));
    }

    #[tokio::test]
    async fn when_seed_is_empty_then_generation_error() {
        let use_case = build(Arc::new(MockMapRepo::new()));

        let err = use_case
            .execute(&request("", MapRegion::single(0, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::Generation(GenerationError::EmptySeed)));
    }

    #[tokio::test]
    async fn when_lookup_fails_then_persistence_error() {
        let mut repo = MockMapRepo::new();
        repo.expect_get_cell()
            .returning(|_, _| Err(RepoError::database("get_cell", "locked")));
        let use_case = build(Arc::new(repo));

        let err = use_case
            .execute(&request("atlas", MapRegion::single(0, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::Persistence(_)));
    }
}

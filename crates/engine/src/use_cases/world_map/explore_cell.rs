//! Explore cell use case.
//!
//! Lazy generation on first visit. A stored cell is never regenerated; the
//! only change made to it is recording a new discoverer.

use std::sync::Arc;

use cryptforge_domain::{MapCell, MapDensity};

use super::{CellMaterializer, MapError};
use crate::infrastructure::ports::MapRepo;

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOptions {
    pub seed: String,
    pub discovered_by: Option<String>,
    pub density: MapDensity,
    pub include_dungeons: bool,
}

impl ExploreOptions {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            discovered_by: None,
            density: MapDensity::Normal,
            include_dungeons: true,
        }
    }

    pub fn discovered_by(mut self, explorer: impl Into<String>) -> Self {
        self.discovered_by = Some(explorer.into());
        self
    }
}

pub struct ExploreCell {
    map_repo: Arc<dyn MapRepo>,
    materializer: Arc<CellMaterializer>,
}

impl ExploreCell {
    pub fn new(map_repo: Arc<dyn MapRepo>, materializer: Arc<CellMaterializer>) -> Self {
        Self {
            map_repo,
            materializer,
        }
    }

    pub async fn execute(
        &self,
        x: i32,
        y: i32,
        options: &ExploreOptions,
    ) -> Result<MapCell, MapError> {
        let cell = match self.map_repo.get_cell(x, y).await? {
            Some(cell) => cell,
            None => {
                let surface = self
                    .materializer
                    .surface_options(options.density, options.include_dungeons);
                self.materializer
                    .materialize(&options.seed, x, y, &surface)
                    .await?
            }
        };

        match options.discovered_by.as_deref() {
            Some(explorer) if !cell.is_discovered_by(explorer) => {
                let updated = self
                    .map_repo
                    .record_discovery(x, y, explorer)
                    .await?
                    .ok_or_else(|| MapError::NotFound {
                        entity_type: "MapCell",
                        id: format!("{x},{y}"),
                    })?;
                tracing::debug!(x, y, explorer, "Recorded discovery");
                Ok(updated)
            }
            _ => Ok(cell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryMapRepo;
    use crate::infrastructure::ports::MockMapRepo;
    use crate::infrastructure::world_context::NoopWorldContext;
    use cryptforge_domain::generation::generate_cell;
    use cryptforge_domain::SurfaceOptions;

    fn build(repo: Arc<dyn MapRepo>) -> ExploreCell {
        let materializer = Arc::new(CellMaterializer::new(
            repo.clone(),
            Arc::new(NoopWorldContext),
            4,
        ));
        ExploreCell::new(repo, materializer)
    }

    #[tokio::test]
    async fn when_explored_twice_on_fresh_stores_then_content_matches() {
        for (x, y) in [(0, 0), (7, -3), (-120, 44)] {
            let a = build(Arc::new(InMemoryMapRepo::new()))
                .execute(x, y, &ExploreOptions::new("determinism"))
                .await
                .unwrap();
            let b = build(Arc::new(InMemoryMapRepo::new()))
                .execute(x, y, &ExploreOptions::new("determinism"))
                .await
                .unwrap();
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn when_cell_is_stored_then_it_is_returned_without_regeneration() {
        let stored = generate_cell("idem", 2, 3, &SurfaceOptions::default())
            .unwrap()
            .cell;

        let mut repo = MockMapRepo::new();
        let returned = stored.clone();
        repo.expect_get_cell()
            .withf(|x, y| *x == 2 && *y == 3)
            .times(1)
            .returning(move |_, _| Ok(Some(returned.clone())));
        repo.expect_save_generated().times(0);
        repo.expect_record_discovery().times(0);

        let cell = build(Arc::new(repo))
            .execute(2, 3, &ExploreOptions::new("a-different-seed"))
            .await
            .unwrap();
        assert_eq!(cell, stored);
    }

    #[tokio::test]
    async fn when_new_explorer_visits_then_only_discovery_is_added() {
        let repo = Arc::new(InMemoryMapRepo::new());
        let use_case = build(repo.clone());

        let first = use_case
            .execute(5, 5, &ExploreOptions::new("disc").discovered_by("alice"))
            .await
            .unwrap();
        let second = use_case
            .execute(5, 5, &ExploreOptions::new("disc").discovered_by("bob"))
            .await
            .unwrap();
        let again = use_case
            .execute(5, 5, &ExploreOptions::new("disc").discovered_by("alice"))
            .await
            .unwrap();

        assert_eq!(first.discovered_by, vec!["alice".to_string()]);
        assert_eq!(second.discovered_by, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(again, second);
        assert_eq!(first.features, second.features);
        assert_eq!(first.entrances, second.entrances);
    }

    #[tokio::test]
    async fn when_explorer_already_recorded_then_cell_is_not_rewritten() {
        let mut stored = generate_cell("idem", 0, 0, &SurfaceOptions::default())
            .unwrap()
            .cell;
        stored.record_discovery("alice");

        let mut repo = MockMapRepo::new();
        repo.expect_get_cell()
            .returning(move |_, _| Ok(Some(stored.clone())));
        repo.expect_record_discovery().times(0);

        build(Arc::new(repo))
            .execute(0, 0, &ExploreOptions::new("idem").discovered_by("alice"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn when_explorers_arrive_together_then_both_are_recorded() {
        let repo = Arc::new(InMemoryMapRepo::new());
        let use_case = build(repo.clone());
        use_case
            .execute(8, 1, &ExploreOptions::new("crowd"))
            .await
            .unwrap();

        let alice = ExploreOptions::new("crowd").discovered_by("alice");
        let bob = ExploreOptions::new("crowd").discovered_by("bob");
        let (a, b) = tokio::join!(
            use_case.execute(8, 1, &alice),
            use_case.execute(8, 1, &bob)
        );
        a.unwrap();
        b.unwrap();

        let mut found = repo.get_cell(8, 1).await.unwrap().unwrap().discovered_by;
        found.sort();
        assert_eq!(found, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn when_stored_cell_vanishes_before_discovery_then_not_found() {
        let stored = generate_cell("gone", 1, 1, &SurfaceOptions::default())
            .unwrap()
            .cell;

        let mut repo = MockMapRepo::new();
        repo.expect_get_cell()
            .returning(move |_, _| Ok(Some(stored.clone())));
        repo.expect_record_discovery()
            .withf(|x, y, explorer| *x == 1 && *y == 1 && explorer == "alice")
            .times(1)
            .returning(|_, _, _| Ok(None));

        let err = build(Arc::new(repo))
            .execute(1, 1, &ExploreOptions::new("gone").discovered_by("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::NotFound { .. }));
    }

    #[tokio::test]
    async fn lazy_and_bulk_paths_agree() {
        use crate::use_cases::world_map::{GenerateInitialMap, MapGenerationRequest};
        use cryptforge_domain::MapRegion;

        let bulk_repo: Arc<dyn MapRepo> = Arc::new(InMemoryMapRepo::new());
        let materializer = Arc::new(CellMaterializer::new(
            bulk_repo.clone(),
            Arc::new(NoopWorldContext),
            4,
        ));
        let bulk = GenerateInitialMap::new(bulk_repo, materializer)
            .execute(&MapGenerationRequest {
                seed: "same".into(),
                region: MapRegion::new(0, 3, 0, 3),
                density: MapDensity::Normal,
                include_dungeons: true,
            })
            .await
            .unwrap();

        let lazy = build(Arc::new(InMemoryMapRepo::new()));
        for cell in bulk.cells {
            let explored = lazy
                .execute(cell.x, cell.y, &ExploreOptions::new("same"))
                .await
                .unwrap();
            assert_eq!(explored, cell);
        }
    }
}

//! Query map use case.

use std::sync::Arc;

use super::MapError;
use crate::infrastructure::ports::{CellFilter, CellPage, MapRepo, MAX_PAGE_LIMIT};

pub struct QueryMap {
    map_repo: Arc<dyn MapRepo>,
}

impl QueryMap {
    pub fn new(map_repo: Arc<dyn MapRepo>) -> Self {
        Self { map_repo }
    }

    /// Stored cells matching `filter`, ordered by `(x, then y)`.
    pub async fn execute(&self, mut filter: CellFilter) -> Result<CellPage, MapError> {
        filter.limit = filter.limit.min(MAX_PAGE_LIMIT);
        Ok(self.map_repo.query_cells(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryMapRepo;
    use crate::infrastructure::ports::MockMapRepo;
    use crate::infrastructure::world_context::NoopWorldContext;
    use crate::use_cases::world_map::{CellMaterializer, ExploreCell, ExploreOptions};
    use cryptforge_domain::MapRegion;

    #[tokio::test]
    async fn when_paging_then_pages_cover_the_region_once() {
        let repo: Arc<dyn MapRepo> = Arc::new(InMemoryMapRepo::new());
        let materializer = Arc::new(CellMaterializer::new(
            repo.clone(),
            Arc::new(NoopWorldContext),
            2,
        ));
        let explore = ExploreCell::new(repo.clone(), materializer);
        for x in 0..4 {
            for y in 0..3 {
                let options = if x == 1 {
                    ExploreOptions::new("pages").discovered_by("scout")
                } else {
                    ExploreOptions::new("pages")
                };
                explore.execute(x, y, &options).await.unwrap();
            }
        }
        let query = QueryMap::new(repo);

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = query
                .execute(CellFilter {
                    region: Some(MapRegion::new(0, 3, 0, 2)),
                    offset,
                    limit: 5,
                    ..CellFilter::default()
                })
                .await
                .unwrap();
            assert_eq!(page.total, 12);
            seen.extend(page.cells.iter().map(|c| (c.x, c.y)));
            offset += page.cells.len();
            if !page.has_more {
                break;
            }
        }
        let mut expected: Vec<_> = (0..4).flat_map(|x| (0..3).map(move |y| (x, y))).collect();
        expected.sort();
        assert_eq!(seen, expected);

        let scouted = query
            .execute(CellFilter {
                discovered_by: Some("scout".into()),
                ..CellFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(scouted.total, 3);
        assert!(scouted.cells.iter().all(|c| c.x == 1));
    }

    #[tokio::test]
    async fn when_limit_is_huge_then_it_is_clamped() {
        let mut repo = MockMapRepo::new();
        repo.expect_query_cells()
            .withf(|f| f.limit == MAX_PAGE_LIMIT)
            .times(1)
            .returning(|_| {
                Ok(CellPage {
                    cells: Vec::new(),
                    total: 0,
                    has_more: false,
                })
            });

        QueryMap::new(Arc::new(repo))
            .execute(CellFilter {
                limit: 1_000_000,
                ..CellFilter::default()
            })
            .await
            .unwrap();
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cryptforge_domain::{Dungeon, DungeonId, MapCell};

use crate::infrastructure::ports::{CellFilter, CellPage, MapRepo, RepoError};

/// Map storage backed by two hash maps.
#[derive(Default)]
pub struct InMemoryMapRepo {
    cells: RwLock<HashMap<(i32, i32), MapCell>>,
    dungeons: RwLock<HashMap<DungeonId, Dungeon>>,
}

impl InMemoryMapRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cell_count(&self) -> usize {
        self.cells.read().await.len()
    }

    pub async fn dungeon_count(&self) -> usize {
        self.dungeons.read().await.len()
    }
}

#[async_trait]
impl MapRepo for InMemoryMapRepo {
    async fn get_cell(&self, x: i32, y: i32) -> Result<Option<MapCell>, RepoError> {
        Ok(self.cells.read().await.get(&(x, y)).cloned())
    }

    async fn save_cell(&self, cell: &MapCell) -> Result<MapCell, RepoError> {
        Ok(self
            .cells
            .write()
            .await
            .entry((cell.x, cell.y))
            .or_insert_with(|| cell.clone())
            .clone())
    }

    async fn record_discovery(
        &self,
        x: i32,
        y: i32,
        explorer: &str,
    ) -> Result<Option<MapCell>, RepoError> {
        let mut cells = self.cells.write().await;
        Ok(cells.get_mut(&(x, y)).map(|cell| {
            cell.record_discovery(explorer);
            cell.clone()
        }))
    }

    async fn get_dungeon(&self, id: &DungeonId) -> Result<Option<Dungeon>, RepoError> {
        Ok(self.dungeons.read().await.get(id).cloned())
    }

    async fn save_dungeon(&self, dungeon: &Dungeon) -> Result<(), RepoError> {
        self.dungeons
            .write()
            .await
            .insert(dungeon.id.clone(), dungeon.clone());
        Ok(())
    }

    async fn query_cells(&self, filter: &CellFilter) -> Result<CellPage, RepoError> {
        let matching: Vec<MapCell> = self
            .cells
            .read()
            .await
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        Ok(filter.paginate(matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptforge_domain::generation::generate_cell;
    use cryptforge_domain::SurfaceOptions;

    fn cell(x: i32, y: i32) -> MapCell {
        generate_cell("store", x, y, &SurfaceOptions::default())
            .unwrap()
            .cell
    }

    #[tokio::test]
    async fn first_saved_cell_is_kept() {
        let repo = InMemoryMapRepo::new();
        let mut first = cell(1, 1);
        first.record_discovery("alice");
        repo.save_cell(&first).await.unwrap();

        let stored = repo.save_cell(&cell(1, 1)).await.unwrap();

        assert_eq!(stored, first);
        assert_eq!(repo.cell_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_discoveries_are_all_kept() {
        let repo = InMemoryMapRepo::new();
        repo.save_cell(&cell(2, 2)).await.unwrap();

        let (a, b) = tokio::join!(
            repo.record_discovery(2, 2, "alice"),
            repo.record_discovery(2, 2, "bob"),
        );
        a.unwrap();
        b.unwrap();
        repo.record_discovery(2, 2, "alice").await.unwrap();

        let mut found = repo.get_cell(2, 2).await.unwrap().unwrap().discovered_by;
        found.sort();
        assert_eq!(found, vec!["alice".to_string(), "bob".to_string()]);
        assert!(repo.record_discovery(9, 9, "carol").await.unwrap().is_none());
    }
}

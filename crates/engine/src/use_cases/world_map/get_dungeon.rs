//! Get dungeon use case.

use std::sync::Arc;

use cryptforge_domain::Dungeon;

use super::MapError;
use crate::infrastructure::ports::MapRepo;

/// Resolve the structure behind an entrance.
///
/// `z < 0` selects the descending dungeon of the cell, `z > 0` the tower,
/// `z == 0` whichever entrance comes first.
pub struct GetDungeon {
    map_repo: Arc<dyn MapRepo>,
}

impl GetDungeon {
    pub fn new(map_repo: Arc<dyn MapRepo>) -> Self {
        Self { map_repo }
    }

    pub async fn execute(&self, x: i32, y: i32, z: i32) -> Result<Option<Dungeon>, MapError> {
        let Some(cell) = self.map_repo.get_cell(x, y).await? else {
            return Ok(None);
        };
        let Some(entrance) = cell.entrance_for_z(z) else {
            return Ok(None);
        };

        match self.map_repo.get_dungeon(&entrance.dungeon_id).await? {
            Some(dungeon) => Ok(Some(dungeon)),
            None => {
                tracing::warn!(
                    x,
                    y,
                    dungeon_id = %entrance.dungeon_id,
                    "Entrance references a missing dungeon"
                );
                Err(MapError::NotFound {
                    entity_type: "Dungeon",
                    id: entrance.dungeon_id.to_string(),
                })
            }
        }
    }
}

//! The single write path for freshly generated cells.
//!
//! Bulk generation and lazy exploration both go through here, so a cell has
//! the same content whichever way it was first reached.

use std::sync::Arc;

use cryptforge_domain::generation::generate_cell;
use cryptforge_domain::{GeneratedCell, MapCell, MapDensity, SurfaceOptions};

use super::MapError;
use crate::infrastructure::ports::{MapRepo, WorldContext};

pub struct CellMaterializer {
    map_repo: Arc<dyn MapRepo>,
    world: Arc<dyn WorldContext>,
    dungeon_depth: u32,
}

impl CellMaterializer {
    pub fn new(
        map_repo: Arc<dyn MapRepo>,
        world: Arc<dyn WorldContext>,
        dungeon_depth: u32,
    ) -> Self {
        Self {
            map_repo,
            world,
            dungeon_depth,
        }
    }

    pub fn surface_options(&self, density: MapDensity, include_dungeons: bool) -> SurfaceOptions {
        SurfaceOptions {
            density,
            include_dungeons,
            dungeon_depth: self.dungeon_depth,
        }
    }

    /// Generate the cell at `(x, y)` and store it with its dungeons.
    ///
    /// The cell is not written if any of its dungeons failed to save. When
    /// another writer stored the cell first, that cell is returned.
    pub async fn materialize(
        &self,
        seed: &str,
        x: i32,
        y: i32,
        options: &SurfaceOptions,
    ) -> Result<MapCell, MapError> {
        let GeneratedCell {
            mut cell,
            mut dungeons,
        } = generate_cell(seed, x, y, options)?;

        for dungeon in &mut dungeons {
            if let Some(name) = self.world.dungeon_name(dungeon).await {
                for entrance in cell
                    .entrances
                    .iter_mut()
                    .filter(|e| e.dungeon_id == dungeon.id)
                {
                    entrance.name = name.clone();
                }
                dungeon.name = name;
            }
        }

        let stored = self.map_repo.save_generated(&cell, &dungeons).await?;
        for dungeon in &dungeons {
            tracing::debug!(
                dungeon_id = %dungeon.id,
                x,
                y,
                depth = dungeon.depth,
                "Stored dungeon"
            );
            self.world.dungeon_generated(dungeon).await;
        }
        tracing::debug!(x, y, features = stored.features.len(), "Stored cell");
        self.world.cell_generated(&stored).await;

        Ok(stored)
    }
}

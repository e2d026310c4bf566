//! World context adapters.
//!
//! `NoopWorldContext` is the default. `RegistryWorldContext` records generated
//! dungeons and their entrance cells in the provenance registry so they can be
//! traced back to the world that produced them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use tokio::sync::RwLock;

use cryptforge_domain::{
    Dungeon, EntityData, EntityEvent, EntityRegistry, EntityType, MapCell,
};

use crate::infrastructure::ports::{ClockPort, WorldContext};

/// Ignores every notification and never renames anything.
#[derive(Debug, Default)]
pub struct NoopWorldContext;

#[async_trait]
impl WorldContext for NoopWorldContext {
    async fn dungeon_name(&self, _dungeon: &Dungeon) -> Option<String> {
        None
    }

    async fn dungeon_generated(&self, _dungeon: &Dungeon) {}

    async fn cell_generated(&self, _cell: &MapCell) {}
}

fn cell_entity_id(x: i32, y: i32) -> String {
    format!("cell-{x}-{y}")
}

/// Registers generated content in a shared `EntityRegistry`.
pub struct RegistryWorldContext {
    registry: Arc<RwLock<EntityRegistry>>,
    world_entity_id: String,
    clock: Arc<dyn ClockPort>,
}

impl RegistryWorldContext {
    /// Registers the world entity for `world_seed` unless it already exists.
    pub async fn new(
        registry: Arc<RwLock<EntityRegistry>>,
        world_seed: &str,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let world_entity_id = format!("world-{world_seed}");
        {
            let mut guard = registry.write().await;
            if guard.get(&world_entity_id).is_none() {
                guard.register(
                    EntityData::new(&world_entity_id, EntityType::World, world_seed)
                        .with_description(format!("World generated from seed '{world_seed}'")),
                );
            }
        }
        Self {
            registry,
            world_entity_id,
            clock,
        }
    }

    pub fn world_entity_id(&self) -> &str {
        &self.world_entity_id
    }

    pub fn registry(&self) -> Arc<RwLock<EntityRegistry>> {
        Arc::clone(&self.registry)
    }

    fn year(&self) -> i64 {
        i64::from(self.clock.now().year())
    }
}

#[async_trait]
impl WorldContext for RegistryWorldContext {
    async fn dungeon_name(&self, dungeon: &Dungeon) -> Option<String> {
        self.registry
            .read()
            .await
            .get(dungeon.id.as_str())
            .map(|entity| entity.name.clone())
    }

    async fn dungeon_generated(&self, dungeon: &Dungeon) {
        let mut registry = self.registry.write().await;
        if registry.get(dungeon.id.as_str()).is_some() {
            return;
        }

        let location = cell_entity_id(dungeon.entrance_x, dungeon.entrance_y);
        registry.register(
            EntityData::new(dungeon.id.as_str(), EntityType::Dungeon, &dungeon.name)
                .with_description(format!(
                    "A {} of {} levels",
                    dungeon.kind.as_str(),
                    dungeon.depth
                ))
                .with_origin(&self.world_entity_id)
                .with_location(&location)
                .with_event(EntityEvent::new(
                    self.year(),
                    format!("Discovered at {location}"),
                )),
        );
        tracing::debug!(dungeon_id = %dungeon.id, "Registered dungeon provenance");
    }

    async fn cell_generated(&self, cell: &MapCell) {
        // Only cells with an entrance are worth a node in the graph
        if !cell.has_dungeon() {
            return;
        }
        let id = cell_entity_id(cell.x, cell.y);
        let mut registry = self.registry.write().await;
        if registry.get(&id).is_some() {
            return;
        }
        let name = cell
            .features
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_else(|| format!("Wilds at {}, {}", cell.x, cell.y));
        registry.register(
            EntityData::new(&id, EntityType::Location, name)
                .with_origin(&self.world_entity_id)
                .with_event(EntityEvent::new(self.year(), "Charted")),
        );
    }
}

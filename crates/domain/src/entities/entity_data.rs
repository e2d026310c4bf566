//! Provenance graph nodes.
//!
//! Relationships (`creator_id`, `origin_id`) are ids looked up through the
//! registry, never owned references, so cycles in the data cannot create
//! cycles in ownership.

use serde::{Deserialize, Serialize};

/// Narrative category of a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Deity,
    Character,
    Creature,
    Race,
    Faction,
    Artifact,
    Location,
    Dungeon,
    World,
}

/// A node of the provenance graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub creator_id: Option<String>,
    pub origin_id: Option<String>,
    pub location: Option<String>,
    pub race: Option<String>,
    /// Sorted by `year`, ties kept in insertion order
    #[serde(default)]
    pub events: Vec<EntityEvent>,
}

impl EntityData {
    pub fn new(
        entity_id: impl Into<String>,
        entity_type: EntityType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
            name: name.into(),
            description: String::new(),
            creator_id: None,
            origin_id: None,
            location: None,
            race: None,
            events: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_creator(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = Some(creator_id.into());
        self
    }

    pub fn with_origin(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_race(mut self, race: impl Into<String>) -> Self {
        self.race = Some(race.into());
        self
    }

    pub fn with_event(mut self, event: EntityEvent) -> Self {
        self.events.push(event);
        self.events.sort_by_key(|e| e.year);
        self
    }
}

/// Something that happened to an entity in a given in-world year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEvent {
    pub year: i64,
    pub description: String,
}

impl EntityEvent {
    pub fn new(year: i64, description: impl Into<String>) -> Self {
        Self {
            year,
            description: description.into(),
        }
    }
}

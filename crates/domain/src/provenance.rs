//! Provenance graph over generated and narrative entities.
//!
//! Nodes live in a flat map keyed by id; `creator_id` / `origin_id` edges are
//! plain ids resolved on lookup. Secondary indexes (type, race, creator) are
//! kept in `BTreeSet`s so every listing comes back in id order.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::entities::{EntityData, EntityEvent, EntityType};
use crate::error::DomainError;

#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    entities: HashMap<String, EntityData>,
    by_type: HashMap<EntityType, BTreeSet<String>>,
    by_race: HashMap<String, BTreeSet<String>>,
    by_creator: HashMap<String, BTreeSet<String>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert an entity, overwriting any entity with the same id.
    ///
    /// Overwriting is a caller error the registry does not guard against; the
    /// replaced entity is returned so callers can detect it.
    pub fn register(&mut self, mut data: EntityData) -> Option<EntityData> {
        let previous = self.entities.remove(&data.entity_id);
        if let Some(old) = &previous {
            self.unindex(old);
        }
        data.events.sort_by_key(|e| e.year);
        self.index(&data);
        self.entities.insert(data.entity_id.clone(), data);
        previous
    }

    pub fn get(&self, id: &str) -> Option<&EntityData> {
        self.entities.get(id)
    }

    pub fn by_type(&self, entity_type: EntityType) -> Vec<&EntityData> {
        self.resolve(self.by_type.get(&entity_type))
    }

    pub fn by_race(&self, race: &str) -> Vec<&EntityData> {
        self.resolve(self.by_race.get(race))
    }

    /// Entities whose `creator_id` is `id`.
    pub fn created_by(&self, id: &str) -> Vec<&EntityData> {
        self.resolve(self.by_creator.get(id))
    }

    /// Append an event, keeping the log stably sorted by year.
    pub fn add_event(&mut self, id: &str, event: EntityEvent) -> Result<(), DomainError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Entity", id))?;
        entity.events.push(event);
        entity.events.sort_by_key(|e| e.year);
        Ok(())
    }

    /// Ancestry of `id`, starting with the entity itself.
    ///
    /// Follows `creator_id`, falling back to `origin_id`. Stops at the first
    /// missing link or at an id already on the chain, returning what was
    /// collected so far.
    pub fn provenance_chain(&self, id: &str) -> Vec<&EntityData> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = self.entities.get(id);

        while let Some(entity) = current {
            if !visited.insert(entity.entity_id.as_str()) {
                break;
            }
            chain.push(entity);
            current = entity
                .creator_id
                .as_deref()
                .or(entity.origin_id.as_deref())
                .and_then(|next| self.entities.get(next));
        }

        chain
    }

    /// Creator, origin, location, created entities and same-race entities.
    ///
    /// Used for cross-linking in listings, never for simulation logic.
    pub fn related(&self, id: &str) -> Vec<&EntityData> {
        let Some(entity) = self.entities.get(id) else {
            return Vec::new();
        };

        let mut ids: BTreeSet<&str> = BTreeSet::new();
        ids.extend(entity.creator_id.as_deref());
        ids.extend(entity.origin_id.as_deref());
        ids.extend(entity.location.as_deref());
        if let Some(created) = self.by_creator.get(id) {
            ids.extend(created.iter().map(String::as_str));
        }
        if let Some(kin) = entity.race.as_deref().and_then(|r| self.by_race.get(r)) {
            ids.extend(kin.iter().map(String::as_str));
        }
        ids.remove(id);

        ids.into_iter()
            .filter_map(|related| self.entities.get(related))
            .collect()
    }

    /// Case-insensitive substring search over id, name and description.
    pub fn search(&self, query: &str) -> Vec<&EntityData> {
        let needle = query.to_lowercase();
        let mut hits: Vec<&EntityData> = self
            .entities
            .values()
            .filter(|e| {
                e.entity_id.to_lowercase().contains(&needle)
                    || e.name.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .collect();
        hits.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        hits
    }

    fn resolve(&self, ids: Option<&BTreeSet<String>>) -> Vec<&EntityData> {
        ids.map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    fn index(&mut self, data: &EntityData) {
        let id = data.entity_id.clone();
        self.by_type
            .entry(data.entity_type)
            .or_default()
            .insert(id.clone());
        if let Some(race) = &data.race {
            self.by_race.entry(race.clone()).or_default().insert(id.clone());
        }
        if let Some(creator) = &data.creator_id {
            self.by_creator.entry(creator.clone()).or_default().insert(id);
        }
    }

    fn unindex(&mut self, data: &EntityData) {
        if let Some(ids) = self.by_type.get_mut(&data.entity_type) {
            ids.remove(&data.entity_id);
        }
        if let Some(ids) = data.race.as_ref().and_then(|r| self.by_race.get_mut(r)) {
            ids.remove(&data.entity_id);
        }
        if let Some(ids) = data
            .creator_id
            .as_ref()
            .and_then(|c| self.by_creator.get_mut(c))
        {
            ids.remove(&data.entity_id);
        }
    }
}

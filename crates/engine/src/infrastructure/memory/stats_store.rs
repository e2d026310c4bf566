use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cryptforge_domain::{HeroRef, PartyMember, StatDeltas};

use crate::infrastructure::ports::{RepoError, StatsPort};

/// A delta written through the stats port, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsWrite {
    pub hero: HeroRef,
    pub deltas: StatDeltas,
    pub reason: String,
}

/// Hero stats held in memory.
#[derive(Default)]
pub struct InMemoryStatsStore {
    heroes: RwLock<HashMap<HeroRef, PartyMember>>,
    writes: RwLock<Vec<StatsWrite>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, member: PartyMember) {
        self.heroes
            .write()
            .await
            .insert(member.hero.clone(), member);
    }

    pub async fn get(&self, hero: &HeroRef) -> Option<PartyMember> {
        self.heroes.read().await.get(hero).cloned()
    }

    /// Every delta applied so far, in order.
    pub async fn writes(&self) -> Vec<StatsWrite> {
        self.writes.read().await.clone()
    }
}

#[async_trait]
impl StatsPort for InMemoryStatsStore {
    async fn get_party(&self, heroes: &[HeroRef]) -> Result<Vec<PartyMember>, RepoError> {
        let stored = self.heroes.read().await;
        heroes
            .iter()
            .map(|hero| {
                stored
                    .get(hero)
                    .cloned()
                    .ok_or_else(|| RepoError::not_found("Hero", hero))
            })
            .collect()
    }

    async fn apply_deltas(
        &self,
        hero: &HeroRef,
        deltas: StatDeltas,
        reason: &str,
    ) -> Result<(), RepoError> {
        let mut heroes = self.heroes.write().await;
        let member = heroes
            .get_mut(hero)
            .ok_or_else(|| RepoError::not_found("Hero", hero))?;
        member.apply(&deltas);
        drop(heroes);

        self.writes.write().await.push(StatsWrite {
            hero: hero.clone(),
            deltas,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn restore(&self, hero: &HeroRef, health: u32, mana: u32) -> Result<(), RepoError> {
        let mut heroes = self.heroes.write().await;
        let member = heroes
            .get_mut(hero)
            .ok_or_else(|| RepoError::not_found("Hero", hero))?;
        member.health = health.min(member.max_health);
        member.mana = mana.min(member.max_mana);
        Ok(())
    }
}

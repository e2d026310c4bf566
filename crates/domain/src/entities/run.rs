//! Dungeon run jobs, results and the typed run event log.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::dungeon::{Encounter, EncounterKind, Rarity, RoomType};
use crate::entities::party::{PartyDelta, PartyMember};
use crate::error::PartyError;
use crate::ids::{DungeonId, HeroRef, RunId};

/// Hard cap on levels executed by one run, whatever the dungeon depth.
pub const MAX_RUN_LEVELS: u32 = 100;

/// A request to run a party through a dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJob {
    pub run_id: RunId,
    pub dungeon_id: DungeonId,
    /// Party in marching order
    pub party: Vec<HeroRef>,
    pub seed: String,
    pub start_time: DateTime<Utc>,
}

impl RunJob {
    /// A party needs at least one hero and may list each hero only once.
    pub fn check_party(&self) -> Result<(), PartyError> {
        if self.party.is_empty() {
            return Err(PartyError::Empty);
        }
        let mut seen = HashSet::with_capacity(self.party.len());
        match self.party.iter().find(|hero| !seen.insert(*hero)) {
            Some(hero) => Err(PartyError::DuplicateHero(hero.clone())),
            None => Ok(()),
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Victory,
    Defeat,
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Victory => "victory",
            RunStatus::Defeat => "defeat",
            RunStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of a run's ordered event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    CombatVictory {
        level: u32,
        encounter: EncounterKind,
        monsters: u32,
        xp_awarded: u64,
    },
    CombatDefeat {
        level: u32,
        encounter: EncounterKind,
    },
    TrapDisarmed {
        level: u32,
        xp_awarded: u64,
    },
    TrapTriggered {
        level: u32,
        damage: u32,
    },
    TreasureFound {
        level: u32,
        item: LootItem,
    },
    Rest {
        level: u32,
    },
    RoomExplored {
        level: u32,
        room_type: RoomType,
    },
    PartyWipe {
        level: u32,
    },
    Error {
        message: String,
    },
}

impl RunEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::CombatVictory { .. } => "combat_victory",
            RunEvent::CombatDefeat { .. } => "combat_defeat",
            RunEvent::TrapDisarmed { .. } => "trap_disarmed",
            RunEvent::TrapTriggered { .. } => "trap_triggered",
            RunEvent::TreasureFound { .. } => "treasure_found",
            RunEvent::Rest { .. } => "rest",
            RunEvent::RoomExplored { .. } => "room_explored",
            RunEvent::PartyWipe { .. } => "party_wipe",
            RunEvent::Error { .. } => "error",
        }
    }

    pub fn level(&self) -> Option<u32> {
        match self {
            RunEvent::CombatVictory { level, .. }
            | RunEvent::CombatDefeat { level, .. }
            | RunEvent::TrapDisarmed { level, .. }
            | RunEvent::TrapTriggered { level, .. }
            | RunEvent::TreasureFound { level, .. }
            | RunEvent::Rest { level }
            | RunEvent::RoomExplored { level, .. }
            | RunEvent::PartyWipe { level } => Some(*level),
            RunEvent::Error { .. } => None,
        }
    }
}

/// Outcome of a finished run. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: RunId,
    pub dungeon_id: DungeonId,
    pub status: RunStatus,
    pub levels_completed: u32,
    pub total_xp: u64,
    pub events: Vec<RunEvent>,
    pub final_party: Vec<PartyMember>,
    /// Shared party inventory collected during the run
    pub inventory: Vec<LootItem>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// Terminal error result: no progress, a single `error` event.
    pub fn error(
        run_id: RunId,
        dungeon_id: DungeonId,
        message: impl Into<String>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            dungeon_id,
            status: RunStatus::Error,
            levels_completed: 0,
            total_xp: 0,
            events: vec![RunEvent::Error {
                message: message.into(),
            }],
            final_party: Vec::new(),
            inventory: Vec::new(),
            finished_at,
        }
    }
}

/// How the orchestrator resolves a room. Exhaustively matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Combat,
    MidBoss,
    Boss,
    Trap,
    Treasure,
    Safe,
    Explore,
}

/// The room a run resolves on one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRoom {
    pub level: u32,
    pub room_type: RoomType,
    pub kind: RoomKind,
    pub encounter: Option<Encounter>,
}

/// A single monster handed to the encounter resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub attack: u32,
}

/// An item produced by the loot generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootItem {
    pub name: String,
    pub rarity: Rarity,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStatus {
    Victory,
    Defeat,
}

/// Result of combat resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatOutcome {
    pub status: CombatStatus,
    pub party_deltas: Vec<PartyDelta>,
    pub xp_awarded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapStatus {
    Disarmed,
    Triggered,
}

/// Result of trap resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrapOutcome {
    pub status: TrapStatus,
    pub damage: u32,
    pub party_deltas: Vec<PartyDelta>,
    pub xp_awarded: u64,
}

/// Lease on a hero held by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroLock {
    pub hero: HeroRef,
    pub run_id: RunId,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl HeroLock {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn error_result_has_single_error_event_and_no_progress() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let result = RunResult::error(RunId::new(), DungeonId::from("d"), "boom", now);
        assert_eq!(result.status, RunStatus::Error);
        assert_eq!(result.levels_completed, 0);
        assert_eq!(result.total_xp, 0);
        assert_eq!(
            result.events,
            vec![RunEvent::Error {
                message: "boom".to_string()
            }]
        );
    }

    #[test]
    fn party_listing_a_hero_twice_is_rejected() {
        let hero = HeroRef::new("0xabc", 1);
        let mut job = RunJob {
            run_id: RunId::new(),
            dungeon_id: DungeonId::from("d"),
            party: vec![hero.clone(), HeroRef::new("0xabc", 2), hero.clone()],
            seed: "s".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        };
        assert_eq!(job.check_party(), Err(PartyError::DuplicateHero(hero)));

        job.party.pop();
        assert_eq!(job.check_party(), Ok(()));
        job.party.clear();
        assert_eq!(job.check_party(), Err(PartyError::Empty));
    }

    #[test]
    fn run_event_serializes_with_type_tag() {
        let event = RunEvent::PartyWipe { level: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "party_wipe");
        assert_eq!(json["level"], 3);
        assert_eq!(event.name(), "party_wipe");
    }

    #[test]
    fn lease_expires_at_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let lock = HeroLock {
            hero: HeroRef::new("0xabc", 1),
            run_id: RunId::new(),
            acquired_at: now,
            expires_at: now + Duration::hours(1),
        };
        assert!(!lock.is_expired(now));
        assert!(lock.is_expired(now + Duration::hours(1)));
    }
}

//! Cryptforge domain layer: ids, errors, value types and the pure generators.
//!
//! Nothing in this crate performs I/O or awaits.

pub mod entities;
pub mod error;
pub mod generation;
pub mod ids;
pub mod provenance;
pub mod rng;

pub use entities::{
    any_alive, CombatOutcome, CombatStatus, Dungeon, DungeonEntrance, DungeonKind, DungeonLevel,
    Encounter, EncounterKind, EntityData, EntityEvent, EntityType, FeatureType, HeroLock,
    LevelConnection, LootEntry, LootItem, MapCell, MapDensity, MapFeature, MapRegion, Monster,
    MonsterSpec, PartyDelta, PartyMember, PassageDirection, Rarity, Room, RoomConnection,
    RoomKind, RoomType, RunEvent, RunJob, RunResult, RunRoom, RunStatus, StairDirection,
    StatDeltas, TrapOutcome, TrapStatus, DEFAULT_DUNGEON_DEPTH, MAX_GENERATED_DEPTH,
    MAX_REGION_CELLS, MAX_RUN_LEVELS,
};
pub use error::{DomainError, GenerationError, PartyError};
pub use generation::{GeneratedCell, SurfaceOptions};
pub use ids::{DungeonId, HeroRef, QueueItemId, RunId};
pub use provenance::EntityRegistry;
pub use rng::DeterministicRng;

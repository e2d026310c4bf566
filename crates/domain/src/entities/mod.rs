//! Domain entities.

pub mod dungeon;
pub mod entity_data;
pub mod map_cell;
pub mod party;
pub mod run;

pub use dungeon::{
    Dungeon, DungeonLevel, Encounter, EncounterKind, LevelConnection, LootEntry, MonsterSpec,
    PassageDirection, Rarity, Room, RoomConnection, RoomType, StairDirection,
    DEFAULT_DUNGEON_DEPTH, MAX_GENERATED_DEPTH,
};
pub use entity_data::{EntityData, EntityEvent, EntityType};
pub use map_cell::{
    DungeonEntrance, DungeonKind, FeatureType, MapCell, MapDensity, MapFeature, MapRegion,
    MAX_REGION_CELLS,
};
pub use party::{any_alive, PartyDelta, PartyMember, StatDeltas};
pub use run::{
    CombatOutcome, CombatStatus, HeroLock, LootItem, Monster, RoomKind, RunEvent, RunJob,
    RunResult, RunRoom, RunStatus, TrapOutcome, TrapStatus, MAX_RUN_LEVELS,
};

//! Multi-level dungeon and tower structures.
//!
//! Levels are numbered by `z`: dungeons descend (`z = -1, -2, ...`), towers
//! ascend (`z = 1, 2, ...`). `z = 0` is the surface.

use serde::{Deserialize, Serialize};

use crate::entities::map_cell::DungeonKind;
use crate::ids::DungeonId;

/// Default number of levels of a generated dungeon.
pub const DEFAULT_DUNGEON_DEPTH: u32 = 100;

/// Largest depth the generator accepts.
pub const MAX_GENERATED_DEPTH: u32 = 1000;

/// A generated dungeon or tower. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dungeon {
    pub id: DungeonId,
    pub kind: DungeonKind,
    pub name: String,
    pub entrance_x: i32,
    pub entrance_y: i32,
    pub seed: String,
    /// Nominal depth. May exceed the number of materialized `levels`.
    pub depth: u32,
    /// Materialized levels ordered by |z| ascending
    pub levels: Vec<DungeonLevel>,
}

impl Dungeon {
    /// Level at distance `n` (1-based) from the surface, if materialized.
    pub fn level(&self, n: u32) -> Option<&DungeonLevel> {
        self.levels.iter().find(|l| l.z.unsigned_abs() == n)
    }
}

/// One floor of a dungeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonLevel {
    pub z: i32,
    pub seed: String,
    /// Room 0 is always the entrance
    pub rooms: Vec<Room>,
    pub connections: Vec<LevelConnection>,
}

impl DungeonLevel {
    pub fn entrance(&self) -> Option<&Room> {
        self.rooms.first()
    }
}

/// Room type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Entrance,
    Chamber,
    Corridor,
    BossRoom,
    TreasureRoom,
    TrapRoom,
    PuzzleRoom,
    Exit,
}

impl RoomType {
    /// Types a non-entrance room may draw from. Order is part of the seed contract.
    pub const NON_ENTRANCE: [RoomType; 7] = [
        RoomType::Chamber,
        RoomType::Corridor,
        RoomType::BossRoom,
        RoomType::TreasureRoom,
        RoomType::TrapRoom,
        RoomType::PuzzleRoom,
        RoomType::Exit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Entrance => "entrance",
            RoomType::Chamber => "chamber",
            RoomType::Corridor => "corridor",
            RoomType::BossRoom => "boss_room",
            RoomType::TreasureRoom => "treasure_room",
            RoomType::TrapRoom => "trap_room",
            RoomType::PuzzleRoom => "puzzle_room",
            RoomType::Exit => "exit",
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room node. Connections are directed and not necessarily symmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub index: u32,
    pub room_type: RoomType,
    pub connections: Vec<RoomConnection>,
    pub encounter: Option<Encounter>,
    pub loot: Vec<LootEntry>,
}

impl Room {
    pub fn connects_to(&self, target: u32) -> bool {
        self.connections.iter().any(|c| c.target == target)
    }
}

/// Directed edge between two rooms of the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConnection {
    pub target: u32,
    pub direction: PassageDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassageDirection {
    Forward,
    Back,
}

/// Staircase between adjacent levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConnection {
    pub from_room: u32,
    pub to_z: i32,
    pub to_room: u32,
    pub direction: StairDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StairDirection {
    /// Toward z = 0
    TowardSurface,
    /// Away from z = 0
    AwayFromSurface,
}

/// Encounter metadata attached to a room at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub kind: EncounterKind,
    pub difficulty: u32,
    pub monsters: Vec<MonsterSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    Combat,
    MidBoss,
    Boss,
    Trap,
}

/// A group of identical monsters in an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterSpec {
    pub name: String,
    pub level: u32,
    pub count: u32,
}

/// Loot placed in a room at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootEntry {
    pub name: String,
    pub rarity: Rarity,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Floor rarity for loot placed at distance `n` from the surface.
    pub fn floor_for_level(n: u32) -> Rarity {
        match n {
            0..=19 => Rarity::Common,
            20..=39 => Rarity::Uncommon,
            40..=59 => Rarity::Rare,
            60..=84 => Rarity::Epic,
            _ => Rarity::Legendary,
        }
    }

    /// One tier up, saturating at legendary.
    pub fn upgrade(self) -> Rarity {
        match self {
            Rarity::Common => Rarity::Uncommon,
            Rarity::Uncommon => Rarity::Rare,
            Rarity::Rare => Rarity::Epic,
            Rarity::Epic | Rarity::Legendary => Rarity::Legendary,
        }
    }
}

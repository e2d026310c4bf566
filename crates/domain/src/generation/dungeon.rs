//! Multi-level dungeon and tower structure generation.

use crate::entities::{
    Dungeon, DungeonKind, DungeonLevel, Encounter, EncounterKind, LevelConnection, LootEntry,
    MonsterSpec, PassageDirection, Rarity, Room, RoomConnection, RoomType, StairDirection,
    MAX_GENERATED_DEPTH,
};
use crate::error::GenerationError;
use crate::rng::{derive_seed, DeterministicRng};

const MIN_ROOMS: u32 = 5;
const MAX_ROOMS: u32 = 14;
const EARLY_BOSS_CHANCE: f64 = 0.05;
const REVERSE_EDGE_CHANCE: f64 = 0.30;
const BOSS_ENCOUNTER_CHANCE: f64 = 0.90;
const TRAP_ENCOUNTER_CHANCE: f64 = 0.80;
const RESIDUAL_COMBAT_CHANCE: f64 = 0.10;
const TREASURE_LOOT_CHANCE: f64 = 0.85;
const RESIDUAL_LOOT_CHANCE: f64 = 0.05;
const RARITY_UPGRADE_CHANCE: f64 = 0.20;

const DUNGEON_PREFIXES: &[&str] = &[
    "Forgotten", "Sunken", "Howling", "Ashen", "Gilded", "Hollow", "Shattered", "Silent",
];
const DUNGEON_NOUNS: &[&str] = &["Crypt", "Catacombs", "Depths", "Warren", "Vault", "Pit"];
const TOWER_NOUNS: &[&str] = &["Spire", "Tower", "Pinnacle", "Belfry", "Citadel", "Needle"];

const COMBAT_MONSTERS: &[&str] = &[
    "Goblin", "Skeleton", "Giant Rat", "Cultist", "Ghoul", "Kobold", "Cave Spider", "Bandit",
];
const MID_BOSS_MONSTERS: &[&str] = &["Ogre Warlord", "Bone Knight", "Hag Matron", "Troll Shaman"];
const BOSS_MONSTERS: &[&str] = &[
    "Lich",
    "Ancient Wyrm",
    "Demon Prince",
    "Vampire Lord",
    "Beholder",
];

const LOOT_NAMES: &[&str] = &[
    "Gold Coins", "Healing Potion", "Silver Ring", "Runed Dagger", "Scroll of Warding",
    "Enchanted Amulet", "Gemstone", "Mana Crystal",
];

/// Generate a dungeon with `depth` levels below (or above) its entrance.
pub fn generate_dungeon(
    seed: &str,
    entrance_x: i32,
    entrance_y: i32,
    kind: DungeonKind,
    depth: u32,
) -> Result<Dungeon, GenerationError> {
    if seed.is_empty() {
        return Err(GenerationError::EmptySeed);
    }
    if !(1..=MAX_GENERATED_DEPTH).contains(&depth) {
        return Err(GenerationError::InvalidDepth {
            depth,
            max: MAX_GENERATED_DEPTH,
        });
    }

    let levels = (1..=depth)
        .map(|n| generate_level(seed, kind.z_sign() * n as i32, depth))
        .collect();

    Ok(Dungeon {
        id: kind.dungeon_id(entrance_x, entrance_y),
        kind,
        name: dungeon_name(seed, kind),
        entrance_x,
        entrance_y,
        seed: seed.to_string(),
        depth,
        levels,
    })
}

/// Display name of a dungeon, derived from `seed-name`.
pub fn dungeon_name(seed: &str, kind: DungeonKind) -> String {
    let mut rng = DeterministicRng::derive(seed, "name");
    let prefix = rng.pick(DUNGEON_PREFIXES).copied().unwrap_or("Nameless");
    let nouns = match kind {
        DungeonKind::Dungeon => DUNGEON_NOUNS,
        DungeonKind::Tower => TOWER_NOUNS,
    };
    let noun = rng.pick(nouns).copied().unwrap_or("Hole");
    format!("The {prefix} {noun}")
}

/// Generate the level at `z` from `seed-z{z}`.
///
/// `max_depth` decides whether the level gets a staircase further from the
/// surface.
pub fn generate_level(seed: &str, z: i32, max_depth: u32) -> DungeonLevel {
    let level_seed = derive_seed(seed, format_args!("z{z}"));
    let mut rng = DeterministicRng::new(&level_seed);
    let n = z.unsigned_abs();

    let room_count = rng.range_inclusive(MIN_ROOMS, MAX_ROOMS);
    let mut rooms: Vec<Room> = (0..room_count)
        .map(|index| {
            let room_type = match index {
                0 => RoomType::Entrance,
                1 if rng.chance(EARLY_BOSS_CHANCE) => RoomType::BossRoom,
                _ => pick_room_type(&mut rng),
            };
            Room {
                index,
                room_type,
                connections: Vec::new(),
                encounter: None,
                loot: Vec::new(),
            }
        })
        .collect();

    for i in 0..rooms.len().saturating_sub(1) {
        rooms[i].connections.push(RoomConnection {
            target: i as u32 + 1,
            direction: PassageDirection::Forward,
        });
        if rng.chance(REVERSE_EDGE_CHANCE) {
            rooms[i + 1].connections.push(RoomConnection {
                target: i as u32,
                direction: PassageDirection::Back,
            });
        }
    }

    for room in rooms.iter_mut().skip(1) {
        room.encounter = roll_encounter(room.room_type, n, &mut rng);
        room.loot = roll_loot(room.room_type, n, &mut rng);
    }

    let sign = z.signum();
    let last_room = room_count - 1;
    let mut connections = vec![LevelConnection {
        from_room: 0,
        to_z: z - sign,
        to_room: if n == 1 { 0 } else { last_room_hint(seed, z - sign) },
        direction: StairDirection::TowardSurface,
    }];
    if n < max_depth {
        connections.push(LevelConnection {
            from_room: last_room,
            to_z: z + sign,
            to_room: 0,
            direction: StairDirection::AwayFromSurface,
        });
    }

    DungeonLevel {
        z,
        seed: level_seed,
        rooms,
        connections,
    }
}

/// Index of the last room of the level at `z`, where its downward stair sits.
fn last_room_hint(seed: &str, z: i32) -> u32 {
    let mut rng = DeterministicRng::derive(seed, format_args!("z{z}"));
    rng.range_inclusive(MIN_ROOMS, MAX_ROOMS) - 1
}

fn pick_room_type(rng: &mut DeterministicRng) -> RoomType {
    rng.pick(&RoomType::NON_ENTRANCE)
        .copied()
        .unwrap_or(RoomType::Chamber)
}

fn roll_encounter(room_type: RoomType, n: u32, rng: &mut DeterministicRng) -> Option<Encounter> {
    let kind = match room_type {
        RoomType::Entrance => return None,
        RoomType::BossRoom => {
            if !rng.chance(BOSS_ENCOUNTER_CHANCE) {
                return None;
            }
            boss_kind_for_level(n)
        }
        RoomType::TrapRoom => {
            if !rng.chance(TRAP_ENCOUNTER_CHANCE) {
                return None;
            }
            EncounterKind::Trap
        }
        RoomType::Chamber
        | RoomType::Corridor
        | RoomType::TreasureRoom
        | RoomType::PuzzleRoom
        | RoomType::Exit => {
            if !rng.chance(RESIDUAL_COMBAT_CHANCE) {
                return None;
            }
            EncounterKind::Combat
        }
    };
    Some(build_encounter(kind, n, rng))
}

/// Mid-boss on every fifth level that is not a tenth, boss otherwise.
pub(crate) fn boss_kind_for_level(n: u32) -> EncounterKind {
    if n % 5 == 0 && n % 10 != 0 {
        EncounterKind::MidBoss
    } else {
        EncounterKind::Boss
    }
}

/// Encounter of `kind` scaled to distance `n` from the surface.
pub(crate) fn build_encounter(
    kind: EncounterKind,
    n: u32,
    rng: &mut DeterministicRng,
) -> Encounter {
    let (difficulty, monsters) = match kind {
        EncounterKind::Combat => {
            let name = rng.pick(COMBAT_MONSTERS).copied().unwrap_or("Goblin");
            let count = rng.range_inclusive(1, 3 + n / 20);
            (n, vec![monster(name, n, count)])
        }
        EncounterKind::MidBoss => {
            let name = rng.pick(MID_BOSS_MONSTERS).copied().unwrap_or("Ogre Warlord");
            let guard = rng.pick(COMBAT_MONSTERS).copied().unwrap_or("Goblin");
            (
                n + 3,
                vec![monster(name, n + 2, 1), monster(guard, n, rng.range_inclusive(1, 2))],
            )
        }
        EncounterKind::Boss => {
            let name = rng.pick(BOSS_MONSTERS).copied().unwrap_or("Lich");
            (n + 5, vec![monster(name, n + 3, 1)])
        }
        EncounterKind::Trap => (n + rng.range_inclusive(0, 2), Vec::new()),
    };
    Encounter {
        kind,
        difficulty,
        monsters,
    }
}

fn monster(name: &str, level: u32, count: u32) -> MonsterSpec {
    MonsterSpec {
        name: name.to_string(),
        level: level.max(1),
        count,
    }
}

fn roll_loot(room_type: RoomType, n: u32, rng: &mut DeterministicRng) -> Vec<LootEntry> {
    let chance = match room_type {
        RoomType::Entrance => return Vec::new(),
        RoomType::TreasureRoom => TREASURE_LOOT_CHANCE,
        RoomType::Chamber
        | RoomType::Corridor
        | RoomType::BossRoom
        | RoomType::TrapRoom
        | RoomType::PuzzleRoom
        | RoomType::Exit => RESIDUAL_LOOT_CHANCE,
    };
    if !rng.chance(chance) {
        return Vec::new();
    }

    let name = rng.pick(LOOT_NAMES).copied().unwrap_or("Gold Coins");
    let mut rarity = Rarity::floor_for_level(n);
    if rng.chance(RARITY_UPGRADE_CHANCE) {
        rarity = rarity.upgrade();
    }
    vec![LootEntry {
        name: name.to_string(),
        rarity,
        quantity: 1 + n / 10,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_generates_identical_dungeon() {
        let a = generate_dungeon("w-3-4-dungeon", 3, 4, DungeonKind::Dungeon, 20).unwrap();
        let b = generate_dungeon("w-3-4-dungeon", 3, 4, DungeonKind::Dungeon, 20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dungeon_descends_and_tower_ascends() {
        let dungeon = generate_dungeon("s", 0, 0, DungeonKind::Dungeon, 3).unwrap();
        let zs: Vec<_> = dungeon.levels.iter().map(|l| l.z).collect();
        assert_eq!(zs, vec![-1, -2, -3]);
        assert_eq!(dungeon.id.as_str(), "dungeon-0-0-dungeon");

        let tower = generate_dungeon("s", 0, 0, DungeonKind::Tower, 3).unwrap();
        let zs: Vec<_> = tower.levels.iter().map(|l| l.z).collect();
        assert_eq!(zs, vec![1, 2, 3]);
    }

    #[test]
    fn level_seed_is_scoped_by_z() {
        let level = generate_level("abc", -7, 10);
        assert_eq!(level.seed, "abc-z-7");
        assert_eq!(generate_level("abc", 7, 10).seed, "abc-z7");
    }

    #[test]
    fn rooms_respect_structural_rules() {
        let dungeon = generate_dungeon("structure", 1, 1, DungeonKind::Dungeon, 60).unwrap();
        for level in &dungeon.levels {
            let count = level.rooms.len() as u32;
            assert!((MIN_ROOMS..=MAX_ROOMS).contains(&count));
            assert_eq!(level.rooms[0].room_type, RoomType::Entrance);
            assert!(level.rooms[0].encounter.is_none());
            assert!(level.rooms[0].loot.is_empty());
            assert!(level.rooms[1..].iter().all(|r| r.room_type != RoomType::Entrance));
            for i in 0..count - 1 {
                assert!(level.rooms[i as usize].connects_to(i + 1));
            }
        }
    }

    #[test]
    fn staircases_link_adjacent_levels() {
        let dungeon = generate_dungeon("stairs", 0, 0, DungeonKind::Dungeon, 4).unwrap();

        let first = dungeon.level(1).unwrap();
        let up = first
            .connections
            .iter()
            .find(|c| c.direction == StairDirection::TowardSurface)
            .unwrap();
        assert_eq!(up.to_z, 0);

        for level in &dungeon.levels {
            let down = level
                .connections
                .iter()
                .filter(|c| c.direction == StairDirection::AwayFromSurface)
                .count();
            let expected = usize::from(level.z != -4);
            assert_eq!(down, expected, "level {}", level.z);
        }
    }

    #[test]
    fn mid_boss_only_on_fifth_levels() {
        assert_eq!(boss_kind_for_level(5), EncounterKind::MidBoss);
        assert_eq!(boss_kind_for_level(15), EncounterKind::MidBoss);
        assert_eq!(boss_kind_for_level(10), EncounterKind::Boss);
        assert_eq!(boss_kind_for_level(7), EncounterKind::Boss);
    }

    #[test]
    fn encounters_match_room_types() {
        let dungeon = generate_dungeon("encounters", 0, 0, DungeonKind::Tower, 100).unwrap();
        for level in &dungeon.levels {
            for room in &level.rooms {
                let Some(encounter) = &room.encounter else {
                    continue;
                };
                match room.room_type {
                    RoomType::BossRoom => assert!(matches!(
                        encounter.kind,
                        EncounterKind::Boss | EncounterKind::MidBoss
                    )),
                    RoomType::TrapRoom => assert_eq!(encounter.kind, EncounterKind::Trap),
                    _ => assert_eq!(encounter.kind, EncounterKind::Combat),
                }
            }
        }
    }

    #[test]
    fn invalid_depth_is_rejected() {
        assert!(matches!(
            generate_dungeon("s", 0, 0, DungeonKind::Dungeon, 0),
            Err(GenerationError::InvalidDepth { depth: 0, .. })
        ));
        assert!(matches!(
            generate_dungeon("s", 0, 0, DungeonKind::Dungeon, MAX_GENERATED_DEPTH + 1),
            Err(GenerationError::InvalidDepth { .. })
        ));
        assert_eq!(
            generate_dungeon("", 0, 0, DungeonKind::Dungeon, 1),
            Err(GenerationError::EmptySeed)
        );
    }
}

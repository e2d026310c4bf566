//! Selection of the one room a run resolves on each level.

use crate::entities::{DungeonLevel, EncounterKind, Room, RoomKind, RoomType, RunRoom};
use crate::generation::dungeon::{boss_kind_for_level, build_encounter};
use crate::rng::DeterministicRng;

/// Room a run resolves on a materialized level.
///
/// Takes the first non-entrance room carrying an encounter or loot, falling
/// back to the last room of the level.
pub fn run_room_for_level(level: &DungeonLevel, n: u32) -> Option<RunRoom> {
    let room = level
        .rooms
        .iter()
        .skip(1)
        .find(|r| r.encounter.is_some() || !r.loot.is_empty())
        .or_else(|| level.rooms.last())?;

    Some(RunRoom {
        level: n,
        room_type: room.room_type,
        kind: room_kind(room),
        encounter: room.encounter.clone(),
    })
}

/// Room for level `n` of a dungeon with no materialized level, from
/// `seed-level-{n}`.
pub fn generate_run_room(seed: &str, n: u32) -> RunRoom {
    let mut rng = DeterministicRng::derive(seed, format_args!("level-{n}"));

    let kind = if n % 5 == 0 {
        match boss_kind_for_level(n) {
            EncounterKind::MidBoss => RoomKind::MidBoss,
            _ => RoomKind::Boss,
        }
    } else {
        let roll = rng.next_f64();
        if roll < 0.45 {
            RoomKind::Combat
        } else if roll < 0.60 {
            RoomKind::Trap
        } else if roll < 0.75 {
            RoomKind::Treasure
        } else if roll < 0.85 {
            RoomKind::Safe
        } else {
            RoomKind::Explore
        }
    };

    let (room_type, encounter) = match kind {
        RoomKind::Combat => (
            RoomType::Chamber,
            Some(build_encounter(EncounterKind::Combat, n, &mut rng)),
        ),
        RoomKind::MidBoss => (
            RoomType::BossRoom,
            Some(build_encounter(EncounterKind::MidBoss, n, &mut rng)),
        ),
        RoomKind::Boss => (
            RoomType::BossRoom,
            Some(build_encounter(EncounterKind::Boss, n, &mut rng)),
        ),
        RoomKind::Trap => (
            RoomType::TrapRoom,
            Some(build_encounter(EncounterKind::Trap, n, &mut rng)),
        ),
        RoomKind::Treasure => (RoomType::TreasureRoom, None),
        RoomKind::Safe => (RoomType::Exit, None),
        RoomKind::Explore => (RoomType::Corridor, None),
    };

    RunRoom {
        level: n,
        room_type,
        kind,
        encounter,
    }
}

/// Resolution kind of a structure room.
///
/// Encounters win over loot; rooms with neither fall back on their type, with
/// the exit stairwell as the only place a party rests.
pub fn room_kind(room: &Room) -> RoomKind {
    if let Some(encounter) = &room.encounter {
        return match encounter.kind {
            EncounterKind::Combat => RoomKind::Combat,
            EncounterKind::MidBoss => RoomKind::MidBoss,
            EncounterKind::Boss => RoomKind::Boss,
            EncounterKind::Trap => RoomKind::Trap,
        };
    }
    if !room.loot.is_empty() {
        return RoomKind::Treasure;
    }
    match room.room_type {
        RoomType::TreasureRoom => RoomKind::Treasure,
        RoomType::Exit => RoomKind::Safe,
        RoomType::Entrance
        | RoomType::Chamber
        | RoomType::Corridor
        | RoomType::BossRoom
        | RoomType::TrapRoom
        | RoomType::PuzzleRoom => RoomKind::Explore,
    }
}

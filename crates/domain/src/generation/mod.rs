//! Procedural generators. Pure functions of their seed.

mod dungeon;
mod room;
mod surface;

pub use dungeon::{dungeon_name, generate_dungeon, generate_level};
pub use room::{generate_run_room, room_kind, run_room_for_level};
pub use surface::{
    cell_seed, generate_cell, GeneratedCell, SurfaceOptions, DUNGEON_ENTRANCE_CHANCE,
};

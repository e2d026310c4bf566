//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.

pub mod runs;
pub mod world_map;

pub use runs::RunUseCases;
pub use world_map::WorldMapUseCases;

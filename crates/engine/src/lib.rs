//! Cryptforge Engine library.
//!
//! Server-side code for world map generation and dungeon run execution.
//!
//! ## Structure
//!
//! - `use_cases/` - World map and run orchestration over the ports
//! - `infrastructure/` - Port traits and their adapters (memory, SQLite, resolvers)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;

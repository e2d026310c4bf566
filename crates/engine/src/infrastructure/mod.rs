//! Infrastructure implementations.
//!
//! Contains port trait implementations for storage, resolution and the run queue.

pub mod clock;
pub mod config;
pub mod memory;
pub mod ports;
pub mod queues;
pub mod resolvers;
pub mod sqlite;
pub mod world_context;

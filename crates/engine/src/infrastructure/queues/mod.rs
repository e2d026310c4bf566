//! Queue implementations - Infrastructure adapters for the run queue port

mod memory_queue;

pub use memory_queue::InMemoryRunQueue;

//! Unified error types for the domain layer
//!
//! Generation is a pure function of its seed, so the only generation failures
//! are malformed inputs rejected at the boundary, before anything is persisted.

use thiserror::Error;

use crate::ids::HeroRef;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }
}

/// A party that cannot be sent into a dungeon.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartyError {
    #[error("Party must not be empty")]
    Empty,

    #[error("Hero {0} is listed more than once")]
    DuplicateHero(HeroRef),
}

/// Malformed generation input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Seed must not be empty")]
    EmptySeed,

    #[error("Invalid region: x {x_min}..={x_max}, y {y_min}..={y_max}")]
    InvalidRegion {
        x_min: i32,
        x_max: i32,
        y_min: i32,
        y_max: i32,
    },

    #[error("Region too large: {cells} cells (max {max})")]
    RegionTooLarge { cells: u64, max: u64 },

    #[error("Invalid dungeon depth {depth} (expected 1..={max})")]
    InvalidDepth { depth: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_error_names_the_hero() {
        let err = PartyError::DuplicateHero(HeroRef::new("0xabc", 7));
        assert_eq!(err.to_string(), "Hero 0xabc#7 is listed more than once");
    }

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("Entity", "ancient-lich");
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(err.to_string().contains("Entity"));
        assert!(err.to_string().contains("ancient-lich"));
    }

    #[test]
    fn test_generation_error_messages() {
        let err = GenerationError::InvalidDepth { depth: 0, max: 1000 };
        assert_eq!(
            err.to_string(),
            "Invalid dungeon depth 0 (expected 1..=1000)"
        );
        let err = GenerationError::RegionTooLarge {
            cells: 20_000,
            max: 10_000,
        };
        assert!(err.to_string().contains("20000"));
    }
}

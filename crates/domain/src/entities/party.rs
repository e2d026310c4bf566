//! Run-scoped hero snapshots.

use serde::{Deserialize, Serialize};

use crate::ids::HeroRef;

/// Snapshot of a hero owned by a run for its duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyMember {
    pub hero: HeroRef,
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub experience: u64,
}

impl PartyMember {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Apply a delta, clamping health and mana to `[0, max]`. Returns the
    /// change that actually landed after clamping.
    pub fn apply(&mut self, delta: &StatDeltas) -> StatDeltas {
        let before = self.clone();
        self.health = clamp_add(self.health, delta.health, self.max_health);
        self.mana = clamp_add(self.mana, delta.mana, self.max_mana);
        self.experience = self.experience.saturating_add(delta.experience);
        StatDeltas {
            health: difference(before.health, self.health),
            mana: difference(before.mana, self.mana),
            experience: self.experience - before.experience,
        }
    }

    pub fn restore(&mut self) {
        self.health = self.max_health;
        self.mana = self.max_mana;
    }
}

fn clamp_add(current: u32, delta: i32, max: u32) -> u32 {
    let value = i64::from(current) + i64::from(delta);
    value.clamp(0, i64::from(max)) as u32
}

fn difference(before: u32, after: u32) -> i32 {
    let change = i64::from(after) - i64::from(before);
    change.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Change to a hero's stats produced by one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatDeltas {
    pub health: i32,
    pub mana: i32,
    pub experience: u64,
}

impl StatDeltas {
    pub fn is_zero(&self) -> bool {
        self.health == 0 && self.mana == 0 && self.experience == 0
    }

    pub fn merge(&mut self, other: &StatDeltas) {
        self.health = self.health.saturating_add(other.health);
        self.mana = self.mana.saturating_add(other.mana);
        self.experience = self.experience.saturating_add(other.experience);
    }
}

/// A delta addressed to one hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDelta {
    pub hero: HeroRef,
    pub deltas: StatDeltas,
}

/// True when at least one member has positive health.
pub fn any_alive(party: &[PartyMember]) -> bool {
    party.iter().any(PartyMember::is_alive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(health: u32) -> PartyMember {
        PartyMember {
            hero: HeroRef::new("0xheroes", 1),
            name: "Aria".to_string(),
            level: 3,
            health,
            max_health: 50,
            mana: 10,
            max_mana: 20,
            experience: 0,
        }
    }

    #[test]
    fn apply_clamps_to_bounds() {
        let mut m = member(40);
        m.apply(&StatDeltas {
            health: 25,
            mana: -30,
            experience: 7,
        });
        assert_eq!(m.health, 50);
        assert_eq!(m.mana, 0);
        assert_eq!(m.experience, 7);

        m.apply(&StatDeltas {
            health: -80,
            ..StatDeltas::default()
        });
        assert_eq!(m.health, 0);
        assert!(!m.is_alive());
    }

    #[test]
    fn apply_reports_the_clamped_change() {
        let mut m = member(10);
        let landed = m.apply(&StatDeltas {
            health: -20,
            mana: 4,
            experience: 2,
        });
        assert_eq!(
            landed,
            StatDeltas {
                health: -10,
                mana: 4,
                experience: 2,
            }
        );

        let landed = m.apply(&StatDeltas {
            health: 30,
            ..StatDeltas::default()
        });
        assert_eq!(landed.health, 30);
        assert_eq!(m.health, 30);
    }

    #[test]
    fn restore_fills_health_and_mana() {
        let mut m = member(5);
        m.restore();
        assert_eq!(m.health, 50);
        assert_eq!(m.mana, 20);
    }

    #[test]
    fn any_alive_checks_positive_health() {
        assert!(!any_alive(&[member(0), member(0)]));
        assert!(any_alive(&[member(0), member(1)]));
        assert!(!any_alive(&[]));
    }
}

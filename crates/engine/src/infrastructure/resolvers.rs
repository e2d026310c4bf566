//! Reference encounter resolver and loot generator.
//!
//! Deterministic stand-ins for the balance services: the same party and
//! monsters always resolve the same way. Good enough for the development
//! binary, not tuned for play.

use async_trait::async_trait;
use cryptforge_domain::{
    CombatOutcome, CombatStatus, DeterministicRng, Encounter, LootItem, Monster, PartyDelta,
    PartyMember, Rarity, StatDeltas, TrapOutcome, TrapStatus,
};

use crate::infrastructure::ports::{EncounterResolverPort, LootGeneratorPort, ResolverError};

const XP_PER_MONSTER_LEVEL: u64 = 10;
const XP_PER_TRAP_DIFFICULTY: u64 = 5;

const LOOT_NAMES: &[&str] = &[
    "Rusted Blade",
    "Oak Buckler",
    "Silver Ring",
    "Healing Draught",
    "Runed Amulet",
    "Ember Staff",
    "Shadow Cloak",
    "Dragonbone Charm",
];

/// Seeded combat and trap resolution.
pub struct SeededEncounterResolver {
    seed: String,
}

impl SeededEncounterResolver {
    pub fn new(seed: impl Into<String>) -> Self {
        Self { seed: seed.into() }
    }

    fn rng(&self, label: &str, party: &[PartyMember], strength: u64) -> DeterministicRng {
        let party_key: u64 = party
            .iter()
            .map(|m| u64::from(m.health) + u64::from(m.level))
            .sum();
        DeterministicRng::derive(&self.seed, format_args!("{label}-{party_key}-{strength}"))
    }
}

fn party_power(party: &[PartyMember]) -> u64 {
    party
        .iter()
        .filter(|m| m.is_alive())
        .map(|m| u64::from(m.health) + u64::from(m.level) * 5)
        .sum()
}

fn monster_power(monsters: &[Monster]) -> u64 {
    monsters
        .iter()
        .map(|m| u64::from(m.health) + u64::from(m.attack) * 2)
        .sum()
}

/// Same health loss for every living member; the dead are left alone.
fn damage_living(party: &[PartyMember], damage: u32) -> Vec<PartyDelta> {
    party
        .iter()
        .filter(|m| m.is_alive())
        .map(|m| PartyDelta {
            hero: m.hero.clone(),
            deltas: StatDeltas {
                health: -(damage.min(m.health) as i32),
                ..StatDeltas::default()
            },
        })
        .collect()
}

#[async_trait]
impl EncounterResolverPort for SeededEncounterResolver {
    async fn resolve_combat(
        &self,
        party: &[PartyMember],
        monsters: &[Monster],
    ) -> Result<CombatOutcome, ResolverError> {
        let ours = party_power(party);
        let theirs = monster_power(monsters);
        if ours == 0 {
            return Ok(CombatOutcome {
                status: CombatStatus::Defeat,
                party_deltas: Vec::new(),
                xp_awarded: 0,
            });
        }

        let mut rng = self.rng("combat", party, theirs);
        let odds = (ours as f64 / (ours + theirs) as f64).clamp(0.1, 0.95);
        let attack: u32 = monsters.iter().map(|m| m.attack).sum();

        if rng.chance(odds) {
            let damage = attack.saturating_mul(rng.range_inclusive(1, 3));
            let xp_awarded = monsters
                .iter()
                .map(|m| u64::from(m.level) * XP_PER_MONSTER_LEVEL)
                .sum();
            Ok(CombatOutcome {
                status: CombatStatus::Victory,
                party_deltas: damage_living(party, damage),
                xp_awarded,
            })
        } else {
            Ok(CombatOutcome {
                status: CombatStatus::Defeat,
                party_deltas: damage_living(party, u32::MAX),
                xp_awarded: 0,
            })
        }
    }

    async fn resolve_trap(
        &self,
        encounter: &Encounter,
        party: &[PartyMember],
    ) -> Result<TrapOutcome, ResolverError> {
        let mut rng = self.rng("trap", party, u64::from(encounter.difficulty));
        let disarm = (0.6 - f64::from(encounter.difficulty) * 0.01).max(0.2);

        if rng.chance(disarm) {
            Ok(TrapOutcome {
                status: TrapStatus::Disarmed,
                damage: 0,
                party_deltas: Vec::new(),
                xp_awarded: u64::from(encounter.difficulty) * XP_PER_TRAP_DIFFICULTY,
            })
        } else {
            let damage = 5 + encounter.difficulty.saturating_mul(2);
            Ok(TrapOutcome {
                status: TrapStatus::Triggered,
                damage,
                party_deltas: damage_living(party, damage),
                xp_awarded: 0,
            })
        }
    }
}

/// Seeded loot rolls: name from a table, rarity floored by level.
#[derive(Debug, Default)]
pub struct SeededLootGenerator;

impl SeededLootGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LootGeneratorPort for SeededLootGenerator {
    async fn generate(&self, seed: &str, level: u32) -> Result<LootItem, ResolverError> {
        if seed.is_empty() {
            return Err(ResolverError::Failed("empty loot seed".into()));
        }
        let mut rng = DeterministicRng::new(seed);
        let name = rng
            .pick(LOOT_NAMES)
            .copied()
            .ok_or_else(|| ResolverError::Failed("empty loot table".into()))?;
        let mut rarity = Rarity::floor_for_level(level);
        if rng.chance(0.2) {
            rarity = rarity.upgrade();
        }
        Ok(LootItem {
            name: name.to_string(),
            rarity,
            level,
        })
    }
}

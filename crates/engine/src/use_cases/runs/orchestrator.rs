//! Execute dungeon run use case.
//!
//! Walks a party down one room per level until the party falls or the depth
//! runs out:
//!
//! `Initializing -> LevelLoop -> RoomResolution -> (Advancing | PartyWiped |
//! DepthExhausted) -> Terminal`
//!
//! Stat changes of a level are written through the stats port before the
//! next level starts, so a crash never loses a level already resolved.

use std::sync::Arc;

use cryptforge_domain::generation::{generate_level, generate_run_room, run_room_for_level};
use cryptforge_domain::{
    any_alive, CombatStatus, Dungeon, Encounter, HeroRef, LootItem, Monster, PartyDelta,
    PartyError, PartyMember, RoomKind, RunEvent, RunJob, RunResult, RunRoom, RunStatus,
    StatDeltas, TrapStatus, MAX_RUN_LEVELS,
};

use crate::infrastructure::ports::{
    ClockPort, EncounterResolverPort, LootGeneratorPort, MapRepo, RepoError, ResolverError,
    StatsPort,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Resolver failed: {0}")]
    Resolver(#[from] ResolverError),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] RepoError),
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Run has an empty party")]
    EmptyParty,
    #[error("Hero {0} is listed more than once")]
    DuplicateHero(HeroRef),
}

impl From<PartyError> for RunError {
    fn from(err: PartyError) -> Self {
        match err {
            PartyError::Empty => RunError::EmptyParty,
            PartyError::DuplicateHero(hero) => RunError::DuplicateHero(hero),
        }
    }
}

/// Stat writes owed to the stats port at the end of a level. Deltas hold the
/// change that landed on the run's party, so the store ends up where the run is.
#[derive(Debug, Default)]
struct Checkpoint {
    deltas: Vec<PartyDelta>,
    /// Hero with the health and mana to restore to
    restores: Vec<(HeroRef, u32, u32)>,
}

impl Checkpoint {
    fn add(&mut self, hero: &HeroRef, deltas: &StatDeltas) {
        match self.deltas.iter_mut().find(|d| &d.hero == hero) {
            Some(existing) => existing.deltas.merge(deltas),
            None => self.deltas.push(PartyDelta {
                hero: hero.clone(),
                deltas: *deltas,
            }),
        }
    }
}

/// Mutable state of one run in progress.
struct RunState {
    party: Vec<PartyMember>,
    events: Vec<RunEvent>,
    inventory: Vec<LootItem>,
    total_xp: u64,
    levels_completed: u32,
}

impl RunState {
    fn apply(&mut self, deltas: &[PartyDelta], checkpoint: &mut Checkpoint) {
        for delta in deltas {
            if let Some(member) = self.party.iter_mut().find(|m| m.hero == delta.hero) {
                let landed = member.apply(&delta.deltas);
                checkpoint.add(&delta.hero, &landed);
            }
        }
    }

    /// Split `xp` evenly over the whole party, dropping the remainder.
    /// Returns the amount actually handed out.
    fn award_xp(&mut self, xp: u64, checkpoint: &mut Checkpoint) -> u64 {
        let size = self.party.len() as u64;
        if size == 0 || xp == 0 {
            return 0;
        }
        let share = xp / size;
        if share == 0 {
            return 0;
        }
        let grant = StatDeltas {
            experience: share,
            ..StatDeltas::default()
        };
        for member in &mut self.party {
            let landed = member.apply(&grant);
            checkpoint.add(&member.hero, &landed);
        }
        let awarded = share * size;
        self.total_xp += awarded;
        awarded
    }
}

/// Monsters an encounter fields. Stats scale with monster level.
fn monsters_for(encounter: &Encounter) -> Vec<Monster> {
    encounter
        .monsters
        .iter()
        .flat_map(|spec| {
            (0..spec.count).map(move |_| Monster {
                name: spec.name.clone(),
                level: spec.level,
                health: 10 + spec.level * 6,
                attack: 2 + spec.level * 2,
            })
        })
        .collect()
}

pub struct ExecuteDungeonRun {
    map_repo: Arc<dyn MapRepo>,
    stats: Arc<dyn StatsPort>,
    resolver: Arc<dyn EncounterResolverPort>,
    loot: Arc<dyn LootGeneratorPort>,
    clock: Arc<dyn ClockPort>,
    max_levels: u32,
}

impl ExecuteDungeonRun {
    /// `max_levels` lowers the level cap; it can never raise it above
    /// `MAX_RUN_LEVELS`.
    pub fn new(
        map_repo: Arc<dyn MapRepo>,
        stats: Arc<dyn StatsPort>,
        resolver: Arc<dyn EncounterResolverPort>,
        loot: Arc<dyn LootGeneratorPort>,
        clock: Arc<dyn ClockPort>,
        max_levels: u32,
    ) -> Self {
        Self {
            map_repo,
            stats,
            resolver,
            loot,
            clock,
            max_levels: max_levels.clamp(1, MAX_RUN_LEVELS),
        }
    }

    /// Run the job to a terminal result. Failures become an `error` result.
    pub async fn execute(&self, job: &RunJob) -> RunResult {
        match self.run(job).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(run_id = %job.run_id, error = %e, "Dungeon run failed");
                RunResult::error(
                    job.run_id,
                    job.dungeon_id.clone(),
                    e.to_string(),
                    self.clock.now(),
                )
            }
        }
    }

    async fn run(&self, job: &RunJob) -> Result<RunResult, RunError> {
        // 1. Initializing
        job.check_party()?;
        let dungeon = self.map_repo.get_dungeon(&job.dungeon_id).await?;
        let party = self.stats.get_party(&job.party).await?;
        if let Some(missing) = job
            .party
            .iter()
            .find(|hero| !party.iter().any(|m| &m.hero == *hero))
        {
            return Err(RunError::NotFound {
                entity_type: "Hero",
                id: missing.to_string(),
            });
        }

        let depth = dungeon
            .as_ref()
            .map_or(MAX_RUN_LEVELS, |d| d.depth)
            .min(self.max_levels);
        tracing::info!(
            run_id = %job.run_id,
            dungeon_id = %job.dungeon_id,
            party = job.party.len(),
            depth,
            generated_on_demand = dungeon.is_none(),
            "Starting dungeon run"
        );

        let mut state = RunState {
            party,
            events: Vec::new(),
            inventory: Vec::new(),
            total_xp: 0,
            levels_completed: 0,
        };

        // 2. Level loop
        for level in 1..=depth {
            if !any_alive(&state.party) {
                state.events.push(RunEvent::PartyWipe { level });
                tracing::info!(run_id = %job.run_id, level, "Party wiped");
                break;
            }

            let room = self.room_for(dungeon.as_ref(), &job.seed, level);
            let checkpoint = self.resolve_room(job, &room, &mut state).await?;
            self.write_checkpoint(job, level, checkpoint).await?;
            state.levels_completed = level;
        }

        // 3. Terminal
        let status = if any_alive(&state.party) {
            RunStatus::Victory
        } else {
            RunStatus::Defeat
        };
        tracing::info!(
            run_id = %job.run_id,
            status = %status,
            levels_completed = state.levels_completed,
            total_xp = state.total_xp,
            "Dungeon run finished"
        );

        Ok(RunResult {
            run_id: job.run_id,
            dungeon_id: job.dungeon_id.clone(),
            status,
            levels_completed: state.levels_completed,
            total_xp: state.total_xp,
            events: state.events,
            final_party: state.party,
            inventory: state.inventory,
            finished_at: self.clock.now(),
        })
    }

    fn room_for(&self, dungeon: Option<&Dungeon>, seed: &str, level: u32) -> RunRoom {
        let Some(dungeon) = dungeon else {
            return generate_run_room(seed, level);
        };
        let materialized = match dungeon.level(level) {
            Some(stored) => run_room_for_level(stored, level),
            None => {
                let z = dungeon.kind.z_sign() * level as i32;
                run_room_for_level(&generate_level(&dungeon.seed, z, dungeon.depth), level)
            }
        };
        materialized.unwrap_or_else(|| generate_run_room(seed, level))
    }

    async fn resolve_room(
        &self,
        job: &RunJob,
        room: &RunRoom,
        state: &mut RunState,
    ) -> Result<Checkpoint, RunError> {
        let level = room.level;
        let mut checkpoint = Checkpoint::default();
        tracing::debug!(run_id = %job.run_id, level, kind = ?room.kind, "Resolving room");

        match room.kind {
            RoomKind::Combat | RoomKind::Boss | RoomKind::MidBoss => {
                let Some(encounter) = room.encounter.as_ref() else {
                    state.events.push(RunEvent::RoomExplored {
                        level,
                        room_type: room.room_type,
                    });
                    return Ok(checkpoint);
                };
                let monsters = monsters_for(encounter);
                let outcome = self
                    .resolver
                    .resolve_combat(&state.party, &monsters)
                    .await?;
                state.apply(&outcome.party_deltas, &mut checkpoint);
                match outcome.status {
                    CombatStatus::Victory => {
                        let xp_awarded = state.award_xp(outcome.xp_awarded, &mut checkpoint);
                        state.events.push(RunEvent::CombatVictory {
                            level,
                            encounter: encounter.kind,
                            monsters: monsters.len() as u32,
                            xp_awarded,
                        });
                    }
                    CombatStatus::Defeat => state.events.push(RunEvent::CombatDefeat {
                        level,
                        encounter: encounter.kind,
                    }),
                }
            }
            RoomKind::Trap => {
                let Some(encounter) = room.encounter.as_ref() else {
                    state.events.push(RunEvent::RoomExplored {
                        level,
                        room_type: room.room_type,
                    });
                    return Ok(checkpoint);
                };
                let outcome = self.resolver.resolve_trap(encounter, &state.party).await?;
                state.apply(&outcome.party_deltas, &mut checkpoint);
                match outcome.status {
                    TrapStatus::Disarmed => {
                        let xp_awarded = state.award_xp(outcome.xp_awarded, &mut checkpoint);
                        state
                            .events
                            .push(RunEvent::TrapDisarmed { level, xp_awarded });
                    }
                    TrapStatus::Triggered => state.events.push(RunEvent::TrapTriggered {
                        level,
                        damage: outcome.damage,
                    }),
                }
            }
            RoomKind::Treasure => {
                let item = self
                    .loot
                    .generate(&format!("{}-loot-{level}", job.seed), level)
                    .await?;
                state.inventory.push(item.clone());
                state.events.push(RunEvent::TreasureFound { level, item });
            }
            RoomKind::Safe => {
                for member in state.party.iter_mut().filter(|m| m.is_alive()) {
                    member.restore();
                    checkpoint
                        .restores
                        .push((member.hero.clone(), member.max_health, member.max_mana));
                }
                state.events.push(RunEvent::Rest { level });
            }
            RoomKind::Explore => state.events.push(RunEvent::RoomExplored {
                level,
                room_type: room.room_type,
            }),
        }

        Ok(checkpoint)
    }

    async fn write_checkpoint(
        &self,
        job: &RunJob,
        level: u32,
        checkpoint: Checkpoint,
    ) -> Result<(), RunError> {
        let reason = format!("run {} level {level}", job.run_id);
        for delta in checkpoint.deltas.iter().filter(|d| !d.deltas.is_zero()) {
            self.stats
                .apply_deltas(&delta.hero, delta.deltas, &reason)
                .await?;
        }
        for (hero, health, mana) in &checkpoint.restores {
            self.stats.restore(hero, *health, *mana).await?;
        }
        Ok(())
    }
}

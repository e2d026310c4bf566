//! Application state and composition.

use std::sync::Arc;

use tokio::sync::RwLock;

use cryptforge_domain::EntityRegistry;

use crate::infrastructure::{
    clock::SystemClock,
    config::EngineConfig,
    memory::{InMemoryMapRepo, InMemoryRunRepo, InMemoryStatsStore},
    ports::{
        ClockPort, EncounterResolverPort, LootGeneratorPort, MapRepo, RepoError, RunQueuePort,
        RunRepo, StatsPort, WorldContext,
    },
    queues::InMemoryRunQueue,
    resolvers::{SeededEncounterResolver, SeededLootGenerator},
    sqlite::SqliteStore,
    world_context::RegistryWorldContext,
};
use crate::use_cases::{
    runs::{ExecuteDungeonRun, LeaseLockCoordinator, RunJobQueue, WorkerSettings},
    world_map::{CellMaterializer, ExploreCell, GenerateInitialMap, GetDungeon, QueryMap},
    RunUseCases, WorldMapUseCases,
};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub config: EngineConfig,
    pub clock: Arc<dyn ClockPort>,
    pub registry: Arc<RwLock<EntityRegistry>>,
    /// Local hero stats that accept registrations, when stats live in process.
    pub roster: Option<Arc<InMemoryStatsStore>>,
}

/// Container for all use cases.
pub struct UseCases {
    pub world_map: WorldMapUseCases,
    pub runs: RunUseCases,
}

/// Port implementations the app is assembled from.
pub struct Adapters {
    pub map: Arc<dyn MapRepo>,
    pub runs: Arc<dyn RunRepo>,
    pub stats: Arc<dyn StatsPort>,
    pub roster: Option<Arc<InMemoryStatsStore>>,
    pub queue: Arc<dyn RunQueuePort>,
    pub resolver: Arc<dyn EncounterResolverPort>,
    pub loot: Arc<dyn LootGeneratorPort>,
    pub world: Arc<dyn WorldContext>,
    pub registry: Arc<RwLock<EntityRegistry>>,
    pub clock: Arc<dyn ClockPort>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(config: EngineConfig, adapters: Adapters) -> Self {
        let Adapters {
            map,
            runs,
            stats,
            roster,
            queue,
            resolver,
            loot,
            world,
            registry,
            clock,
        } = adapters;

        // World map
        let materializer = Arc::new(CellMaterializer::new(
            map.clone(),
            world,
            config.dungeon_depth,
        ));
        let world_map = WorldMapUseCases::new(
            Arc::new(GenerateInitialMap::new(map.clone(), materializer.clone())),
            Arc::new(ExploreCell::new(map.clone(), materializer)),
            Arc::new(GetDungeon::new(map.clone())),
            Arc::new(QueryMap::new(map.clone())),
        );

        // Runs
        let execute = Arc::new(ExecuteDungeonRun::new(
            map,
            stats,
            resolver,
            loot,
            clock.clone(),
            config.max_run_depth,
        ));
        let locks = Arc::new(LeaseLockCoordinator::new(clock.clone(), config.lock_lease));
        let jobs = Arc::new(RunJobQueue::new(
            queue,
            runs,
            locks.clone(),
            execute.clone(),
            clock.clone(),
            WorkerSettings {
                concurrency: config.worker_concurrency,
                poll_interval: config.queue_poll_interval,
            },
        ));

        Self {
            use_cases: UseCases {
                world_map,
                runs: RunUseCases::new(execute, jobs, locks),
            },
            config,
            clock,
            registry,
            roster,
        }
    }

    /// Assemble the app the binary serves.
    ///
    /// Map and run storage go to SQLite when `database_path` is set, to
    /// in-memory stores otherwise. Hero stats and the run queue are always
    /// in memory; heroes join through the roster.
    pub async fn from_config(config: EngineConfig) -> Result<Self, RepoError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

        let (map, runs): (Arc<dyn MapRepo>, Arc<dyn RunRepo>) = match &config.database_path {
            Some(path) => {
                tracing::info!(path = %path, "Using SQLite storage");
                let store = Arc::new(SqliteStore::new(path, clock.clone()).await?);
                (store.clone(), store)
            }
            None => {
                tracing::info!("DATABASE_PATH not set, using in-memory storage");
                (
                    Arc::new(InMemoryMapRepo::new()),
                    Arc::new(InMemoryRunRepo::new()),
                )
            }
        };

        let registry = Arc::new(RwLock::new(EntityRegistry::new()));
        let world = Arc::new(
            RegistryWorldContext::new(registry.clone(), &config.world_seed, clock.clone()).await,
        );

        let roster = Arc::new(InMemoryStatsStore::new());
        let adapters = Adapters {
            map,
            runs,
            stats: roster.clone(),
            roster: Some(roster),
            queue: Arc::new(InMemoryRunQueue::new(clock.clone())),
            resolver: Arc::new(SeededEncounterResolver::new(config.world_seed.clone())),
            loot: Arc::new(SeededLootGenerator::new()),
            world,
            registry,
            clock,
        };
        Ok(Self::new(config, adapters))
    }
}

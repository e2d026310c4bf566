//! HTTP routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use cryptforge_domain::{
    Dungeon, DungeonId, EntityData, FeatureType, HeroRef, MapCell, MapDensity, MapRegion,
    PartyMember, RunId, RunJob, RunResult,
};

use crate::app::App;
use crate::infrastructure::ports::{CellFilter, CellPage, DEFAULT_PAGE_LIMIT};
use crate::use_cases::runs::{JobError, RunStatusView};
use crate::use_cases::world_map::{ExploreOptions, MapError, MapGenerationRequest};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/map/generate", post(generate_map))
        .route("/api/map/cells", get(query_cells))
        .route("/api/map/cells/{x}/{y}", get(explore_cell))
        .route("/api/map/dungeons/{x}/{y}/{z}", get(get_dungeon))
        .route("/api/runs", post(submit_run))
        .route("/api/runs/{id}", get(get_run))
        .route("/api/heroes", post(register_hero))
        .route("/api/entities/{id}", get(get_entity))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// World map
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateMapBody {
    seed: Option<String>,
    region: MapRegion,
    #[serde(default)]
    density: MapDensity,
    #[serde(default = "default_true")]
    include_dungeons: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateMapResponse {
    cells: Vec<MapCell>,
    newly_generated: usize,
}

fn default_true() -> bool {
    true
}

async fn generate_map(
    State(app): State<Arc<App>>,
    Json(body): Json<GenerateMapBody>,
) -> Result<Json<GenerateMapResponse>, ApiError> {
    let request = MapGenerationRequest {
        seed: body.seed.unwrap_or_else(|| app.config.world_seed.clone()),
        region: body.region,
        density: body.density,
        include_dungeons: body.include_dungeons,
    };
    let map = app.use_cases.world_map.generate.execute(&request).await?;
    Ok(Json(GenerateMapResponse {
        cells: map.cells,
        newly_generated: map.newly_generated,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExploreParams {
    seed: Option<String>,
    discovered_by: Option<String>,
    #[serde(default)]
    density: MapDensity,
    #[serde(default = "default_true")]
    include_dungeons: bool,
}

async fn explore_cell(
    State(app): State<Arc<App>>,
    Path((x, y)): Path<(i32, i32)>,
    Query(params): Query<ExploreParams>,
) -> Result<Json<MapCell>, ApiError> {
    let options = ExploreOptions {
        seed: params.seed.unwrap_or_else(|| app.config.world_seed.clone()),
        discovered_by: params.discovered_by.filter(|who| !who.trim().is_empty()),
        density: params.density,
        include_dungeons: params.include_dungeons,
    };
    let cell = app.use_cases.world_map.explore.execute(x, y, &options).await?;
    Ok(Json(cell))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellQueryParams {
    x_min: Option<i32>,
    x_max: Option<i32>,
    y_min: Option<i32>,
    y_max: Option<i32>,
    feature: Option<FeatureType>,
    has_dungeon: Option<bool>,
    discovered_by: Option<String>,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

impl CellQueryParams {
    fn into_filter(self) -> Result<CellFilter, ApiError> {
        let region = match (self.x_min, self.x_max, self.y_min, self.y_max) {
            (None, None, None, None) => None,
            (Some(x_min), Some(x_max), Some(y_min), Some(y_max)) => {
                let region = MapRegion::new(x_min, x_max, y_min, y_max);
                region
                    .validate()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                Some(region)
            }
            _ => {
                return Err(ApiError::BadRequest(
                    "Region needs xMin, xMax, yMin and yMax".to_string(),
                ))
            }
        };
        Ok(CellFilter {
            region,
            feature: self.feature,
            has_dungeon: self.has_dungeon,
            discovered_by: self.discovered_by,
            offset: self.offset,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        })
    }
}

async fn query_cells(
    State(app): State<Arc<App>>,
    Query(params): Query<CellQueryParams>,
) -> Result<Json<CellPage>, ApiError> {
    let page = app
        .use_cases
        .world_map
        .query
        .execute(params.into_filter()?)
        .await?;
    Ok(Json(page))
}

async fn get_dungeon(
    State(app): State<Arc<App>>,
    Path((x, y, z)): Path<(i32, i32, i32)>,
) -> Result<Json<Dungeon>, ApiError> {
    let dungeon = app
        .use_cases
        .world_map
        .get_dungeon
        .execute(x, y, z)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(dungeon))
}

// =============================================================================
// Runs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRunBody {
    dungeon_id: DungeonId,
    party: Vec<HeroRef>,
    seed: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRunResponse {
    run_id: RunId,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case", rename_all_fields = "camelCase")]
enum RunView {
    Pending { run_id: RunId },
    Finished { result: RunResult },
    Rejected { run_id: RunId, reason: String },
}

async fn submit_run(
    State(app): State<Arc<App>>,
    Json(body): Json<SubmitRunBody>,
) -> Result<(StatusCode, Json<SubmitRunResponse>), ApiError> {
    let run_id = RunId::new();
    let job = RunJob {
        run_id,
        dungeon_id: body.dungeon_id,
        party: body.party,
        seed: body.seed.unwrap_or_else(|| run_id.to_string()),
        start_time: app.clock.now(),
    };
    let run_id = app.use_cases.runs.jobs.submit(job).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitRunResponse { run_id })))
}

async fn get_run(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunView>, ApiError> {
    let run_id = RunId::from_uuid(id);
    let view = match app.use_cases.runs.jobs.get_result(run_id).await? {
        RunStatusView::Pending => RunView::Pending { run_id },
        RunStatusView::Finished(result) => RunView::Finished { result },
        RunStatusView::Rejected { reason } => RunView::Rejected { run_id, reason },
        RunStatusView::Unknown => return Err(ApiError::NotFound),
    };
    Ok(Json(view))
}

// =============================================================================
// Heroes
// =============================================================================

/// Put a hero on the local roster so runs can use it.
async fn register_hero(
    State(app): State<Arc<App>>,
    Json(hero): Json<PartyMember>,
) -> Result<(StatusCode, Json<PartyMember>), ApiError> {
    let roster = app.roster.as_ref().ok_or(ApiError::NotFound)?;
    if hero.max_health == 0 || hero.health > hero.max_health || hero.mana > hero.max_mana {
        return Err(ApiError::BadRequest(
            "Health and mana must lie within their maximums".to_string(),
        ));
    }
    tracing::info!(hero = %hero.hero, "Hero registered");
    roster.insert(hero.clone()).await;
    Ok((StatusCode::CREATED, Json(hero)))
}

// =============================================================================
// Provenance
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityView {
    entity: EntityData,
    provenance: Vec<EntityData>,
    related: Vec<String>,
}

async fn get_entity(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<EntityView>, ApiError> {
    let registry = app.registry.read().await;
    let entity = registry.get(&id).cloned().ok_or(ApiError::NotFound)?;
    let provenance = registry.provenance_chain(&id).into_iter().cloned().collect();
    let related = registry
        .related(&id)
        .into_iter()
        .map(|e| e.entity_id.clone())
        .collect();
    Ok(Json(EntityView {
        entity,
        provenance,
        related,
    }))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<MapError> for ApiError {
    fn from(e: MapError) -> Self {
        match e {
            MapError::Generation(e) => ApiError::BadRequest(e.to_string()),
            MapError::NotFound { .. } => ApiError::NotFound,
            MapError::Persistence(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::InvalidParty(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

//! SQLite-backed map and run storage.
//!
//! Cells, dungeons and results are stored as JSON documents next to the
//! columns needed for lookup. A generated cell and its dungeons are written
//! in one transaction; a discovery is a single JSON update of the stored cell.

use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

use cryptforge_domain::{Dungeon, DungeonId, MapCell, RunEvent, RunId, RunResult};

use crate::infrastructure::ports::{
    CellFilter, CellPage, ClockPort, MapRepo, RepoError, RunRepo,
};

/// SQLite implementation of the map and run repositories.
pub struct SqliteStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteStore {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        for statement in [
            r#"
            CREATE TABLE IF NOT EXISTS map_cells (
                x INTEGER NOT NULL,
                y INTEGER NOT NULL,
                has_dungeon INTEGER NOT NULL,
                cell_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (x, y)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS dungeons (
                id TEXT PRIMARY KEY,
                dungeon_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS run_results (
                run_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                result_json TEXT NOT NULL,
                finished_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS run_events (
                run_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                event_json TEXT NOT NULL,
                PRIMARY KEY (run_id, seq)
            )
            "#,
        ] {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| RepoError::database("migrate", e))?;
        }

        Ok(Self { pool, clock })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepoError> {
    serde_json::to_string(value).map_err(RepoError::serialization)
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, RepoError> {
    serde_json::from_str(json).map_err(RepoError::serialization)
}

async fn fetch_cell(
    conn: &mut SqliteConnection,
    x: i32,
    y: i32,
) -> Result<Option<MapCell>, RepoError> {
    let row = sqlx::query("SELECT cell_json FROM map_cells WHERE x = ? AND y = ?")
        .bind(x)
        .bind(y)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| RepoError::database("get_cell", e))?;

    row.map(|row| from_json(&row.get::<String, _>("cell_json")))
        .transpose()
}

/// Insert the cell unless `(x, y)` is taken, then read back what is stored.
async fn insert_cell(
    conn: &mut SqliteConnection,
    cell: &MapCell,
    now: &str,
) -> Result<MapCell, RepoError> {
    sqlx::query(
        r#"
        INSERT INTO map_cells (x, y, has_dungeon, cell_json, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(x, y) DO NOTHING
        "#,
    )
    .bind(cell.x)
    .bind(cell.y)
    .bind(cell.has_dungeon())
    .bind(to_json(cell)?)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepoError::database("save_cell", e))?;

    fetch_cell(conn, cell.x, cell.y)
        .await?
        .ok_or_else(|| RepoError::not_found("MapCell", format!("{},{}", cell.x, cell.y)))
}

async fn upsert_dungeon(
    conn: &mut SqliteConnection,
    dungeon: &Dungeon,
    now: &str,
) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO dungeons (id, dungeon_json, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            dungeon_json = excluded.dungeon_json
        "#,
    )
    .bind(dungeon.id.as_str())
    .bind(to_json(dungeon)?)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepoError::database("save_dungeon", e))?;

    Ok(())
}

#[async_trait]
impl MapRepo for SqliteStore {
    async fn get_cell(&self, x: i32, y: i32) -> Result<Option<MapCell>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("get_cell", e))?;
        fetch_cell(&mut conn, x, y).await
    }

    async fn save_cell(&self, cell: &MapCell) -> Result<MapCell, RepoError> {
        let now = self.clock.now().to_rfc3339();
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("save_cell", e))?;
        insert_cell(&mut conn, cell, &now).await
    }

    async fn record_discovery(
        &self,
        x: i32,
        y: i32,
        explorer: &str,
    ) -> Result<Option<MapCell>, RepoError> {
        let now = self.clock.now().to_rfc3339();
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("record_discovery", e))?;

        sqlx::query(
            r#"
            UPDATE map_cells
            SET cell_json = json_insert(cell_json, '$.discoveredBy[#]', ?),
                updated_at = ?
            WHERE x = ? AND y = ?
              AND NOT EXISTS (
                  SELECT 1 FROM json_each(map_cells.cell_json, '$.discoveredBy')
                  WHERE json_each.value = ?
              )
            "#,
        )
        .bind(explorer)
        .bind(now)
        .bind(x)
        .bind(y)
        .bind(explorer)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepoError::database("record_discovery", e))?;

        fetch_cell(&mut conn, x, y).await
    }

    async fn get_dungeon(&self, id: &DungeonId) -> Result<Option<Dungeon>, RepoError> {
        let row = sqlx::query("SELECT dungeon_json FROM dungeons WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_dungeon", e))?;

        row.map(|row| from_json(&row.get::<String, _>("dungeon_json")))
            .transpose()
    }

    async fn save_dungeon(&self, dungeon: &Dungeon) -> Result<(), RepoError> {
        let now = self.clock.now().to_rfc3339();
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("save_dungeon", e))?;
        upsert_dungeon(&mut conn, dungeon, &now).await
    }

    async fn save_generated(
        &self,
        cell: &MapCell,
        dungeons: &[Dungeon],
    ) -> Result<MapCell, RepoError> {
        let now = self.clock.now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("save_generated", e))?;

        for dungeon in dungeons {
            upsert_dungeon(&mut tx, dungeon, &now).await?;
        }
        let stored = insert_cell(&mut tx, cell, &now).await?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("save_generated", e))?;
        Ok(stored)
    }

    async fn query_cells(&self, filter: &CellFilter) -> Result<CellPage, RepoError> {
        // Region and dungeon presence are narrowed in SQL, JSON fields in memory
        let mut sql = String::from("SELECT cell_json FROM map_cells WHERE 1 = 1");
        if filter.region.is_some() {
            sql.push_str(" AND x BETWEEN ? AND ? AND y BETWEEN ? AND ?");
        }
        if filter.has_dungeon.is_some() {
            sql.push_str(" AND has_dungeon = ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(region) = filter.region {
            query = query
                .bind(region.x_min)
                .bind(region.x_max)
                .bind(region.y_min)
                .bind(region.y_max);
        }
        if let Some(has_dungeon) = filter.has_dungeon {
            query = query.bind(has_dungeon);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("query_cells", e))?;

        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let cell: MapCell = from_json(&row.get::<String, _>("cell_json"))?;
            if filter.matches(&cell) {
                cells.push(cell);
            }
        }
        Ok(filter.paginate(cells))
    }
}

#[async_trait]
impl RunRepo for SqliteStore {
    async fn save_result(&self, result: &RunResult) -> Result<(), RepoError> {
        let json = to_json(result)?;

        sqlx::query(
            r#"
            INSERT INTO run_results (run_id, status, result_json, finished_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(result.run_id.to_string())
        .bind(result.status.as_str())
        .bind(json)
        .bind(result.finished_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::constraint(
                format!("run {} already has a terminal result", result.run_id),
            ),
            other => RepoError::database("save_result", other),
        })?;

        Ok(())
    }

    async fn get_result(&self, run_id: RunId) -> Result<Option<RunResult>, RepoError> {
        let row = sqlx::query("SELECT result_json FROM run_results WHERE run_id = ?")
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_result", e))?;

        row.map(|row| from_json(&row.get::<String, _>("result_json")))
            .transpose()
    }

    async fn append_events(&self, run_id: RunId, events: &[RunEvent]) -> Result<(), RepoError> {
        let run_key = run_id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("append_events", e))?;

        let next: i64 = sqlx::query(
            "SELECT COALESCE(MAX(seq) + 1, 0) AS next FROM run_events WHERE run_id = ?",
        )
        .bind(&run_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepoError::database("append_events", e))?
        .get("next");

        for (offset, event) in events.iter().enumerate() {
            sqlx::query("INSERT INTO run_events (run_id, seq, event_json) VALUES (?, ?, ?)")
                .bind(&run_key)
                .bind(next + offset as i64)
                .bind(to_json(event)?)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("append_events", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("append_events", e))?;
        Ok(())
    }

    async fn get_events(&self, run_id: RunId) -> Result<Vec<RunEvent>, RepoError> {
        let rows = sqlx::query("SELECT event_json FROM run_events WHERE run_id = ? ORDER BY seq")
            .bind(run_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_events", e))?;

        rows.iter()
            .map(|row| from_json(&row.get::<String, _>("event_json")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use cryptforge_domain::generation::generate_cell;
    use cryptforge_domain::{FeatureType, MapRegion, RunStatus, SurfaceOptions};

    async fn store(dir: &tempfile::TempDir) -> SqliteStore {
        let path = dir.path().join("cryptforge.db");
        let now = Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap();
        SqliteStore::new(path.to_str().unwrap(), Arc::new(FixedClock(now)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cells_and_dungeons_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let options = SurfaceOptions {
            dungeon_depth: 3,
            ..SurfaceOptions::default()
        };

        let mut saved = 0;
        for x in 0..60 {
            let generated = generate_cell("sqlite", x, 1, &options).unwrap();
            for dungeon in &generated.dungeons {
                store.save_dungeon(dungeon).await.unwrap();
                let loaded = store.get_dungeon(&dungeon.id).await.unwrap().unwrap();
                assert_eq!(&loaded, dungeon);
            }
            store.save_cell(&generated.cell).await.unwrap();
            assert_eq!(store.get_cell(x, 1).await.unwrap(), Some(generated.cell));
            saved += 1;
        }
        assert_eq!(saved, 60);
        assert!(store.get_cell(0, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn generated_cell_is_stored_once_with_its_dungeons() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let options = SurfaceOptions {
            dungeon_depth: 2,
            ..SurfaceOptions::default()
        };
        let generated = (0..200)
            .map(|x| generate_cell("tx", x, 0, &options).unwrap())
            .find(|g| !g.dungeons.is_empty())
            .unwrap();
        let (x, y) = (generated.cell.x, generated.cell.y);

        let stored = store
            .save_generated(&generated.cell, &generated.dungeons)
            .await
            .unwrap();
        assert_eq!(stored, generated.cell);
        for dungeon in &generated.dungeons {
            assert!(store.get_dungeon(&dungeon.id).await.unwrap().is_some());
        }

        store.record_discovery(x, y, "alice").await.unwrap();
        let again = store
            .save_generated(&generated.cell, &generated.dungeons)
            .await
            .unwrap();
        assert_eq!(again.discovered_by, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn discoveries_append_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let generated = generate_cell("disc", 3, 3, &SurfaceOptions::default()).unwrap();
        store.save_cell(&generated.cell).await.unwrap();

        let (a, b) = tokio::join!(
            store.record_discovery(3, 3, "alice"),
            store.record_discovery(3, 3, "bob"),
        );
        a.unwrap();
        b.unwrap();
        let cell = store
            .record_discovery(3, 3, "alice")
            .await
            .unwrap()
            .unwrap();

        let mut found = cell.discovered_by.clone();
        found.sort();
        assert_eq!(found, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(cell.features, generated.cell.features);
        assert!(store.record_discovery(9, 9, "carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_filters_and_orders_cells() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let options = SurfaceOptions {
            include_dungeons: false,
            ..SurfaceOptions::default()
        };
        for x in (0..5).rev() {
            for y in 0..5 {
                let generated = generate_cell("q", x, y, &options).unwrap();
                store.save_cell(&generated.cell).await.unwrap();
            }
        }

        let page = store
            .query_cells(&CellFilter {
                region: Some(MapRegion::new(1, 2, 0, 4)),
                limit: 3,
                ..CellFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 10);
        assert!(page.has_more);
        let coords: Vec<_> = page.cells.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords, vec![(1, 0), (1, 1), (1, 2)]);

        let forests = store
            .query_cells(&CellFilter {
                feature: Some(FeatureType::Forest),
                limit: 100,
                ..CellFilter::default()
            })
            .await
            .unwrap();
        assert!(forests
            .cells
            .iter()
            .all(|c| c.has_feature(FeatureType::Forest)));
    }

    #[tokio::test]
    async fn terminal_result_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let run_id = RunId::new();
        let finished = Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap();

        let result = RunResult::error(run_id, DungeonId::from("d"), "boom", finished);
        store.save_result(&result).await.unwrap();
        let err = store.save_result(&result).await.unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));

        let loaded = store.get_result(run_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Error);
        assert_eq!(loaded, result);
    }

    #[tokio::test]
    async fn events_keep_append_order_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let run_id = RunId::new();

        store
            .append_events(run_id, &[RunEvent::Rest { level: 1 }, RunEvent::Rest { level: 2 }])
            .await
            .unwrap();
        store
            .append_events(run_id, &[RunEvent::PartyWipe { level: 3 }])
            .await
            .unwrap();

        assert_eq!(
            store.get_events(run_id).await.unwrap(),
            vec![
                RunEvent::Rest { level: 1 },
                RunEvent::Rest { level: 2 },
                RunEvent::PartyWipe { level: 3 },
            ]
        );
    }
}

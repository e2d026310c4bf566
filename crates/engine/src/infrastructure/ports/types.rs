//! Helper types for port operations.

use chrono::{DateTime, Utc};
use cryptforge_domain::{FeatureType, MapCell, MapRegion, QueueItemId, RunJob};
use serde::{Deserialize, Serialize};

/// Default page size of cell queries.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Largest page a cell query returns.
pub const MAX_PAGE_LIMIT: usize = 1000;

// =============================================================================
// Map Query Types
// =============================================================================

/// Filter for cell queries. Every set field must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFilter {
    pub region: Option<MapRegion>,
    pub feature: Option<FeatureType>,
    pub has_dungeon: Option<bool>,
    pub discovered_by: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for CellFilter {
    fn default() -> Self {
        Self {
            region: None,
            feature: None,
            has_dungeon: None,
            discovered_by: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl CellFilter {
    pub fn matches(&self, cell: &MapCell) -> bool {
        self.region.is_none_or(|r| r.contains(cell.x, cell.y))
            && self.feature.is_none_or(|f| cell.has_feature(f))
            && self.has_dungeon.is_none_or(|d| cell.has_dungeon() == d)
            && self
                .discovered_by
                .as_deref()
                .is_none_or(|who| cell.is_discovered_by(who))
    }

    /// Sort matching cells by `(x, then y)` and cut the requested page.
    pub fn paginate(&self, mut cells: Vec<MapCell>) -> CellPage {
        cells.sort_by_key(|c| (c.x, c.y));
        let total = cells.len();
        let cells: Vec<MapCell> = cells
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();
        let has_more = self.offset.saturating_add(cells.len()) < total;
        CellPage {
            cells,
            total,
            has_more,
        }
    }
}

/// One page of a cell query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPage {
    pub cells: Vec<MapCell>,
    pub total: usize,
    pub has_more: bool,
}

// =============================================================================
// Run Queue Types
// =============================================================================

#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub job: RunJob,
    pub created_at: DateTime<Utc>,
    pub status: QueueItemStatus,
    pub attempts: u32,
    pub error_message: Option<String>,
}

impl QueueItem {
    pub fn new(job: RunJob, created_at: DateTime<Utc>) -> Self {
        Self {
            id: QueueItemId::new(),
            job,
            created_at,
            status: QueueItemStatus::Pending,
            attempts: 0,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptforge_domain::{DungeonEntrance, DungeonKind, MapFeature};

    fn cell(x: i32, y: i32) -> MapCell {
        MapCell {
            x,
            y,
            seed: format!("w-{x}-{y}"),
            features: Vec::new(),
            entrances: Vec::new(),
            discovered_by: Vec::new(),
        }
    }

    #[test]
    fn paginate_orders_by_x_then_y() {
        let filter = CellFilter {
            limit: 2,
            ..CellFilter::default()
        };
        let page = filter.paginate(vec![cell(1, 0), cell(0, 1), cell(0, 0)]);
        let coords: Vec<_> = page.cells.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1)]);
        assert_eq!(page.total, 3);
        assert!(page.has_more);

        let last = CellFilter {
            offset: 2,
            limit: 2,
            ..CellFilter::default()
        }
        .paginate(vec![cell(1, 0), cell(0, 1), cell(0, 0)]);
        assert_eq!(last.cells.len(), 1);
        assert!(!last.has_more);
    }

    #[test]
    fn filter_combines_all_fields() {
        let mut forest = cell(2, 2);
        forest.features.push(MapFeature {
            feature_type: FeatureType::Forest,
            name: "Mosswood".to_string(),
        });
        forest.discovered_by.push("alice".to_string());
        forest.entrances.push(DungeonEntrance {
            dungeon_id: DungeonKind::Dungeon.dungeon_id(2, 2),
            kind: DungeonKind::Dungeon,
            name: "The Pit".to_string(),
            x: 2,
            y: 2,
            max_depth: 10,
        });

        let filter = CellFilter {
            region: Some(MapRegion::new(0, 3, 0, 3)),
            feature: Some(FeatureType::Forest),
            has_dungeon: Some(true),
            discovered_by: Some("alice".to_string()),
            ..CellFilter::default()
        };
        assert!(filter.matches(&forest));
        assert!(!filter.matches(&cell(2, 2)));

        let elsewhere = CellFilter {
            region: Some(MapRegion::new(5, 6, 5, 6)),
            ..CellFilter::default()
        };
        assert!(!elsewhere.matches(&forest));
    }
}

//! Surface map cells.
//!
//! A cell is generated once per `(x, y)` from `worldSeed-x-y` and never changes
//! afterwards, except for its append-only `discovered_by` list.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::ids::DungeonId;

/// Largest region accepted by bulk generation.
pub const MAX_REGION_CELLS: u64 = 10_000;

/// A generated surface cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapCell {
    pub x: i32,
    pub y: i32,
    /// Seed the cell was generated from (`worldSeed-x-y`)
    pub seed: String,
    pub features: Vec<MapFeature>,
    pub entrances: Vec<DungeonEntrance>,
    /// Explorers that discovered this cell, in discovery order
    pub discovered_by: Vec<String>,
}

impl MapCell {
    pub fn has_dungeon(&self) -> bool {
        !self.entrances.is_empty()
    }

    pub fn has_feature(&self, feature_type: FeatureType) -> bool {
        self.features.iter().any(|f| f.feature_type == feature_type)
    }

    pub fn is_discovered_by(&self, explorer: &str) -> bool {
        self.discovered_by.iter().any(|d| d == explorer)
    }

    /// Record a discoverer. Returns false when already recorded.
    pub fn record_discovery(&mut self, explorer: impl Into<String>) -> bool {
        let explorer = explorer.into();
        if self.is_discovered_by(&explorer) {
            return false;
        }
        self.discovered_by.push(explorer);
        true
    }

    /// Entrance selected by the sign of `z`: negative descends, positive ascends,
    /// zero takes the first entrance.
    pub fn entrance_for_z(&self, z: i32) -> Option<&DungeonEntrance> {
        match z.signum() {
            -1 => self.entrances.iter().find(|e| e.kind == DungeonKind::Dungeon),
            1 => self.entrances.iter().find(|e| e.kind == DungeonKind::Tower),
            _ => self.entrances.first(),
        }
    }
}

/// A terrain or landmark feature on a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFeature {
    pub feature_type: FeatureType,
    pub name: String,
}

/// Feature categories with their baseline per-cell chance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Forest,
    Mountain,
    River,
    Lake,
    Cave,
    Ruins,
    Village,
    Shrine,
}

impl FeatureType {
    /// Generation order. Changing it changes every generated map.
    pub const ALL: [FeatureType; 8] = [
        FeatureType::Forest,
        FeatureType::Mountain,
        FeatureType::River,
        FeatureType::Lake,
        FeatureType::Cave,
        FeatureType::Ruins,
        FeatureType::Village,
        FeatureType::Shrine,
    ];

    pub fn baseline_chance(self) -> f64 {
        match self {
            FeatureType::Forest => 0.35,
            FeatureType::Mountain => 0.15,
            FeatureType::River => 0.12,
            FeatureType::Lake => 0.08,
            FeatureType::Cave => 0.05,
            FeatureType::Ruins => 0.07,
            FeatureType::Village => 0.06,
            FeatureType::Shrine => 0.04,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Forest => "forest",
            FeatureType::Mountain => "mountain",
            FeatureType::River => "river",
            FeatureType::Lake => "lake",
            FeatureType::Cave => "cave",
            FeatureType::Ruins => "ruins",
            FeatureType::Village => "village",
            FeatureType::Shrine => "shrine",
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        FeatureType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("Unknown feature type: {s}"))
    }
}

/// Whether a dungeon descends below the surface or a tower rises above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DungeonKind {
    Dungeon,
    Tower,
}

impl DungeonKind {
    /// Sign of z for levels of this kind.
    pub fn z_sign(self) -> i32 {
        match self {
            DungeonKind::Dungeon => -1,
            DungeonKind::Tower => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DungeonKind::Dungeon => "dungeon",
            DungeonKind::Tower => "tower",
        }
    }

    /// Dungeon id derived from entrance coordinates and kind.
    pub fn dungeon_id(self, x: i32, y: i32) -> DungeonId {
        DungeonId::new(format!("dungeon-{x}-{y}-{}", self.as_str()))
    }
}

/// Entrance to a dungeon or tower located on a surface cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonEntrance {
    pub dungeon_id: DungeonId,
    pub kind: DungeonKind,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub max_depth: u32,
}

/// Feature density of a generated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapDensity {
    Sparse,
    #[default]
    Normal,
    Dense,
}

impl MapDensity {
    pub fn multiplier(self) -> f64 {
        match self {
            MapDensity::Sparse => 0.5,
            MapDensity::Normal => 1.0,
            MapDensity::Dense => 1.5,
        }
    }
}

/// Inclusive rectangular region of cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRegion {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl MapRegion {
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn single(x: i32, y: i32) -> Self {
        Self::new(x, x, y, y)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    pub fn cell_count(&self) -> u64 {
        let width = (i64::from(self.x_max) - i64::from(self.x_min) + 1).max(0) as u64;
        let height = (i64::from(self.y_max) - i64::from(self.y_min) + 1).max(0) as u64;
        width * height
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.x_min > self.x_max || self.y_min > self.y_max {
            return Err(GenerationError::InvalidRegion {
                x_min: self.x_min,
                x_max: self.x_max,
                y_min: self.y_min,
                y_max: self.y_max,
            });
        }
        let cells = self.cell_count();
        if cells > MAX_REGION_CELLS {
            return Err(GenerationError::RegionTooLarge {
                cells,
                max: MAX_REGION_CELLS,
            });
        }
        Ok(())
    }

    /// Coordinates in `(x, then y)` order.
    pub fn coordinates(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.x_min..=self.x_max).flat_map(move |x| (self.y_min..=self.y_max).map(move |y| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with_entrances(kinds: &[DungeonKind]) -> MapCell {
        MapCell {
            x: 3,
            y: 4,
            seed: "w-3-4".to_string(),
            features: vec![],
            entrances: kinds
                .iter()
                .map(|kind| DungeonEntrance {
                    dungeon_id: kind.dungeon_id(3, 4),
                    kind: *kind,
                    name: "Test".to_string(),
                    x: 3,
                    y: 4,
                    max_depth: 100,
                })
                .collect(),
            discovered_by: vec![],
        }
    }

    #[test]
    fn region_coordinates_are_x_major() {
        let region = MapRegion::new(0, 1, 0, 1);
        let coords: Vec<_> = region.coordinates().collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn inverted_region_is_rejected() {
        let region = MapRegion::new(2, 1, 0, 0);
        assert!(matches!(
            region.validate(),
            Err(GenerationError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn oversized_region_is_rejected() {
        let region = MapRegion::new(0, 200, 0, 200);
        assert!(matches!(
            region.validate(),
            Err(GenerationError::RegionTooLarge { .. })
        ));
    }

    #[test]
    fn discovery_is_append_only_and_deduplicated() {
        let mut cell = cell_with_entrances(&[]);
        assert!(cell.record_discovery("alice"));
        assert!(cell.record_discovery("bob"));
        assert!(!cell.record_discovery("alice"));
        assert_eq!(cell.discovered_by, vec!["alice", "bob"]);
    }

    #[test]
    fn entrance_selection_follows_z_sign() {
        let cell = cell_with_entrances(&[DungeonKind::Tower, DungeonKind::Dungeon]);
        assert_eq!(cell.entrance_for_z(-5).map(|e| e.kind), Some(DungeonKind::Dungeon));
        assert_eq!(cell.entrance_for_z(2).map(|e| e.kind), Some(DungeonKind::Tower));
        assert_eq!(cell.entrance_for_z(0).map(|e| e.kind), Some(DungeonKind::Tower));
    }

    #[test]
    fn dungeon_id_encodes_entrance_and_kind() {
        assert_eq!(DungeonKind::Tower.dungeon_id(-2, 7).as_str(), "dungeon--2-7-tower");
    }

    #[test]
    fn feature_type_parses_case_insensitively() {
        assert_eq!("Forest".parse::<FeatureType>(), Ok(FeatureType::Forest));
        assert!("swamp".parse::<FeatureType>().is_err());
    }
}

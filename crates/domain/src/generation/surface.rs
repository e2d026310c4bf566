//! Surface cell generation.

use crate::entities::{
    Dungeon, DungeonEntrance, DungeonKind, FeatureType, MapCell, MapDensity, MapFeature,
    DEFAULT_DUNGEON_DEPTH,
};
use crate::error::GenerationError;
use crate::generation::dungeon::generate_dungeon;
use crate::rng::{derive_seed, DeterministicRng};

/// Chance that a cell holds a dungeon entrance. Independent of density.
pub const DUNGEON_ENTRANCE_CHANCE: f64 = 0.10;

/// Inputs that shape a generated cell besides its coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub density: MapDensity,
    pub include_dungeons: bool,
    pub dungeon_depth: u32,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            density: MapDensity::Normal,
            include_dungeons: true,
            dungeon_depth: DEFAULT_DUNGEON_DEPTH,
        }
    }
}

/// A cell together with the structures its entrances lead to.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCell {
    pub cell: MapCell,
    pub dungeons: Vec<Dungeon>,
}

/// Seed of the cell at `(x, y)`.
pub fn cell_seed(world_seed: &str, x: i32, y: i32) -> String {
    format!("{world_seed}-{x}-{y}")
}

/// Generate the cell at `(x, y)` and any dungeon it leads to.
pub fn generate_cell(
    world_seed: &str,
    x: i32,
    y: i32,
    options: &SurfaceOptions,
) -> Result<GeneratedCell, GenerationError> {
    if world_seed.is_empty() {
        return Err(GenerationError::EmptySeed);
    }

    let seed = cell_seed(world_seed, x, y);
    let features = roll_features(&seed, options.density);

    let mut entrances = Vec::new();
    let mut dungeons = Vec::new();
    if options.include_dungeons {
        let dungeon_seed = derive_seed(&seed, "dungeon");
        let mut rng = DeterministicRng::new(&dungeon_seed);
        if rng.chance(DUNGEON_ENTRANCE_CHANCE) {
            let kind = if rng.chance(0.5) {
                DungeonKind::Dungeon
            } else {
                DungeonKind::Tower
            };
            let dungeon = generate_dungeon(&dungeon_seed, x, y, kind, options.dungeon_depth)?;
            entrances.push(DungeonEntrance {
                dungeon_id: dungeon.id.clone(),
                kind,
                name: dungeon.name.clone(),
                x,
                y,
                max_depth: dungeon.depth,
            });
            dungeons.push(dungeon);
        }
    }

    Ok(GeneratedCell {
        cell: MapCell {
            x,
            y,
            seed,
            features,
            entrances,
            discovered_by: Vec::new(),
        },
        dungeons,
    })
}

fn roll_features(seed: &str, density: MapDensity) -> Vec<MapFeature> {
    let mut rng = DeterministicRng::new(seed);
    let multiplier = density.multiplier();
    let mut features = Vec::new();
    for feature_type in FeatureType::ALL {
        if rng.chance(feature_type.baseline_chance() * multiplier) {
            let name = rng
                .pick(feature_names(feature_type))
                .copied()
                .unwrap_or(feature_type.as_str());
            features.push(MapFeature {
                feature_type,
                name: name.to_string(),
            });
        }
    }
    features
}

fn feature_names(feature_type: FeatureType) -> &'static [&'static str] {
    match feature_type {
        FeatureType::Forest => &[
            "Whispering Woods",
            "Darkroot Forest",
            "Elderpine Grove",
            "Mosswood",
        ],
        FeatureType::Mountain => &["Greyspine Peaks", "Ironcrag", "Frostfang Ridge", "The Anvil"],
        FeatureType::River => &["Silverrun", "Blackwater", "The Winding Ford", "Coldbrook"],
        FeatureType::Lake => &["Mirrormere", "Stillwater", "Lake Veyl", "The Drowned Eye"],
        FeatureType::Cave => &["Echo Hollow", "Bat Grotto", "Glimmer Cave", "The Maw"],
        FeatureType::Ruins => &[
            "Fallen Keep",
            "Broken Colonnade",
            "Old Watchtower",
            "Sunken Temple",
        ],
        FeatureType::Village => &["Millbrook", "Oakshade", "Thornbury", "Harrowgate"],
        FeatureType::Shrine => &["Wayside Shrine", "Moonwell", "Altar of Dawn", "Pilgrim's Cairn"],
    }
}

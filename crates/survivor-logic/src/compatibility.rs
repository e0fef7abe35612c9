//! Compatibility scoring: how well an organism fits a biome or the city.
//!
//! Both scores share one shape: a weighted sum over the organism's kingdom
//! stats, plus a bonus per inherent trait, plus a kingdom bonus. Every
//! number lives in a [`ScoringTable`] so tuning never touches the formulas.
//! The default table is the canonical balance; hosts may load their own
//! from JSON.
//!
//! Scores are unbounded and may be negative.
//!
//! ```
//! use survivor_logic::catalog::{Environment, Kingdom, Stat};
//! use survivor_logic::compatibility::{environment_compatibility, ScoringTable};
//! use survivor_logic::organism::Organism;
//!
//! let table = ScoringTable::default();
//! let mut org = Organism::new("Gazelle", Kingdom::Animal, Environment::Grassland);
//! org.set_stat(Stat::Agility, 5).unwrap();
//! org.set_stat(Stat::Resilience, 3).unwrap();
//! assert!(environment_compatibility(&org, Environment::Grassland, &table) >= 8.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{inherent_stats, kingdom_stats, Environment, Kingdom, Stat};
use crate::organism::{Organism, OrganismStatus};
use crate::status::{classify, ENVIRONMENT_THRESHOLDS};

/// Which kingdom × environment bonus layout to use.
///
/// The two layouts come from successive balance passes; they disagree on
/// whether archaea are generalists or extremophile specialists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KingdomBonusPreset {
    /// Archaea favour deserts and tundra; bacteria get +0.5 everywhere.
    #[default]
    Targeted,
    /// Bacteria and archaea both get +0.5 in every biome.
    FlatAdaptability,
}

impl KingdomBonusPreset {
    pub fn table(self) -> BTreeMap<Kingdom, BTreeMap<Environment, f64>> {
        let mut table = BTreeMap::new();
        let mut set = |k: Kingdom, e: Environment, v: f64| {
            table
                .entry(k)
                .or_insert_with(BTreeMap::new)
                .insert(e, v);
        };

        set(Kingdom::Animal, Environment::Grassland, 1.0);
        set(Kingdom::Plant, Environment::Grassland, 1.0);
        set(Kingdom::Plant, Environment::Jungle, 1.0);
        set(Kingdom::Fungi, Environment::Jungle, 1.0);
        set(Kingdom::Protist, Environment::Jungle, 0.5);
        for &env in Environment::all() {
            set(Kingdom::Bacteria, env, 0.5);
        }

        match self {
            Self::Targeted => {
                set(Kingdom::Archaea, Environment::Desert, 1.0);
                set(Kingdom::Archaea, Environment::Tundra, 0.8);
            }
            Self::FlatAdaptability => {
                for &env in Environment::all() {
                    set(Kingdom::Archaea, env, 0.5);
                }
            }
        }

        table
    }
}

/// Every coefficient used by the compatibility formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    /// Per-biome stat weights. Unlisted stats weigh 0.
    pub environment_weights: BTreeMap<Environment, BTreeMap<Stat, f64>>,
    /// Flat bonus per inherent trait in the environment phase.
    pub environment_inherent_bonus: f64,
    /// Kingdom × biome bonus. Missing entries are 0.
    pub kingdom_environment_bonus: BTreeMap<Kingdom, BTreeMap<Environment, f64>>,
    /// City stat weights. Unlisted stats weigh 0.
    pub city_weights: BTreeMap<Stat, f64>,
    /// Inherent traits that earn the larger city bonus.
    pub city_adaptive_traits: Vec<Stat>,
    /// City bonus per inherent trait listed in `city_adaptive_traits`.
    pub city_adaptive_inherent_bonus: f64,
    /// City bonus per any other inherent trait.
    pub city_inherent_bonus: f64,
    /// Flat city bonus (or penalty) per kingdom.
    pub kingdom_city_bonus: BTreeMap<Kingdom, f64>,
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self::with_preset(KingdomBonusPreset::default())
    }
}

impl ScoringTable {
    pub fn with_preset(preset: KingdomBonusPreset) -> Self {
        Self {
            environment_weights: default_environment_weights(),
            environment_inherent_bonus: 1.0,
            kingdom_environment_bonus: preset.table(),
            city_weights: default_city_weights(),
            city_adaptive_traits: vec![Stat::Mutation, Stat::HorizontalGeneTransfer],
            city_adaptive_inherent_bonus: 1.5,
            city_inherent_bonus: 0.5,
            kingdom_city_bonus: default_kingdom_city_bonus(),
        }
    }

    /// Parse a table from JSON. Omitted sections fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn environment_weight(&self, env: Environment, stat: Stat) -> f64 {
        self.environment_weights
            .get(&env)
            .and_then(|w| w.get(&stat))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn city_weight(&self, stat: Stat) -> f64 {
        self.city_weights.get(&stat).copied().unwrap_or(0.0)
    }

    pub fn kingdom_environment_bonus(&self, kingdom: Kingdom, env: Environment) -> f64 {
        self.kingdom_environment_bonus
            .get(&kingdom)
            .and_then(|b| b.get(&env))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn kingdom_city_bonus(&self, kingdom: Kingdom) -> f64 {
        self.kingdom_city_bonus.get(&kingdom).copied().unwrap_or(0.0)
    }
}

fn weights(entries: &[(Stat, f64)]) -> BTreeMap<Stat, f64> {
    entries.iter().copied().collect()
}

fn default_environment_weights() -> BTreeMap<Environment, BTreeMap<Stat, f64>> {
    use Stat::*;
    let mut table = BTreeMap::new();

    table.insert(
        Environment::Grassland,
        weights(&[
            (Agility, 0.8),
            (Resilience, 0.6),
            (HeatResistance, 0.4),
            (Sociability, 0.5),
            (Temerity, -0.3),
            (Vision, 0.3),
            (Fertility, 0.2),
            (Locomotion, 0.2),
            (Photosynthesis, 0.3),
            (RootDepth, 0.4),
            (Height, 0.2),
            (Decomposer, 0.1),
            (Motility, 0.1),
            (Halophile, -0.2),
        ]),
    );

    table.insert(
        Environment::Desert,
        weights(&[
            (HeatResistance, 1.0),
            (Resilience, 0.8),
            (Opportunism, 0.6),
            (ColdResistance, -0.8),
            (Temerity, 0.4),
            (Nocturnal, 0.6),
            (Fertility, -0.2),
            (Locomotion, 0.1),
            (Photosynthesis, 0.2),
            (RootDepth, 0.5),
            (Height, -0.3),
            (Decomposer, -0.2),
            (SporeDispersal, -0.3),
            (Extremophile, 0.3),
            (Thermophile, 0.8),
            (Psychrophile, -0.6),
            (Halophile, 0.5),
        ]),
    );

    table.insert(
        Environment::Tundra,
        weights(&[
            (ColdResistance, 1.0),
            (Resilience, 0.8),
            (Sociability, 0.6),
            (HeatResistance, -0.6),
            (Strength, 0.3),
            (Locomotion, 0.1),
            (Photosynthesis, -0.2),
            (Height, -0.4),
            (Decomposer, 0.1),
            (Extremophile, 0.3),
            (Psychrophile, 0.9),
            (Thermophile, -0.5),
        ]),
    );

    table.insert(
        Environment::Jungle,
        weights(&[
            (Agility, 0.8),
            (Vision, 0.7),
            (Intelligence, 0.5),
            (HeatResistance, 0.4),
            (Fertility, 0.6),
            (Stealth, 0.5),
            (ColdResistance, -0.3),
            (Locomotion, 0.1),
            (Photosynthesis, 0.4),
            (Height, 0.6),
            (Decomposer, 0.6),
            (Parasitic, 0.4),
            (SporeDispersal, 0.5),
            (Motility, 0.3),
            (Phagocytosis, 0.2),
            (Symbiosis, 0.5),
        ]),
    );

    table
}

fn default_city_weights() -> BTreeMap<Stat, f64> {
    use Stat::*;
    weights(&[
        (Intelligence, 0.8),
        (Resilience, 0.7),
        (Resourcefulness, 0.9),
        (Opportunism, 0.6),
        (Sociability, 0.5),
        (Fertility, 0.3),
        (Stealth, 0.4),
        (Nocturnal, 0.7),
        (Audacity, 0.6),
        (Height, -0.5),
        (Decomposer, 0.6),
        (Parasitic, 0.5),
        (SporeDispersal, 0.4),
        (Symbiosis, 0.3),
        (Mutation, 0.4),
        (HorizontalGeneTransfer, 0.4),
        (AntibioticResistance, 0.8),
        (Extremophile, 0.3),
        (Thermophile, 0.2),
        (Psychrophile, 0.1),
        (Halophile, 0.4),
    ])
}

fn default_kingdom_city_bonus() -> BTreeMap<Kingdom, f64> {
    BTreeMap::from([
        (Kingdom::Bacteria, 2.0),
        (Kingdom::Archaea, 1.5),
        (Kingdom::Fungi, 1.0),
        (Kingdom::Animal, 0.5),
        (Kingdom::Plant, -1.0),
        (Kingdom::Protist, -0.5),
    ])
}

/// Weighted sum over the stats the organism's kingdom defines.
fn weighted_stats(organism: &Organism, weight: impl Fn(Stat) -> f64) -> f64 {
    kingdom_stats(organism.kingdom)
        .iter()
        .map(|&s| organism.stat(s) as f64 * weight(s))
        .sum()
}

/// Fitness of `organism` in `environment`.
pub fn environment_compatibility(
    organism: &Organism,
    environment: Environment,
    table: &ScoringTable,
) -> f64 {
    if !organism.has_usable_stats() {
        return 0.0;
    }

    let base = weighted_stats(organism, |s| table.environment_weight(environment, s));
    let inherent =
        inherent_stats(organism.kingdom).len() as f64 * table.environment_inherent_bonus;
    let kingdom = table.kingdom_environment_bonus(organism.kingdom, environment);

    base + inherent + kingdom
}

/// Fitness of `organism` for the city challenge. Independent of biome.
pub fn city_compatibility(organism: &Organism, table: &ScoringTable) -> f64 {
    if !organism.has_usable_stats() {
        return 0.0;
    }

    let base = weighted_stats(organism, |s| table.city_weight(s));
    let inherent: f64 = inherent_stats(organism.kingdom)
        .iter()
        .map(|s| {
            if table.city_adaptive_traits.contains(s) {
                table.city_adaptive_inherent_bonus
            } else {
                table.city_inherent_bonus
            }
        })
        .sum();
    let kingdom = table.kingdom_city_bonus(organism.kingdom);

    base + inherent + kingdom
}

/// Status the organism would earn in its chosen biome right now.
/// Shown to players while they are still allocating points.
pub fn preview_survival(organism: &Organism, table: &ScoringTable) -> (f64, OrganismStatus) {
    let score = environment_compatibility(organism, organism.environment, table);
    (score, classify(score, &ENVIRONMENT_THRESHOLDS))
}

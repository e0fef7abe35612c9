//! Trait catalog: kingdoms, environments and the stat vocabulary.
//!
//! Each kingdom exposes an ordered subset of [`Stat`]. Some of those stats
//! are *inherent*: locked at the maximum value, free of point cost, and
//! immune to contra-stat suppression. The contra table records which stats
//! are worn down when another stat is raised.
//!
//! Every lookup here is a pure match over closed enums, so there is no
//! failure path.
//!
//! ```
//! use survivor_logic::catalog::{inherent_stats, is_inherent, Kingdom, Stat};
//!
//! assert_eq!(inherent_stats(Kingdom::Plant), &[Stat::Photosynthesis]);
//! assert!(is_inherent(Kingdom::Bacteria, Stat::Mutation));
//! assert!(!is_inherent(Kingdom::Animal, Stat::Agility));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// KINGDOMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kingdom {
    Animal,
    Plant,
    Fungi,
    Protist,
    Bacteria,
    Archaea,
}

impl Kingdom {
    pub fn all() -> &'static [Kingdom] {
        &[
            Self::Animal,
            Self::Plant,
            Self::Fungi,
            Self::Protist,
            Self::Bacteria,
            Self::Archaea,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Animal => "Animal",
            Self::Plant => "Plant",
            Self::Fungi => "Fungi",
            Self::Protist => "Protist",
            Self::Bacteria => "Bacteria",
            Self::Archaea => "Archaea",
        }
    }
}

impl fmt::Display for Kingdom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kingdom {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ============================================================================
// ENVIRONMENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Environment {
    Grassland,
    Desert,
    Tundra,
    Jungle,
}

impl Environment {
    pub fn all() -> &'static [Environment] {
        &[Self::Grassland, Self::Desert, Self::Tundra, Self::Jungle]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Grassland => "Grassland",
            Self::Desert => "Desert",
            Self::Tundra => "Tundra",
            Self::Jungle => "Jungle",
        }
    }

    /// Player-facing summary of what the biome demands.
    pub fn description(self) -> &'static str {
        match self {
            Self::Grassland => {
                "Wide open plains with seasonal rainfall and moderate temperatures. \
                 Organisms need adaptations for open spaces and occasional drought."
            }
            Self::Desert => {
                "Hot, dry environment with extreme temperature fluctuations. \
                 Organisms need adaptations for water conservation and heat resistance."
            }
            Self::Tundra => {
                "Cold, harsh environment with permafrost and limited vegetation. \
                 Organisms need adaptations for extreme cold and short growing seasons."
            }
            Self::Jungle => {
                "Dense, humid forest with high biodiversity. Organisms need adaptations \
                 for competition, climbing, and dealing with constant moisture."
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// A kingdom, environment, or stat name that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown catalog name: {0:?}")]
pub struct UnknownName(pub String);

// ============================================================================
// STATS
// ============================================================================

/// Every stat name any kingdom can carry. Serialized in camelCase, which is
/// also the key format of stored roster documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stat {
    // Shared by animals and most other kingdoms
    Agility,
    Strength,
    Intelligence,
    Resilience,
    Temerity,
    Resourcefulness,
    Magnetism,
    AuralAbility,
    Vision,
    Fertility,
    SexAppeal,
    HeatResistance,
    ColdResistance,
    Opportunism,
    Altruism,
    Sociability,
    Stealth,
    Nocturnal,
    Audacity,
    Locomotion,
    // Plant
    Photosynthesis,
    Height,
    RootDepth,
    // Fungi
    Decomposer,
    Parasitic,
    SporeDispersal,
    // Protist
    Motility,
    Phagocytosis,
    Symbiosis,
    // Bacteria
    Mutation,
    HorizontalGeneTransfer,
    AntibioticResistance,
    // Archaea
    Extremophile,
    Thermophile,
    Psychrophile,
    Halophile,
}

impl Stat {
    pub fn all() -> &'static [Stat] {
        use Stat::*;
        &[
            Agility,
            Strength,
            Intelligence,
            Resilience,
            Temerity,
            Resourcefulness,
            Magnetism,
            AuralAbility,
            Vision,
            Fertility,
            SexAppeal,
            HeatResistance,
            ColdResistance,
            Opportunism,
            Altruism,
            Sociability,
            Stealth,
            Nocturnal,
            Audacity,
            Locomotion,
            Photosynthesis,
            Height,
            RootDepth,
            Decomposer,
            Parasitic,
            SporeDispersal,
            Motility,
            Phagocytosis,
            Symbiosis,
            Mutation,
            HorizontalGeneTransfer,
            AntibioticResistance,
            Extremophile,
            Thermophile,
            Psychrophile,
            Halophile,
        ]
    }

    /// Storage key (camelCase).
    pub fn name(self) -> &'static str {
        use Stat::*;
        match self {
            Agility => "agility",
            Strength => "strength",
            Intelligence => "intelligence",
            Resilience => "resilience",
            Temerity => "temerity",
            Resourcefulness => "resourcefulness",
            Magnetism => "magnetism",
            AuralAbility => "auralAbility",
            Vision => "vision",
            Fertility => "fertility",
            SexAppeal => "sexAppeal",
            HeatResistance => "heatResistance",
            ColdResistance => "coldResistance",
            Opportunism => "opportunism",
            Altruism => "altruism",
            Sociability => "sociability",
            Stealth => "stealth",
            Nocturnal => "nocturnal",
            Audacity => "audacity",
            Locomotion => "locomotion",
            Photosynthesis => "photosynthesis",
            Height => "height",
            RootDepth => "rootDepth",
            Decomposer => "decomposer",
            Parasitic => "parasitic",
            SporeDispersal => "sporeDispersal",
            Motility => "motility",
            Phagocytosis => "phagocytosis",
            Symbiosis => "symbiosis",
            Mutation => "mutation",
            HorizontalGeneTransfer => "horizontalGeneTransfer",
            AntibioticResistance => "antibioticResistance",
            Extremophile => "extremophile",
            Thermophile => "thermophile",
            Psychrophile => "psychrophile",
            Halophile => "halophile",
        }
    }

    /// Human-readable label, e.g. "Aural Ability".
    pub fn label(self) -> String {
        let mut out = String::new();
        for (i, c) in self.name().chars().enumerate() {
            if i == 0 {
                out.extend(c.to_uppercase());
            } else if c.is_uppercase() {
                out.push(' ');
                out.push(c);
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stat {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ============================================================================
// KINGDOM VOCABULARIES
// ============================================================================

const ANIMAL_STATS: &[Stat] = &[
    Stat::Locomotion,
    Stat::Agility,
    Stat::Strength,
    Stat::Intelligence,
    Stat::Resilience,
    Stat::Temerity,
    Stat::Resourcefulness,
    Stat::Magnetism,
    Stat::AuralAbility,
    Stat::Vision,
    Stat::Fertility,
    Stat::SexAppeal,
    Stat::HeatResistance,
    Stat::ColdResistance,
    Stat::Opportunism,
    Stat::Altruism,
    Stat::Sociability,
    Stat::Stealth,
    Stat::Nocturnal,
    Stat::Audacity,
];

const PLANT_STATS: &[Stat] = &[
    Stat::Photosynthesis,
    Stat::Height,
    Stat::RootDepth,
    Stat::Resilience,
    Stat::Temerity,
    Stat::Fertility,
    Stat::Magnetism,
    Stat::HeatResistance,
    Stat::ColdResistance,
    Stat::Opportunism,
    Stat::Altruism,
    Stat::Sociability,
];

const FUNGI_STATS: &[Stat] = &[
    Stat::Decomposer,
    Stat::Parasitic,
    Stat::SporeDispersal,
    Stat::Resilience,
    Stat::Temerity,
    Stat::Fertility,
    Stat::Magnetism,
    Stat::HeatResistance,
    Stat::ColdResistance,
    Stat::Opportunism,
    Stat::Altruism,
    Stat::Sociability,
];

const PROTIST_STATS: &[Stat] = &[
    Stat::Motility,
    Stat::Phagocytosis,
    Stat::Symbiosis,
    Stat::Resilience,
    Stat::Temerity,
    Stat::Fertility,
    Stat::Magnetism,
    Stat::HeatResistance,
    Stat::ColdResistance,
    Stat::Opportunism,
    Stat::Altruism,
    Stat::Sociability,
];

const BACTERIA_STATS: &[Stat] = &[
    Stat::Mutation,
    Stat::HorizontalGeneTransfer,
    Stat::AntibioticResistance,
    Stat::Temerity,
    Stat::Fertility,
    Stat::Magnetism,
    Stat::HeatResistance,
    Stat::ColdResistance,
    Stat::Opportunism,
    Stat::Altruism,
    Stat::Sociability,
];

const ARCHAEA_STATS: &[Stat] = &[
    Stat::Extremophile,
    Stat::Thermophile,
    Stat::Psychrophile,
    Stat::Halophile,
    Stat::Temerity,
    Stat::Fertility,
    Stat::Magnetism,
    Stat::HeatResistance,
    Stat::ColdResistance,
    Stat::Opportunism,
    Stat::Altruism,
    Stat::Sociability,
];

/// Ordered stat vocabulary of a kingdom, inherent stats first.
pub fn kingdom_stats(kingdom: Kingdom) -> &'static [Stat] {
    match kingdom {
        Kingdom::Animal => ANIMAL_STATS,
        Kingdom::Plant => PLANT_STATS,
        Kingdom::Fungi => FUNGI_STATS,
        Kingdom::Protist => PROTIST_STATS,
        Kingdom::Bacteria => BACTERIA_STATS,
        Kingdom::Archaea => ARCHAEA_STATS,
    }
}

/// Stats a kingdom is born with at full strength.
pub fn inherent_stats(kingdom: Kingdom) -> &'static [Stat] {
    match kingdom {
        Kingdom::Animal => &[Stat::Locomotion],
        Kingdom::Plant => &[Stat::Photosynthesis],
        Kingdom::Fungi => &[Stat::Decomposer],
        Kingdom::Protist => &[Stat::Motility],
        Kingdom::Bacteria => &[Stat::Mutation, Stat::HorizontalGeneTransfer],
        Kingdom::Archaea => &[Stat::Extremophile],
    }
}

/// Acquired (player-assignable) stats of a kingdom, in display order.
pub fn acquired_stats(kingdom: Kingdom) -> impl Iterator<Item = Stat> {
    kingdom_stats(kingdom)
        .iter()
        .copied()
        .filter(move |s| !is_inherent(kingdom, *s))
}

pub fn is_inherent(kingdom: Kingdom, stat: Stat) -> bool {
    inherent_stats(kingdom).contains(&stat)
}

pub fn is_available(kingdom: Kingdom, stat: Stat) -> bool {
    kingdom_stats(kingdom).contains(&stat)
}

/// Stats worn down when `stat` is raised.
pub fn contra_stats(stat: Stat) -> &'static [Stat] {
    use Stat::*;
    match stat {
        Agility => &[Strength],
        Strength => &[Agility, Stealth],
        Intelligence => &[Strength],
        Resilience => &[Temerity],
        Temerity => &[Resilience],
        Resourcefulness => &[Strength, Temerity],
        Magnetism => &[Stealth],
        AuralAbility => &[Intelligence],
        Vision => &[Intelligence],
        Fertility => &[Resourcefulness, Resilience, Agility],
        SexAppeal => &[Stealth],
        HeatResistance => &[ColdResistance],
        ColdResistance => &[HeatResistance],
        Opportunism => &[Altruism, Sociability],
        Altruism => &[Magnetism, Opportunism],
        Sociability => &[Temerity, Strength],
        Stealth => &[Magnetism, SexAppeal],
        Nocturnal => &[Vision],
        Audacity => &[Stealth, Resilience],
        Height => &[RootDepth],
        RootDepth => &[Height],
        Parasitic => &[Altruism, Decomposer],
        SporeDispersal => &[Resilience],
        Phagocytosis => &[Symbiosis],
        Symbiosis => &[Opportunism],
        AntibioticResistance => &[Fertility, Mutation],
        Thermophile => &[Psychrophile],
        Psychrophile => &[Thermophile],
        Halophile => &[Fertility],
        Locomotion | Photosynthesis | Decomposer | Motility | Mutation
        | HorizontalGeneTransfer | Extremophile => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_kingdom_has_inherent_stats_in_its_vocabulary() {
        for &k in Kingdom::all() {
            assert!(!inherent_stats(k).is_empty(), "{k} has no inherent stat");
            for &s in inherent_stats(k) {
                assert!(is_available(k, s), "{s} inherent but not available to {k}");
            }
        }
    }

    #[test]
    fn vocabularies_have_unique_entries() {
        for &k in Kingdom::all() {
            let stats = kingdom_stats(k);
            let unique: HashSet<_> = stats.iter().collect();
            assert_eq!(unique.len(), stats.len(), "{k} lists a stat twice");
        }
    }

    #[test]
    fn inherent_stats_listed_first() {
        for &k in Kingdom::all() {
            let n = inherent_stats(k).len();
            assert_eq!(&kingdom_stats(k)[..n], inherent_stats(k));
        }
    }

    #[test]
    fn acquired_excludes_inherent() {
        let acquired: Vec<_> = acquired_stats(Kingdom::Bacteria).collect();
        assert!(!acquired.contains(&Stat::Mutation));
        assert!(!acquired.contains(&Stat::HorizontalGeneTransfer));
        assert_eq!(
            acquired.len() + 2,
            kingdom_stats(Kingdom::Bacteria).len()
        );
    }

    #[test]
    fn bacteria_have_two_inherent_traits() {
        assert_eq!(
            inherent_stats(Kingdom::Bacteria),
            &[Stat::Mutation, Stat::HorizontalGeneTransfer]
        );
    }

    #[test]
    fn inherent_stats_suppress_nothing() {
        for &k in Kingdom::all() {
            for &s in inherent_stats(k) {
                assert!(contra_stats(s).is_empty());
            }
        }
    }

    #[test]
    fn stat_is_never_its_own_contra() {
        for &s in Stat::all() {
            assert!(!contra_stats(s).contains(&s), "{s} suppresses itself");
        }
    }

    #[test]
    fn stat_names_round_trip_through_from_str() {
        for &s in Stat::all() {
            assert_eq!(s.name().parse::<Stat>(), Ok(s));
        }
        assert!("wings".parse::<Stat>().is_err());
    }

    #[test]
    fn stat_name_matches_serde_key() {
        let json = serde_json::to_string(&Stat::HorizontalGeneTransfer).unwrap();
        assert_eq!(json, "\"horizontalGeneTransfer\"");
        let json = serde_json::to_string(&Stat::AuralAbility).unwrap();
        assert_eq!(json, format!("\"{}\"", Stat::AuralAbility.name()));
    }

    #[test]
    fn labels_split_camel_case() {
        assert_eq!(Stat::AuralAbility.label(), "Aural Ability");
        assert_eq!(Stat::Agility.label(), "Agility");
        assert_eq!(Stat::HorizontalGeneTransfer.label(), "Horizontal Gene Transfer");
    }

    #[test]
    fn kingdom_and_environment_parse() {
        assert_eq!("Archaea".parse::<Kingdom>(), Ok(Kingdom::Archaea));
        assert_eq!("Jungle".parse::<Environment>(), Ok(Environment::Jungle));
        assert!("Ocean".parse::<Environment>().is_err());
    }

    #[test]
    fn environments_have_descriptions() {
        for &e in Environment::all() {
            assert!(!e.description().is_empty());
        }
    }
}

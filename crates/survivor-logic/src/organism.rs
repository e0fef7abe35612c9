//! Organism model and the stat-allocation rules a player edits under.
//!
//! # Allocation Rules
//!
//! 1. Switching kingdom wipes the stat map and re-seeds it: inherent stats
//!    at 5, acquired stats at 0.
//! 2. Inherent stats cannot be edited.
//! 3. Acquired stats share a budget of [`POINT_BUDGET`] points.
//! 4. Raising a stat by Δ lowers each of its acquired contra-stats by 2Δ,
//!    floored at 0. Lowering a stat has no side effect.
//!
//! A rejected edit leaves the stat map untouched.
//!
//! ```
//! use survivor_logic::catalog::{Environment, Kingdom, Stat};
//! use survivor_logic::organism::Organism;
//!
//! let mut org = Organism::new("Sprinter", Kingdom::Animal, Environment::Grassland);
//! org.set_stat(Stat::Strength, 2).unwrap();
//! org.set_stat(Stat::Agility, 3).unwrap();
//! assert_eq!(org.stat(Stat::Strength), 0); // worn down by agility
//! assert_eq!(org.used_points(), 3);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    contra_stats, inherent_stats, is_available, is_inherent, kingdom_stats, Environment, Kingdom,
    Stat,
};
use crate::constants::{CONTRA_PENALTY_PER_POINT, INHERENT_STAT_VALUE, MAX_STAT_VALUE, POINT_BUDGET};

/// Stat name → value. Keys are unique by construction.
pub type StatMap = BTreeMap<Stat, u8>;

/// Survival status of an organism across phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganismStatus {
    #[default]
    Alive,
    Thriving,
    Surviving,
    Struggling,
    Extinct,
    CitySurvivor,
    CityAdapter,
}

impl OrganismStatus {
    pub fn all() -> &'static [OrganismStatus] {
        &[
            Self::Alive,
            Self::Thriving,
            Self::Surviving,
            Self::Struggling,
            Self::Extinct,
            Self::CitySurvivor,
            Self::CityAdapter,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Thriving => "thriving",
            Self::Surviving => "surviving",
            Self::Struggling => "struggling",
            Self::Extinct => "extinct",
            Self::CitySurvivor => "city_survivor",
            Self::CityAdapter => "city_adapter",
        }
    }

    pub fn is_extinct(self) -> bool {
        self == Self::Extinct
    }
}

impl fmt::Display for OrganismStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A player's submitted organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organism {
    /// Assigned by the session repository on submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub kingdom: Kingdom,
    pub environment: Environment,
    pub stats: StatMap,
    #[serde(default)]
    pub status: OrganismStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

impl Organism {
    /// Fresh, unsubmitted organism with its kingdom's starting stats.
    pub fn new(name: impl Into<String>, kingdom: Kingdom, environment: Environment) -> Self {
        Self {
            id: None,
            name: name.into(),
            kingdom,
            environment,
            stats: initialize_for_kingdom(kingdom),
            status: OrganismStatus::Alive,
            player_name: None,
        }
    }

    /// Switch kingdom, discarding every prior allocation.
    pub fn set_kingdom(&mut self, kingdom: Kingdom) {
        self.kingdom = kingdom;
        self.stats = initialize_for_kingdom(kingdom);
    }

    /// Apply a stat edit. On error the organism is unchanged.
    pub fn set_stat(&mut self, stat: Stat, value: u8) -> Result<(), TraitEditError> {
        self.stats = set_stat(&self.stats, self.kingdom, stat, value)?;
        Ok(())
    }

    pub fn stat(&self, stat: Stat) -> u8 {
        self.stats.get(&stat).copied().unwrap_or(0)
    }

    pub fn used_points(&self) -> u32 {
        used_points(&self.stats, self.kingdom)
    }

    pub fn remaining_points(&self) -> u32 {
        (POINT_BUDGET as u32).saturating_sub(self.used_points())
    }

    /// True when at least one stat of the organism's kingdom is present.
    pub fn has_usable_stats(&self) -> bool {
        self.stats.keys().any(|s| is_available(self.kingdom, *s))
    }

    pub fn is_extinct(&self) -> bool {
        self.status.is_extinct()
    }
}

/// Starting stat map: inherent stats at 5, every acquired stat at 0.
pub fn initialize_for_kingdom(kingdom: Kingdom) -> StatMap {
    kingdom_stats(kingdom)
        .iter()
        .map(|&s| {
            let value = if is_inherent(kingdom, s) {
                INHERENT_STAT_VALUE
            } else {
                0
            };
            (s, value)
        })
        .collect()
}

/// Points spent on acquired stats. Inherent stats are free.
pub fn used_points(stats: &StatMap, kingdom: Kingdom) -> u32 {
    stats
        .iter()
        .filter(|(s, _)| !is_inherent(kingdom, **s))
        .map(|(_, v)| *v as u32)
        .sum()
}

/// Why a stat edit was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraitEditError {
    #[error("{stat} is an inherent trait of {kingdom} and cannot be edited")]
    InvalidTraitEdit { stat: Stat, kingdom: Kingdom },
    #[error("raising {stat} by {delta} needs {needed} points but only {budget} are available")]
    BudgetExceeded {
        stat: Stat,
        delta: u8,
        needed: u32,
        budget: u8,
    },
    #[error("{stat} is not available to {kingdom}")]
    UnknownStat { stat: Stat, kingdom: Kingdom },
    #[error("value {value} is outside 0..={max}")]
    ValueOutOfRange { value: u8, max: u8 },
}

/// Compute the stat map after setting `stat` to `new_value`.
///
/// The input map is never modified; callers swap in the returned map only
/// on success.
pub fn set_stat(
    stats: &StatMap,
    kingdom: Kingdom,
    stat: Stat,
    new_value: u8,
) -> Result<StatMap, TraitEditError> {
    if is_inherent(kingdom, stat) {
        return Err(TraitEditError::InvalidTraitEdit { stat, kingdom });
    }
    if !is_available(kingdom, stat) {
        return Err(TraitEditError::UnknownStat { stat, kingdom });
    }
    if new_value > MAX_STAT_VALUE {
        return Err(TraitEditError::ValueOutOfRange {
            value: new_value,
            max: MAX_STAT_VALUE,
        });
    }

    let current = stats.get(&stat).copied().unwrap_or(0);
    let increase = new_value.saturating_sub(current);
    let used = used_points(stats, kingdom);
    if increase > 0 && used + increase as u32 > POINT_BUDGET as u32 {
        return Err(TraitEditError::BudgetExceeded {
            stat,
            delta: increase,
            needed: used + increase as u32,
            budget: POINT_BUDGET,
        });
    }

    let mut next = stats.clone();
    next.insert(stat, new_value);

    if increase > 0 {
        let penalty = increase.saturating_mul(CONTRA_PENALTY_PER_POINT);
        for &contra in contra_stats(stat) {
            if !is_available(kingdom, contra) || is_inherent(kingdom, contra) {
                continue;
            }
            let entry = next.entry(contra).or_insert(0);
            *entry = entry.saturating_sub(penalty);
        }
    }

    Ok(next)
}

/// Name suggested for a player's organism before they pick their own.
pub fn default_organism_name(player_name: &str) -> String {
    format!("{player_name}'s Organism")
}

/// Problems that block an organism from being submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Organism name is blank.
    EmptyName,
    /// Acquired stats exceed the point budget.
    OverBudget(u32),
    /// An inherent stat is not at its locked value.
    InherentNotLocked(Stat),
    /// A stat key outside the kingdom's vocabulary.
    StatNotInKingdom(Stat),
    /// A stat value above the maximum.
    StatOutOfRange(Stat, u8),
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "organism needs a name"),
            Self::OverBudget(used) => {
                write!(f, "{used} points spent, budget is {POINT_BUDGET}")
            }
            Self::InherentNotLocked(s) => write!(f, "inherent trait {s} must stay at 5"),
            Self::StatNotInKingdom(s) => write!(f, "{s} is not part of this kingdom"),
            Self::StatOutOfRange(s, v) => write!(f, "{s} = {v} exceeds {MAX_STAT_VALUE}"),
        }
    }
}

/// Validate an organism before submission, returning all errors found.
pub fn validate_submission(organism: &Organism) -> Vec<SubmissionError> {
    let mut errors = Vec::new();

    if organism.name.trim().is_empty() {
        errors.push(SubmissionError::EmptyName);
    }

    for (&stat, &value) in &organism.stats {
        if !is_available(organism.kingdom, stat) {
            errors.push(SubmissionError::StatNotInKingdom(stat));
        } else if value > MAX_STAT_VALUE {
            errors.push(SubmissionError::StatOutOfRange(stat, value));
        }
    }

    for &stat in inherent_stats(organism.kingdom) {
        if organism.stat(stat) != INHERENT_STAT_VALUE {
            errors.push(SubmissionError::InherentNotLocked(stat));
        }
    }

    let used = organism.used_points();
    if used > POINT_BUDGET as u32 {
        errors.push(SubmissionError::OverBudget(used));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal() -> Organism {
        Organism::new("Test", Kingdom::Animal, Environment::Grassland)
    }

    #[test]
    fn initialize_sets_inherent_to_max_and_rest_to_zero() {
        for &k in Kingdom::all() {
            let stats = initialize_for_kingdom(k);
            assert_eq!(stats.len(), kingdom_stats(k).len());
            for (&s, &v) in &stats {
                if is_inherent(k, s) {
                    assert_eq!(v, 5, "{k} inherent {s}");
                } else {
                    assert_eq!(v, 0, "{k} acquired {s}");
                }
            }
            assert_eq!(used_points(&stats, k), 0);
        }
    }

    #[test]
    fn inherent_stats_are_free() {
        let org = Organism::new("B", Kingdom::Bacteria, Environment::Desert);
        assert_eq!(org.stat(Stat::Mutation), 5);
        assert_eq!(org.stat(Stat::HorizontalGeneTransfer), 5);
        assert_eq!(org.used_points(), 0);
        assert_eq!(org.remaining_points(), 11);
    }

    #[test]
    fn editing_inherent_is_rejected() {
        let mut org = Organism::new("P", Kingdom::Plant, Environment::Jungle);
        let before = org.stats.clone();
        let err = org.set_stat(Stat::Photosynthesis, 2).unwrap_err();
        assert_eq!(
            err,
            TraitEditError::InvalidTraitEdit {
                stat: Stat::Photosynthesis,
                kingdom: Kingdom::Plant
            }
        );
        assert_eq!(org.stats, before);
    }

    #[test]
    fn foreign_stat_is_rejected() {
        let mut org = Organism::new("P", Kingdom::Plant, Environment::Jungle);
        let err = org.set_stat(Stat::Agility, 1).unwrap_err();
        assert!(matches!(err, TraitEditError::UnknownStat { .. }));
    }

    #[test]
    fn value_above_max_is_rejected() {
        let mut org = animal();
        let err = org.set_stat(Stat::Agility, 6).unwrap_err();
        assert_eq!(err, TraitEditError::ValueOutOfRange { value: 6, max: 5 });
        assert_eq!(org.stat(Stat::Agility), 0);
    }

    #[test]
    fn budget_exceeded_leaves_stats_unchanged() {
        let mut org = animal();
        org.set_stat(Stat::Agility, 5).unwrap();
        org.set_stat(Stat::Resilience, 5).unwrap();
        assert_eq!(org.used_points(), 10);
        let before = org.stats.clone();
        let err = org.set_stat(Stat::Vision, 2).unwrap_err();
        assert_eq!(
            err,
            TraitEditError::BudgetExceeded {
                stat: Stat::Vision,
                delta: 2,
                needed: 12,
                budget: 11
            }
        );
        assert_eq!(org.stats, before);
        assert_eq!(org.used_points(), 10);
    }

    #[test]
    fn budget_allows_exactly_eleven() {
        let mut org = animal();
        org.set_stat(Stat::Agility, 5).unwrap();
        org.set_stat(Stat::Resilience, 5).unwrap();
        org.set_stat(Stat::Vision, 1).unwrap();
        assert_eq!(org.used_points(), 11);
        assert_eq!(org.remaining_points(), 0);
        assert!(org.set_stat(Stat::Stealth, 1).is_err());
    }

    #[test]
    fn lowering_a_stat_refunds_points() {
        let mut org = animal();
        org.set_stat(Stat::Agility, 5).unwrap();
        org.set_stat(Stat::Agility, 2).unwrap();
        assert_eq!(org.used_points(), 2);
    }

    #[test]
    fn contra_suppression_scenario() {
        // agility 0 → 3 with strength 2 leaves strength at max(0, 2 - 6) = 0
        let mut org = animal();
        org.set_stat(Stat::Strength, 2).unwrap();
        org.set_stat(Stat::Agility, 3).unwrap();
        assert_eq!(org.stat(Stat::Strength), 0);
        assert_eq!(org.stat(Stat::Agility), 3);
    }

    #[test]
    fn contra_suppression_is_partial_when_room_remains() {
        let mut org = animal();
        org.set_stat(Stat::Strength, 5).unwrap();
        org.set_stat(Stat::Agility, 1).unwrap();
        assert_eq!(org.stat(Stat::Strength), 3);
    }

    #[test]
    fn decreasing_does_not_suppress() {
        let mut org = animal();
        org.set_stat(Stat::Agility, 3).unwrap();
        org.set_stat(Stat::Strength, 1).unwrap(); // strength → agility: 3 - 2 = 1
        assert_eq!(org.stat(Stat::Agility), 1);
        org.set_stat(Stat::Strength, 0).unwrap();
        assert_eq!(org.stat(Stat::Agility), 1);
    }

    #[test]
    fn inherent_contra_targets_are_immune() {
        // parasitic suppresses decomposer, which fungi carry inherently
        let mut org = Organism::new("F", Kingdom::Fungi, Environment::Jungle);
        org.set_stat(Stat::Parasitic, 4).unwrap();
        assert_eq!(org.stat(Stat::Decomposer), 5);

        let mut bug = Organism::new("B", Kingdom::Bacteria, Environment::Desert);
        bug.set_stat(Stat::AntibioticResistance, 5).unwrap();
        assert_eq!(bug.stat(Stat::Mutation), 5);
    }

    #[test]
    fn contra_outside_vocabulary_is_not_added() {
        // magnetism suppresses stealth, which plants do not have
        let mut org = Organism::new("P", Kingdom::Plant, Environment::Grassland);
        org.set_stat(Stat::Magnetism, 2).unwrap();
        assert!(!org.stats.contains_key(&Stat::Stealth));
    }

    #[test]
    fn switching_kingdom_discards_allocations() {
        let mut org = animal();
        org.set_stat(Stat::Resilience, 4).unwrap();
        org.set_kingdom(Kingdom::Plant);
        assert_eq!(org.stats, initialize_for_kingdom(Kingdom::Plant));
        org.set_kingdom(Kingdom::Animal);
        assert_eq!(org.stat(Stat::Resilience), 0);
        assert_eq!(org.stat(Stat::Locomotion), 5);
    }

    #[test]
    fn used_points_ignores_inherent_keys() {
        let mut stats = StatMap::new();
        stats.insert(Stat::Mutation, 5);
        stats.insert(Stat::Fertility, 3);
        assert_eq!(used_points(&stats, Kingdom::Bacteria), 3);
    }

    #[test]
    fn default_name_uses_player() {
        assert_eq!(default_organism_name("Ada"), "Ada's Organism");
    }

    #[test]
    fn fresh_organism_validates() {
        assert!(validate_submission(&animal()).is_empty());
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut org = animal();
        org.name = "   ".into();
        org.stats.insert(Stat::Photosynthesis, 2);
        org.stats.insert(Stat::Locomotion, 3);
        org.stats.insert(Stat::Agility, 9);
        org.stats.insert(Stat::Resilience, 5);
        let errors = validate_submission(&org);
        assert!(errors.contains(&SubmissionError::EmptyName));
        assert!(errors.contains(&SubmissionError::StatNotInKingdom(Stat::Photosynthesis)));
        assert!(errors.contains(&SubmissionError::InherentNotLocked(Stat::Locomotion)));
        assert!(errors.contains(&SubmissionError::StatOutOfRange(Stat::Agility, 9)));
        assert!(errors
            .iter()
            .any(|e| matches!(e, SubmissionError::OverBudget(_))));
    }

    #[test]
    fn organism_serializes_with_storage_keys() {
        let mut org = Organism::new("Moss", Kingdom::Plant, Environment::Tundra);
        org.player_name = Some("Kai".into());
        org.status = OrganismStatus::CitySurvivor;
        let json = serde_json::to_value(&org).unwrap();
        assert_eq!(json["playerName"], "Kai");
        assert_eq!(json["status"], "city_survivor");
        assert_eq!(json["stats"]["photosynthesis"], 5);
        assert!(json.get("id").is_none());
    }
}

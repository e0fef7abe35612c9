//! Game-state machine and roster scoring passes.
//!
//! [`PhaseMachine`] holds the session's phase and its winners. Each host
//! action checks the current phase first; a rejected action changes
//! nothing. Scoring passes mutate only organism statuses, and extinct
//! organisms are never re-scored.
//!
//! ```text
//! waiting ──start──▶ environment ──move_to_city──▶ city ──run_city──▶ results
//!    │                                              ▲
//!    └─────────────────move_to_city─────────────────┘
//! reset: any state ──▶ waiting
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::catalog::Environment;
use crate::compatibility::{city_compatibility, environment_compatibility, ScoringTable};
use crate::organism::{Organism, OrganismStatus};
use crate::session::{GameSettings, GameState};
use crate::status::{reclassify, CITY_THRESHOLDS, ENVIRONMENT_THRESHOLDS};

/// Something the host asks the game to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostAction {
    Start,
    RunEnvironment,
    MoveToCity,
    RunCity,
    Reset,
    End,
}

impl HostAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::RunEnvironment => "run_environment",
            Self::MoveToCity => "move_to_city",
            Self::RunCity => "run_city",
            Self::Reset => "reset",
            Self::End => "end",
        }
    }

    /// Phases this action may be issued from.
    pub fn allowed_from(self) -> &'static [GameState] {
        match self {
            Self::Start => &[GameState::Waiting],
            Self::RunEnvironment => &[GameState::Environment],
            Self::MoveToCity => &[GameState::Waiting, GameState::Environment],
            Self::RunCity => &[GameState::City, GameState::Results],
            Self::Reset | Self::End => GameState::all(),
        }
    }
}

impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("cannot start a game with no organisms submitted")]
    NoOrganisms,
    #[error("cannot {action} while in the {from} phase")]
    InvalidTransition { from: GameState, action: HostAction },
}

/// Reject `action` unless it is legal from `state`.
pub fn check_transition(state: GameState, action: HostAction) -> Result<(), PhaseError> {
    if action.allowed_from().contains(&state) {
        Ok(())
    } else {
        Err(PhaseError::InvalidTransition {
            from: state,
            action,
        })
    }
}

// ============================================================================
// SCORING PASSES
// ============================================================================

/// Score every living organism against its own biome.
pub fn score_environment(roster: &mut [Organism], table: &ScoringTable) {
    for org in roster.iter_mut().filter(|o| !o.is_extinct()) {
        let score = environment_compatibility(org, org.environment, table);
        org.status = reclassify(org.status, score, &ENVIRONMENT_THRESHOLDS);
        debug!("{} in {}: {:.2} → {}", org.name, org.environment, score, org.status);
    }
}

/// Score every living organism against the city.
pub fn score_city(roster: &mut [Organism], table: &ScoringTable) {
    for org in roster.iter_mut().filter(|o| !o.is_extinct()) {
        let score = city_compatibility(org, table);
        org.status = reclassify(org.status, score, &CITY_THRESHOLDS);
        debug!("{} in city: {:.2} → {}", org.name, score, org.status);
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseMachine {
    pub state: GameState,
    /// Non-extinct organisms after the last city round.
    pub winners: Vec<Organism>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a machine from a stored phase.
    pub fn at(state: GameState) -> Self {
        Self {
            state,
            winners: Vec::new(),
        }
    }

    pub fn start(&mut self, roster: &[Organism]) -> Result<(), PhaseError> {
        check_transition(self.state, HostAction::Start)?;
        if roster.is_empty() {
            return Err(PhaseError::NoOrganisms);
        }
        self.state = GameState::Environment;
        Ok(())
    }

    /// Score the biome round. With `auto_advance` the phase moves on to the
    /// city if anything survived, straight to results otherwise.
    pub fn run_environment(
        &mut self,
        roster: &mut [Organism],
        settings: &GameSettings,
        table: &ScoringTable,
    ) -> Result<StatusSummary, PhaseError> {
        check_transition(self.state, HostAction::RunEnvironment)?;
        score_environment(roster, table);

        if settings.auto_advance {
            self.state = if roster.iter().any(|o| !o.is_extinct()) {
                GameState::City
            } else {
                self.winners.clear();
                GameState::Results
            };
        }

        Ok(StatusSummary::of(roster))
    }

    /// Enter the city phase, optionally skipping the biome round.
    pub fn move_to_city(&mut self) -> Result<(), PhaseError> {
        check_transition(self.state, HostAction::MoveToCity)?;
        self.state = GameState::City;
        Ok(())
    }

    pub fn run_city(
        &mut self,
        roster: &mut [Organism],
        table: &ScoringTable,
    ) -> Result<StatusSummary, PhaseError> {
        check_transition(self.state, HostAction::RunCity)?;
        score_city(roster, table);
        self.winners = roster.iter().filter(|o| !o.is_extinct()).cloned().collect();
        self.state = GameState::Results;
        Ok(StatusSummary::of(roster))
    }

    /// Revive everything and go back to waiting. Legal from any phase.
    pub fn reset(&mut self, roster: &mut [Organism]) {
        for org in roster.iter_mut() {
            org.status = OrganismStatus::Alive;
        }
        self.winners.clear();
        self.state = GameState::Waiting;
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Organism count per status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    counts: HashMap<OrganismStatus, usize>,
    pub total: usize,
}

impl StatusSummary {
    pub fn of(roster: &[Organism]) -> Self {
        let mut summary = Self {
            total: roster.len(),
            ..Self::default()
        };
        for org in roster {
            *summary.counts.entry(org.status).or_insert(0) += 1;
        }
        summary
    }

    pub fn count(&self, status: OrganismStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn survivors(&self) -> usize {
        self.total - self.count(OrganismStatus::Extinct)
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = OrganismStatus::all()
            .iter()
            .filter(|s| self.count(**s) > 0)
            .map(|s| format!("{}={}", s, self.count(*s)))
            .collect();
        write!(f, "{} organisms ({})", self.total, parts.join(", "))
    }
}

/// Living organisms grouped by the biome they chose.
pub fn survivors_by_environment(roster: &[Organism]) -> BTreeMap<Environment, Vec<&Organism>> {
    let mut groups: BTreeMap<Environment, Vec<&Organism>> = BTreeMap::new();
    for org in roster.iter().filter(|o| !o.is_extinct()) {
        groups.entry(org.environment).or_default().push(org);
    }
    groups
}

/// Pick one champion, preferring city survivors over city adapters.
/// The same seed always picks the same organism.
pub fn select_champion(winners: &[Organism], seed: u64) -> Option<&Organism> {
    let best: Vec<&Organism> = winners
        .iter()
        .filter(|o| o.status == OrganismStatus::CitySurvivor)
        .collect();
    let pool: Vec<&Organism> = if best.is_empty() {
        winners.iter().filter(|o| !o.is_extinct()).collect()
    } else {
        best
    };

    let mut rng = StdRng::seed_from_u64(seed);
    pool.choose(&mut rng).copied()
}

//! Host-side phase controller.
//!
//! One controller per session, owned by the host. It is the only writer of
//! the session's phase and organism statuses. Every host action follows the
//! same path: read roster from the store, run the pure phase machine, write
//! statuses, then write the new phase. Store calls go through the retry
//! policy; a failed action leaves the controller's own state untouched.
//!
//! Writes that landed before a later write failed are not rolled back.

use std::sync::Arc;

use log::{info, warn};

use survivor_logic::compatibility::ScoringTable;
use survivor_logic::organism::{validate_submission, Organism, OrganismStatus};
use survivor_logic::phase::{
    check_transition, select_champion, HostAction, PhaseMachine, StatusSummary,
};
use survivor_logic::roster::parse_roster;
use survivor_logic::session::{accepts_submissions, can_join, GameSettings, GameState, Session};

use crate::config::HostConfig;
use crate::error::HostError;
use crate::repository::{RepositoryError, SessionRepository};
use crate::retry::RetryPolicy;

pub struct PhaseController<R> {
    repo: Arc<R>,
    code: String,
    settings: GameSettings,
    table: ScoringTable,
    retry: RetryPolicy,
    champion_seed: Option<u64>,
    machine: PhaseMachine,
}

impl<R: SessionRepository> PhaseController<R> {
    /// Open a new session and take control of it.
    pub async fn create(
        repo: Arc<R>,
        host_name: &str,
        settings: GameSettings,
        config: &HostConfig,
    ) -> Result<Self, HostError> {
        let retry = config.retry;
        let store = &*repo;
        let code = retry
            .run("create_session", move || store.create_session(host_name, settings))
            .await?;
        info!("Host {} opened session {}", host_name, code);

        Ok(Self {
            repo,
            code,
            settings,
            table: config.scoring_table(),
            retry,
            champion_seed: config.champion_seed,
            machine: PhaseMachine::new(),
        })
    }

    /// Resume control of an existing session, e.g. after a host restart.
    pub async fn attach(repo: Arc<R>, code: &str, config: &HostConfig) -> Result<Self, HostError> {
        let retry = config.retry;
        let store = &*repo;
        let record = match retry
            .run("get_session", move || store.get_session(code))
            .await
        {
            Err(HostError::Repository(RepositoryError::SessionNotFound(_))) => {
                return Err(HostError::SessionEnded(code.to_string()));
            }
            other => other?,
        };

        let mut controller = Self {
            repo,
            code: record.code,
            settings: record.settings,
            table: config.scoring_table(),
            retry,
            champion_seed: config.champion_seed,
            machine: PhaseMachine::at(record.state),
        };

        if record.state == GameState::Results {
            let roster = controller.load_roster().await?;
            controller.machine.winners = roster.into_iter().filter(|o| !o.is_extinct()).collect();
        }

        info!("Attached to session {} in {} phase", controller.code, record.state);
        Ok(controller)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> GameState {
        self.machine.state
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Organisms still alive after the last city round.
    pub fn winners(&self) -> &[Organism] {
        &self.machine.winners
    }

    /// Results-screen champion. Stable for a configured seed.
    pub fn champion(&self) -> Option<&Organism> {
        let seed = self.champion_seed.unwrap_or_else(rand::random);
        select_champion(&self.machine.winners, seed)
    }

    // ── Host actions ────────────────────────────────────────────────────

    pub async fn start(&mut self) -> Result<(), HostError> {
        check_transition(self.machine.state, HostAction::Start)?;
        let roster = self.load_roster().await?;
        let mut next = self.machine.clone();
        next.start(&roster)?;

        self.write_phase(next.state).await?;
        self.commit(next, HostAction::Start);
        Ok(())
    }

    /// Score every living organism against its chosen biome.
    pub async fn run_environment_phase(&mut self) -> Result<StatusSummary, HostError> {
        check_transition(self.machine.state, HostAction::RunEnvironment)?;
        let mut roster = self.load_roster().await?;
        let mut next = self.machine.clone();
        let summary = next.run_environment(&mut roster, &self.settings, &self.table)?;

        self.write_roster(&roster).await?;
        if next.state != self.machine.state {
            self.write_phase(next.state).await?;
        }
        info!("Session {} environment round: {}", self.code, summary);
        self.commit(next, HostAction::RunEnvironment);
        Ok(summary)
    }

    /// Enter the city phase. From `waiting` this skips the biome round.
    pub async fn move_to_city_phase(&mut self) -> Result<(), HostError> {
        let mut next = self.machine.clone();
        next.move_to_city()?;

        self.write_phase(next.state).await?;
        self.commit(next, HostAction::MoveToCity);
        Ok(())
    }

    pub async fn run_city_phase(&mut self) -> Result<StatusSummary, HostError> {
        check_transition(self.machine.state, HostAction::RunCity)?;
        let mut roster = self.load_roster().await?;
        let mut next = self.machine.clone();
        let summary = next.run_city(&mut roster, &self.table)?;

        self.write_roster(&roster).await?;
        self.write_phase(next.state).await?;
        info!(
            "Session {} city round: {} ({} winners)",
            self.code,
            summary,
            next.winners.len()
        );
        self.commit(next, HostAction::RunCity);
        Ok(summary)
    }

    /// Revive every organism and return to the waiting room.
    pub async fn reset_game(&mut self) -> Result<(), HostError> {
        let mut roster = self.load_roster().await?;
        let mut next = self.machine.clone();
        next.reset(&mut roster);

        self.write_roster(&roster).await?;
        self.write_phase(next.state).await?;
        self.commit(next, HostAction::Reset);
        Ok(())
    }

    /// Destroy the session. The controller is consumed either way.
    pub async fn end_game(self) -> Result<(), HostError> {
        check_transition(self.machine.state, HostAction::End)?;
        let store = &*self.repo;
        let code = self.code.as_str();
        self.retry
            .run("delete_session", move || store.delete_session(code))
            .await?;
        info!("Session {} ended", self.code);
        Ok(())
    }

    // ── Player actions ──────────────────────────────────────────────────

    /// Admit a player, subject to the late-join setting.
    pub async fn join_game(&self, player_name: &str) -> Result<(), HostError> {
        if !can_join(self.machine.state, &self.settings) {
            return Err(HostError::JoinClosed {
                code: self.code.clone(),
            });
        }
        let store = &*self.repo;
        let code = self.code.as_str();
        self.retry
            .run("join_session", move || store.join_session(code, player_name))
            .await?;
        info!("{} joined session {}", player_name, self.code);
        Ok(())
    }

    /// Accept one organism per player while the session is waiting.
    /// Returns the id the store assigned.
    pub async fn submit_organism(
        &self,
        player_name: &str,
        organism: Organism,
    ) -> Result<String, HostError> {
        if !accepts_submissions(self.machine.state) {
            return Err(HostError::SubmissionsClosed {
                state: self.machine.state,
            });
        }

        let problems = validate_submission(&organism);
        if !problems.is_empty() {
            return Err(HostError::InvalidSubmission(problems));
        }

        let roster = self.load_roster().await?;
        if roster
            .iter()
            .any(|o| o.player_name.as_deref() == Some(player_name))
        {
            return Err(HostError::AlreadySubmitted {
                player: player_name.to_string(),
            });
        }

        let organism = Organism {
            id: None,
            status: OrganismStatus::Alive,
            player_name: Some(player_name.to_string()),
            ..organism
        };
        let store = &*self.repo;
        let code = self.code.as_str();
        let doc = &organism;
        let id = self
            .retry
            .run("add_organism", move || store.add_organism(code, doc))
            .await?;
        info!(
            "{} submitted {} ({} in {}) as {}",
            player_name, organism.name, organism.kingdom, organism.environment, id
        );
        Ok(id)
    }

    /// Full snapshot of the session with its parsed roster.
    pub async fn load_session(&self) -> Result<Session, HostError> {
        let store = &*self.repo;
        let code = self.code.as_str();
        let record = self
            .retry
            .run("get_session", move || store.get_session(code))
            .await?;
        let organisms = self.load_roster().await?;

        Ok(Session {
            code: record.code,
            host_name: record.host_name,
            settings: record.settings,
            state: record.state,
            organisms,
            players: record.players,
        })
    }

    // ── Store plumbing ──────────────────────────────────────────────────

    async fn load_roster(&self) -> Result<Vec<Organism>, HostError> {
        let store = &*self.repo;
        let code = self.code.as_str();
        let docs = self
            .retry
            .run("get_roster", move || store.get_roster(code))
            .await?;
        let parsed = parse_roster(&docs);
        if !parsed.rejected.is_empty() {
            warn!(
                "Session {}: ignoring {} malformed roster entries",
                self.code,
                parsed.rejected.len()
            );
        }
        Ok(parsed.organisms)
    }

    async fn write_roster(&self, roster: &[Organism]) -> Result<(), HostError> {
        let store = &*self.repo;
        let code = self.code.as_str();
        self.retry
            .run("write_roster", move || store.write_roster(code, roster))
            .await
    }

    async fn write_phase(&self, state: GameState) -> Result<(), HostError> {
        let store = &*self.repo;
        let code = self.code.as_str();
        self.retry
            .run("write_phase", move || store.write_phase(code, state))
            .await
    }

    fn commit(&mut self, next: PhaseMachine, action: HostAction) {
        if next.state != self.machine.state {
            info!(
                "Session {}: {} → {} ({})",
                self.code, self.machine.state, next.state, action
            );
        }
        self.machine = next;
    }
}

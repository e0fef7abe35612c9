//! Session store contract.
//!
//! The controller never touches storage directly. Anything that can hold a
//! session's settings, players, phase and roster documents, and push
//! changes to watchers, can back a game.
//!
//! Rosters travel as raw JSON documents because stores are shared with
//! clients that may write partial or stale entries. Callers run them
//! through [`survivor_logic::roster::parse_roster`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use survivor_logic::organism::Organism;
use survivor_logic::session::{GameSettings, GameState, Player};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("session {0} not found")]
    SessionNotFound(String),
    #[error("organism {0:?} has no store id")]
    MissingDocumentId(String),
    #[error("no roster document {id} in session {code}")]
    DocumentNotFound { code: String, id: String },
    #[error("store read failed: {0}")]
    Read(String),
    #[error("store write failed: {0}")]
    Write(String),
}

impl RepositoryError {
    /// Read and write failures may clear up on their own; a missing
    /// session will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_))
    }
}

/// Session metadata without the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub code: String,
    pub host_name: String,
    pub settings: GameSettings,
    pub state: GameState,
    pub players: Vec<Player>,
}

/// Storage and change notification for sessions.
///
/// Subscriptions hand out a `watch` receiver holding the latest value;
/// dropping the receiver unsubscribes. Reconnection, if the backing store
/// needs it, is the implementation's concern.
pub trait SessionRepository: Send + Sync {
    /// Create a session and return its fresh, unique join code.
    fn create_session(
        &self,
        host_name: &str,
        settings: GameSettings,
    ) -> impl Future<Output = Result<String, RepositoryError>> + Send;

    fn get_session(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<SessionRecord, RepositoryError>> + Send;

    /// Add a player. Joining twice with the same name is a no-op.
    fn join_session(
        &self,
        code: &str,
        player_name: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Every roster document, each carrying its store id under `"id"`.
    fn get_roster(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Vec<Value>, RepositoryError>> + Send;

    fn subscribe_roster(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<watch::Receiver<Vec<Value>>, RepositoryError>> + Send;

    /// Store updated organisms, matched to existing documents by id.
    /// Fails without writing anything if any organism has no id or an id
    /// the session does not hold.
    fn write_roster(
        &self,
        code: &str,
        organisms: &[Organism],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn get_phase(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<GameState, RepositoryError>> + Send;

    fn subscribe_phase(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<watch::Receiver<GameState>, RepositoryError>> + Send;

    fn write_phase(
        &self,
        code: &str,
        state: GameState,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Append an organism and return the id the store assigned to it.
    /// Concurrent calls must each get their own id.
    fn add_organism(
        &self,
        code: &str,
        organism: &Organism,
    ) -> impl Future<Output = Result<String, RepositoryError>> + Send;

    fn delete_session(&self, code: &str)
        -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

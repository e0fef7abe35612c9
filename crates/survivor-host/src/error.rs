//! Errors surfaced by the host controller.

use survivor_logic::organism::{SubmissionError, TraitEditError};
use survivor_logic::phase::PhaseError;
use survivor_logic::session::GameState;

use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error(transparent)]
    TraitEdit(#[from] TraitEditError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: RepositoryError,
    },

    #[error("session {code} is not accepting new players")]
    JoinClosed { code: String },

    #[error("organisms can only be submitted while waiting, session is in {state}")]
    SubmissionsClosed { state: GameState },

    #[error("{player} has already submitted an organism")]
    AlreadySubmitted { player: String },

    #[error("organism rejected: {}", join_problems(.0))]
    InvalidSubmission(Vec<SubmissionError>),

    #[error("session {0} has ended")]
    SessionEnded(String),
}

fn join_problems(problems: &[SubmissionError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn retries_exhausted_keeps_cause() {
        let err = HostError::RetriesExhausted {
            operation: "write_roster",
            attempts: 3,
            source: RepositoryError::Write("disk full".into()),
        };
        assert_eq!(err.to_string(), "write_roster failed after 3 attempts");
        assert_eq!(
            err.source().map(|e| e.to_string()).as_deref(),
            Some("store write failed: disk full")
        );
    }

    #[test]
    fn submission_problems_are_listed() {
        let err = HostError::InvalidSubmission(vec![
            SubmissionError::EmptyName,
            SubmissionError::OverBudget(14),
        ]);
        assert_eq!(
            err.to_string(),
            "organism rejected: organism needs a name; 14 points spent, budget is 11"
        );
    }

    #[test]
    fn phase_errors_pass_through() {
        let err: HostError = PhaseError::NoOrganisms.into();
        assert_eq!(err.to_string(), "cannot start a game with no organisms submitted");
    }
}

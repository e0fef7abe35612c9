//! Session aggregate and the rules for joining and submitting.
//!
//! The host controller owns mutation; this module only defines the shape
//! and the join/submission rules that depend on it.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{SESSION_CODE_ALPHABET, SESSION_CODE_LEN};
use crate::organism::Organism;

/// Phase of a session. Moves forward except for an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Waiting,
    Environment,
    City,
    Results,
}

impl GameState {
    pub fn all() -> &'static [GameState] {
        &[Self::Waiting, Self::Environment, Self::City, Self::Results]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Environment => "environment",
            Self::City => "city",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host-chosen options for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    /// Let students join after the waiting phase has ended.
    pub allow_late_join: bool,
    /// Advance the phase automatically after scoring a biome round.
    pub auto_advance: bool,
    /// Reveal scores and statuses to players at the results phase.
    pub show_results: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            allow_late_join: true,
            auto_advance: false,
            show_results: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    /// Whether this player has submitted their organism.
    #[serde(default)]
    pub submitted: bool,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            submitted: false,
        }
    }
}

/// Everything a session holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub code: String,
    pub host_name: String,
    #[serde(default)]
    pub settings: GameSettings,
    #[serde(default)]
    pub state: GameState,
    #[serde(default)]
    pub organisms: Vec<Organism>,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Session {
    pub fn new(code: impl Into<String>, host_name: impl Into<String>, settings: GameSettings) -> Self {
        Self {
            code: code.into(),
            host_name: host_name.into(),
            settings,
            state: GameState::Waiting,
            organisms: Vec::new(),
            players: Vec::new(),
        }
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn has_submitted(&self, player_name: &str) -> bool {
        self.organisms
            .iter()
            .any(|o| o.player_name.as_deref() == Some(player_name))
    }
}

/// Draw a fresh join code. Uniqueness is the repository's job.
pub fn generate_session_code<R: Rng>(rng: &mut R) -> String {
    (0..SESSION_CODE_LEN)
        .map(|_| {
            let i = rng.gen_range(0..SESSION_CODE_ALPHABET.len());
            SESSION_CODE_ALPHABET[i] as char
        })
        .collect()
}

/// Six characters, uppercase letters and digits only.
pub fn is_valid_session_code(code: &str) -> bool {
    code.len() == SESSION_CODE_LEN && code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b))
}

/// Whether a new player may join a session in `state`.
pub fn can_join(state: GameState, settings: &GameSettings) -> bool {
    state == GameState::Waiting || settings.allow_late_join
}

/// Organisms may only be submitted before the game starts.
pub fn accepts_submissions(state: GameState) -> bool {
    state == GameState::Waiting
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Environment, Kingdom};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn settings_defaults() {
        let s = GameSettings::default();
        assert!(s.allow_late_join);
        assert!(!s.auto_advance);
        assert!(s.show_results);
    }

    #[test]
    fn settings_fill_missing_fields() {
        let s: GameSettings = serde_json::from_str(r#"{"autoAdvance": true}"#).unwrap();
        assert!(s.auto_advance);
        assert!(s.allow_late_join);
    }

    #[test]
    fn generated_codes_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_session_code(&mut rng);
            assert!(is_valid_session_code(&code), "{code}");
        }
    }

    #[test]
    fn code_validation() {
        assert!(is_valid_session_code("AB12CD"));
        assert!(!is_valid_session_code("ab12cd"));
        assert!(!is_valid_session_code("AB12C"));
        assert!(!is_valid_session_code("AB12CDE"));
        assert!(!is_valid_session_code("AB-2CD"));
    }

    #[test]
    fn join_rules() {
        let open = GameSettings::default();
        let closed = GameSettings {
            allow_late_join: false,
            ..open
        };
        for &state in GameState::all() {
            assert!(can_join(state, &open));
            assert_eq!(can_join(state, &closed), state == GameState::Waiting);
        }
    }

    #[test]
    fn submissions_only_while_waiting() {
        assert!(accepts_submissions(GameState::Waiting));
        assert!(!accepts_submissions(GameState::Environment));
        assert!(!accepts_submissions(GameState::Results));
    }

    #[test]
    fn has_submitted_matches_player_name() {
        let mut session = Session::new("ABC123", "Ms. Reyes", GameSettings::default());
        let mut org = Organism::new("Moss", Kingdom::Plant, Environment::Tundra);
        org.player_name = Some("Kai".into());
        session.organisms.push(org);
        assert!(session.has_submitted("Kai"));
        assert!(!session.has_submitted("Ana"));
    }

    #[test]
    fn game_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&GameState::City).unwrap(), "\"city\"");
    }
}

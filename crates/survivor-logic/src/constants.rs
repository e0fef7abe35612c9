//! Game constants: point budget, stat range and classification thresholds.
//!
//! Plain values with no storage dependency. Both the host controller and
//! the headless harness use these.

/// Points a player may spend across all acquired stats of one organism.
pub const POINT_BUDGET: u8 = 11;

/// Highest value any stat can hold.
pub const MAX_STAT_VALUE: u8 = 5;

/// Value every inherent stat is locked at.
pub const INHERENT_STAT_VALUE: u8 = MAX_STAT_VALUE;

/// Each point added to a stat removes this many points from its contra-stats.
pub const CONTRA_PENALTY_PER_POINT: u8 = 2;

/// Length of a session join code.
pub const SESSION_CODE_LEN: usize = 6;

/// Alphabet session codes are drawn from.
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Slack allowed when comparing a score to a band minimum, so a weighted
/// sum that should land exactly on a threshold is not pushed below it by
/// rounding.
pub const SCORE_TOLERANCE: f64 = 1e-9;

pub mod environment_thresholds {
    pub const THRIVING: f64 = 8.0;
    pub const SURVIVING: f64 = 5.0;
    pub const STRUGGLING: f64 = 3.0;
}

pub mod city_thresholds {
    pub const SURVIVOR: f64 = 5.0;
    pub const ADAPTER: f64 = 3.0;
}

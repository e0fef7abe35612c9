//! Pure game logic for Survivor: Adaptation.
//!
//! This crate contains every rule of the classroom game that is independent
//! of storage, transport, or UI. Functions take plain data and return
//! results, so the same code runs inside the host controller, the headless
//! harness, and unit tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Kingdoms, environments, stat vocabulary, inherent traits, contra-stats |
//! | [`compatibility`] | Environment and city compatibility scoring, coefficient table |
//! | [`constants`] | Point budget, stat range, status thresholds |
//! | [`organism`] | Organism model, stat allocation rules, submission validation |
//! | [`phase`] | Game-state machine and roster scoring passes |
//! | [`roster`] | Defensive parsing of loosely-typed roster documents |
//! | [`session`] | Session aggregate, settings, join rules, session codes |
//! | [`status`] | Score → status classification bands |

pub mod catalog;
pub mod compatibility;
pub mod constants;
pub mod organism;
pub mod phase;
pub mod roster;
pub mod session;
pub mod status;

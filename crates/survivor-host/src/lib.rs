//! Host side of Survivor: Adaptation.
//!
//! Drives one classroom session through its phases on top of any store
//! that implements [`SessionRepository`]. All rules come from
//! `survivor_logic`; this crate adds persistence, retries, and logging.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | `HostConfig` loaded from JSON, validation |
//! | [`controller`] | `PhaseController`, the single writer of a session |
//! | [`error`] | `HostError` |
//! | [`memory`] | `InMemoryRepository` for tests and the harness |
//! | [`repository`] | `SessionRepository` contract and its errors |
//! | [`retry`] | Bounded exponential backoff |

pub mod config;
pub mod controller;
pub mod error;
pub mod memory;
pub mod repository;
pub mod retry;

pub use config::HostConfig;
pub use controller::PhaseController;
pub use error::HostError;
pub use memory::InMemoryRepository;
pub use repository::{RepositoryError, SessionRecord, SessionRepository};
pub use retry::RetryPolicy;

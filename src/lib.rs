//! Net Reach - expansion and infiltration engine for an incremental network game
//!
//! The engine is single-threaded and clocked by the caller: every state change
//! happens inside a command or `ExpansionEngine::update`. Resources, heat and
//! player facts live with the host (see [`host`]).

pub mod core;
pub mod expansion;
pub mod host;

pub use crate::core::{EngineConfig, ExpansionError, Result};
pub use expansion::{EngineEvent, ExpansionEngine};
pub use host::{Host, SandboxHost};

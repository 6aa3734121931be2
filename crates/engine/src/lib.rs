#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! Engine side of the DOF bridge: process-wide configuration, level-filtered
//! log emission and the per-instance [`Engine`] contract.

/// Process-wide engine configuration.
pub mod config;
/// Per-instance engine contract.
pub mod engine;
/// Game event records.
pub mod event;
/// Level-filtered log emission.
pub mod log;

mod state;

pub use config::{ConfigSnapshot, LevelError, LogHook, LogLevel};
pub use engine::{Engine, EngineStatus, SessionInfo};
pub use event::{ElementKind, EventRecord};
pub use state::StateEngine;

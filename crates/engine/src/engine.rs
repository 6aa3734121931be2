use serde::{Deserialize, Serialize};

use crate::event::EventRecord;

/// One engine instance driven through the bridge.
///
/// All calls arrive synchronously on the caller's thread. Any logging goes
/// through [`crate::log`] so it reaches the shared process-wide sink.
pub trait Engine: Send {
    /// Start a session for `rom_name`. An empty `table_filename` means no
    /// table file. Called again on a live session, it starts a fresh one.
    fn init(&mut self, table_filename: &str, rom_name: &str);

    /// Apply one event. Called at simulation-frame rate.
    fn data_receive(&mut self, event: EventRecord);

    /// End the current session. The instance may be re-initialised.
    fn finish(&mut self);

    /// Current state for diagnostics.
    fn status(&self) -> EngineStatus;
}

/// Details of an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// ROM the session was started for.
    pub rom_name: String,
    /// Table file, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_filename: Option<String>,
    /// Base path resolved at `init`, when resolution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

/// Engine state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Active session, if any.
    pub session: Option<SessionInfo>,
    /// Number of sessions started over the instance lifetime.
    pub sessions_started: u64,
    /// Events applied in the current session.
    pub events_received: u64,
    /// Elements currently holding a non-zero value.
    pub active_elements: usize,
}

use dof_engine::{ConfigSnapshot, LogLevel};

use crate::forward::{self, LogCallback};

/// Set the directory the engine searches for its configuration files.
///
/// Existence is checked by the engine when a session starts. An empty path
/// selects the engine default (`~/.vpinball/`).
pub fn set_base_path(path: &str) {
    dof_engine::config::set_base_path(path);
}

/// Set the minimum log level. Emissions below it never reach the callback.
pub fn set_log_level(level: LogLevel) {
    dof_engine::config::set_log_level(level);
}

/// Register the log callback, or disable logging with `None`.
pub fn set_log_callback(callback: Option<LogCallback>) {
    forward::register(callback);
}

/// Serializable view of the current configuration.
pub fn snapshot() -> ConfigSnapshot {
    dof_engine::config::snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, capture};

    #[test]
    fn facade_calls_land_in_the_shared_config() {
        let _guard = test_support::lock();

        set_base_path("/opt/vpx/");
        set_log_level(LogLevel::Error);
        set_log_callback(Some(capture));

        let snap = snapshot();
        assert_eq!(snap.base_path, "/opt/vpx/");
        assert_eq!(snap.log_level, LogLevel::Error);
        assert!(snap.has_log_hook);

        set_log_callback(None);
        assert!(!snapshot().has_log_hook);
    }
}

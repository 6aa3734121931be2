use std::fmt;

use crate::config::{self, LogLevel};

/// Emit one log message through the registered hook.
///
/// Dropped when no hook is registered or `level` does not pass the configured
/// minimum. The config lock is released before the hook runs, so the hook may
/// call back into the config setters.
pub fn emit(level: LogLevel, args: fmt::Arguments<'_>) {
    let (hook, minimum) = config::log_route();
    let Some(hook) = hook else {
        return;
    };
    if !level.passes(minimum) {
        return;
    }
    hook(level, args);
}

/// Emit a message at an explicit [`LogLevel`](crate::LogLevel).
#[macro_export]
macro_rules! engine_log {
    ($level:expr, $($arg:tt)+) => {
        $crate::log::emit($level, ::std::format_args!($($arg)+))
    };
}

/// Emit an `INFO` message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::engine_log!($crate::LogLevel::Info, $($arg)+) };
}

/// Emit a `WARN` message.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)+) => { $crate::engine_log!($crate::LogLevel::Warn, $($arg)+) };
}

/// Emit an `ERROR` message.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::engine_log!($crate::LogLevel::Error, $($arg)+) };
}

/// Emit a `DEBUG` message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::engine_log!($crate::LogLevel::Debug, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, record, take_recorded};

    #[test]
    fn no_hook_drops_everything() {
        let _guard = test_support::lock();
        crate::log_error!("lost {}", 1);
        assert!(!config::snapshot().has_log_hook);
        assert!(take_recorded().is_empty());
    }

    #[test]
    fn minimum_level_filters_before_the_hook() {
        let _guard = test_support::lock();
        config::set_log_hook(Some(record));
        config::set_log_level(LogLevel::Warn);

        crate::log_info!("info {}", 1);
        assert!(take_recorded().is_empty());

        crate::log_warn!("warn {}", 2);
        crate::log_error!("error {}", 3);
        crate::log_debug!("debug {}", 4);
        assert_eq!(
            take_recorded(),
            vec![
                (LogLevel::Warn, "warn 2".to_string()),
                (LogLevel::Error, "error 3".to_string()),
                (LogLevel::Debug, "debug 4".to_string()),
            ]
        );
    }

    fn reconfiguring_hook(level: LogLevel, args: fmt::Arguments<'_>) {
        config::set_log_level(LogLevel::Error);
        record(level, args);
    }

    #[test]
    fn hook_may_reenter_config() {
        let _guard = test_support::lock();
        config::set_log_hook(Some(reconfiguring_hook));

        crate::log_info!("first");
        crate::log_info!("second");

        assert_eq!(take_recorded(), vec![(LogLevel::Info, "first".to_string())]);
        assert_eq!(config::log_level(), LogLevel::Error);
    }
}

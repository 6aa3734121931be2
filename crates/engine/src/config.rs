use std::fmt;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Log level attached to every engine log emission.
///
/// The ordinals are part of the C ABI and follow declaration order, not
/// severity: callers match on the numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum LogLevel {
    /// Informational message.
    Info = 0,
    /// Warning.
    Warn = 1,
    /// Error.
    Error = 2,
    /// Debug trace.
    Debug = 3,
}

impl LogLevel {
    /// All levels in ordinal order.
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Debug,
    ];

    /// Numeric value carried across the C boundary.
    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    /// Upper-case tag (`INFO`, `WARN`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Whether an emission at `self` passes a `minimum` threshold.
    ///
    /// Compares ordinals, so a `Debug` minimum only lets `Debug` through.
    pub const fn passes(self, minimum: LogLevel) -> bool {
        self.ordinal() >= minimum.ordinal()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an ordinal does not name a [`LogLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown log level ordinal: {0}")]
pub struct LevelError(pub i32);

impl TryFrom<i32> for LogLevel {
    type Error = LevelError;

    fn try_from(value: i32) -> Result<Self, LevelError> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.ordinal() == value)
            .ok_or(LevelError(value))
    }
}

/// Fixed-shape hook the engine calls for every log emission that passes the
/// level filter. The arguments are formatted lazily by the hook.
pub type LogHook = fn(LogLevel, fmt::Arguments<'_>);

struct ConfigState {
    base_path: String,
    log_level: LogLevel,
    log_hook: Option<LogHook>,
}

static CONFIG: Lazy<RwLock<ConfigState>> = Lazy::new(|| {
    RwLock::new(ConfigState {
        base_path: String::new(),
        log_level: LogLevel::Info,
        log_hook: None,
    })
});

fn read() -> RwLockReadGuard<'static, ConfigState> {
    CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, ConfigState> {
    CONFIG.write().unwrap_or_else(PoisonError::into_inner)
}

/// Serializable view of the process-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Configured base path (empty means the engine default).
    pub base_path: String,
    /// Minimum log level.
    pub log_level: LogLevel,
    /// Whether a log hook is registered.
    pub has_log_hook: bool,
}

/// Set the directory the engine searches for its configuration files.
///
/// Not validated here; engines check it when a session starts.
pub fn set_base_path(path: impl Into<String>) {
    write().base_path = path.into();
}

/// Currently configured base path (empty when unset).
pub fn base_path() -> String {
    read().base_path.clone()
}

/// Set the minimum log level.
pub fn set_log_level(level: LogLevel) {
    write().log_level = level;
}

/// Current minimum log level.
pub fn log_level() -> LogLevel {
    read().log_level
}

/// Register (or clear) the engine's log hook.
pub fn set_log_hook(hook: Option<LogHook>) {
    write().log_hook = hook;
}

pub(crate) fn log_route() -> (Option<LogHook>, LogLevel) {
    let cfg = read();
    (cfg.log_hook, cfg.log_level)
}

/// Snapshot of the configuration.
pub fn snapshot() -> ConfigSnapshot {
    let cfg = read();
    ConfigSnapshot {
        base_path: cfg.base_path.clone(),
        log_level: cfg.log_level,
        has_log_hook: cfg.log_hook.is_some(),
    }
}

/// Base path an engine should use: the configured one, or [`default_base_path`].
pub fn resolve_base_path() -> anyhow::Result<PathBuf> {
    let configured = base_path();
    if configured.is_empty() {
        return default_base_path();
    }
    Ok(PathBuf::from(configured))
}

/// Default base path (`~/.vpinball/`).
pub fn default_base_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .ok_or_else(|| anyhow::anyhow!("HOME is not set"))?;
    let home = PathBuf::from(home);
    if home.as_os_str().is_empty() {
        anyhow::bail!("HOME is set but empty");
    }
    Ok(home.join(".vpinball"))
}

#[cfg(test)]
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use dof_bridge::LogLevel;

const DEFAULT_ON_MS: u64 = 650;
const DEFAULT_OFF_MS: u64 = 650;
const DEFAULT_INIT_WAIT_MS: u64 = 1000;

/// Appends the trailing separator the engine expects on its base path.
fn parse_base_path(input: &str) -> Result<String, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("base path must not be empty".to_string());
    }
    if s.ends_with('/') || s.ends_with('\\') {
        Ok(s.to_string())
    } else {
        Ok(format!("{s}/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Info,
    Warn,
    Error,
    Debug,
}

impl From<LevelArg> for LogLevel {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Info => LogLevel::Info,
            LevelArg::Warn => LogLevel::Warn,
            LevelArg::Error => LogLevel::Error,
            LevelArg::Debug => LogLevel::Debug,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "dof-test",
    version,
    about = "Drive a DOF engine through the C bridge with canned ROM sequences"
)]
pub struct Cli {
    /// ROM to run (default: every built-in sequence).
    #[arg(long, env = "DOF_ROM")]
    pub rom: Option<String>,

    /// Table file handed to `init` (empty: none).
    #[arg(long, env = "DOF_TABLE", default_value = "")]
    pub table: String,

    /// DOF config directory (default: ~/.vpinball/).
    #[arg(long, env = "DOF_BASE_PATH", value_parser = parse_base_path)]
    pub base_path: Option<String>,

    /// Minimum engine log level. Levels compare by ordinal
    /// (info < warn < error < debug), so `info` shows everything.
    #[arg(long, env = "DOF_LOG_LEVEL", value_enum, default_value_t = LevelArg::Info)]
    pub log_level: LevelArg,

    /// How long each output stays on.
    #[arg(long, env = "DOF_ON_MS", default_value_t = DEFAULT_ON_MS)]
    pub on_ms: u64,

    /// Pause after switching an output off.
    #[arg(long, env = "DOF_OFF_MS", default_value_t = DEFAULT_OFF_MS)]
    pub off_ms: u64,

    /// Pause after `init`, before the first event.
    #[arg(long, env = "DOF_INIT_WAIT_MS", default_value_t = DEFAULT_INIT_WAIT_MS)]
    pub init_wait_ms: u64,

    /// JSON step file replacing the built-in sequence.
    #[arg(long, value_name = "FILE", requires = "rom")]
    pub script: Option<PathBuf>,

    /// Print the engine status as JSON before each session ends.
    #[arg(long, default_value_t = false)]
    pub summary: bool,
}

impl Cli {
    pub fn on(&self) -> Duration {
        Duration::from_millis(self.on_ms)
    }

    pub fn off(&self) -> Duration {
        Duration::from_millis(self.off_ms)
    }

    pub fn init_wait(&self) -> Duration {
        Duration::from_millis(self.init_wait_ms)
    }

    /// Parse `args` without the `DOF_*` environment fallbacks.
    #[cfg(test)]
    pub fn parse_args_only<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        use clap::{CommandFactory, FromArgMatches};

        let matches = Self::command()
            .mut_args(|arg| arg.env(None::<&'static str>))
            .try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }
}

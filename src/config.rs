//! Environment-driven debug configuration.
//!
//! Lets a deployed binary turn on build logging or graph dumps without code
//! changes. Settings come from the environment ([`DebugSettings::from_env`])
//! or, with the `config` feature, from JSON.
//!
//! | Variable | Values |
//! |---|---|
//! | `FERROUS_INJECT_LOG` | `off`, `stdout`, `tracing` |
//! | `FERROUS_INJECT_GRAPH` | path of a DOT file to write |
//! | `FERROUS_INJECT_ON_ERROR` | `1`/`true`: only act when the build fails |

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::debug::{self, DebugOption};
use crate::error::{InjectError, InjectResult};

/// Where the build log goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum LogTarget {
    #[default]
    Off,
    Stdout,
    Tracing,
}

impl FromStr for LogTarget {
    type Err = InjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "off" | "none" | "0" => Ok(LogTarget::Off),
            "stdout" | "1" => Ok(LogTarget::Stdout),
            "tracing" => Ok(LogTarget::Tracing),
            other => Err(InjectError::Config(format!(
                "unknown log target `{}`, expected off, stdout or tracing",
                other
            ))),
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogTarget::Off => "off",
            LogTarget::Stdout => "stdout",
            LogTarget::Tracing => "tracing",
        })
    }
}

/// Debug settings for builds.
///
/// ```rust
/// use ferrous_inject::{build_debug, provide, DebugSettings, LogTarget};
///
/// let settings = DebugSettings { log: LogTarget::Tracing, ..Default::default() };
/// build_debug(settings.into_debug_option(), |_: u8| {}, provide(|| 1u8)).unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct DebugSettings {
    pub log: LogTarget,
    /// DOT file written when the build finishes
    pub graph_file: Option<PathBuf>,
    /// Apply the settings only when the build fails
    pub only_on_error: bool,
}

impl DebugSettings {
    pub const LOG_VAR: &'static str = "FERROUS_INJECT_LOG";
    pub const GRAPH_VAR: &'static str = "FERROUS_INJECT_GRAPH";
    pub const ON_ERROR_VAR: &'static str = "FERROUS_INJECT_ON_ERROR";

    /// Reads the settings from the environment. Unset variables keep their defaults.
    pub fn from_env() -> InjectResult<Self> {
        let log = match env::var(Self::LOG_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => LogTarget::Off,
        };
        let graph_file = env::var_os(Self::GRAPH_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        let only_on_error = env::var(Self::ON_ERROR_VAR)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(DebugSettings { log, graph_file, only_on_error })
    }

    /// Parses settings from JSON.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> InjectResult<Self> {
        serde_json::from_str(json).map_err(|e| InjectError::Config(format!("invalid debug settings: {}", e)))
    }

    /// Whether these settings produce any output at all.
    pub fn is_enabled(&self) -> bool {
        self.log != LogTarget::Off || self.graph_file.is_some()
    }

    /// The debug option these settings describe.
    pub fn into_debug_option(self) -> DebugOption {
        if !self.is_enabled() {
            return DebugOption::none();
        }
        let mut options = Vec::new();
        match self.log {
            LogTarget::Off => {}
            LogTarget::Stdout => options.push(debug::stdout_logger()),
            LogTarget::Tracing => options.push(debug::tracing_logger()),
        }
        if let Some(path) = self.graph_file {
            options.push(debug::file_visualizer(path));
        }

        let option = debug::debug_options(options);
        if self.only_on_error {
            debug::on_error(option)
        } else {
            option
        }
    }
}

//! Environment configuration.
//!
//! Everything the toolkit reads from the process environment goes through an
//! [`EnvSnapshot`], so detection and config parsing stay deterministic in tests.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Immutable copy of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns the value when the variable is set to something non-blank.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|value| value.trim().to_ascii_lowercase()),
            Some(value) if value == "1" || value == "true" || value == "yes"
        )
    }
}

/// Value of `FORCE_COLOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceColor {
    Off,
    Basic,
    Ansi256,
    TrueColor,
}

impl ForceColor {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "no" => Self::Off,
            "2" => Self::Ansi256,
            "3" => Self::TrueColor,
            _ => Self::Basic,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub force_color: Option<ForceColor>,
    pub no_color: bool,
    pub debug: bool,
    pub debug_log: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub theme_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        let debug_log = env.non_empty("TAPE_TERM_DEBUG_LOG").map(PathBuf::from);
        Self {
            force_color: env.get("FORCE_COLOR").map(ForceColor::parse),
            no_color: env.non_empty("NO_COLOR").is_some() || env.contains("FORCE_NO_COLOR"),
            debug: env.flag("TAPE_TERM_DEBUG") || debug_log.is_some(),
            debug_log,
            log_filter: env.non_empty("TAPE_TERM_LOG").map(str::to_string),
            theme_path: env.non_empty("TAPE_TERM_THEME").map(PathBuf::from),
        }
    }

    /// Forced-off wins over forced-on.
    pub fn color_forced_off(&self) -> bool {
        self.no_color || self.force_color == Some(ForceColor::Off)
    }
}

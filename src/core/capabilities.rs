//! Output device capability detection.
//!
//! Detection reads a snapshot of the environment plus a tty probe and never
//! fails: when nothing is known, the result is the colorless [`TerminalCapabilities::plain`]
//! profile.
//!
//! Priority order:
//! 1. an explicit [`ColorOverride`] from the command line,
//! 2. `NO_COLOR` / `FORCE_NO_COLOR` / `FORCE_COLOR=0`,
//! 3. `FORCE_COLOR`,
//! 4. CI environments (non-interactive, colorless unless forced),
//! 5. non-tty streams (colorless),
//! 6. `COLORTERM`, `TERM`, and `TERM_PROGRAM` probing.

use std::io::IsTerminal;

use crate::config::{EnvConfig, EnvSnapshot, ForceColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ColorTier {
    #[default]
    None,
    Ansi16,
    Ansi256,
    TrueColor,
}

/// Color selection requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOverride {
    Auto,
    Never,
    Tier(ColorTier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalCapabilities {
    pub color_tier: ColorTier,
    pub unicode: bool,
    pub hyperlinks: bool,
    pub is_tty: bool,
}

const CI_VARS: [&str; 9] = [
    "CI",
    "GITHUB_ACTIONS",
    "TRAVIS",
    "CIRCLECI",
    "APPVEYOR",
    "GITLAB_CI",
    "BUILDKITE",
    "DRONE",
    "TEAMCITY_VERSION",
];

const TRUECOLOR_PROGRAMS: [&str; 4] = ["iTerm.app", "WezTerm", "vscode", "ghostty"];

impl TerminalCapabilities {
    /// No color, ascii only, no cursor control.
    pub const fn plain() -> Self {
        Self {
            color_tier: ColorTier::None,
            unicode: false,
            hyperlinks: false,
            is_tty: false,
        }
    }

    /// Detects capabilities of the process's stdout.
    pub fn detect_stdout() -> Self {
        Self::detect(&std::io::stdout())
    }

    pub fn detect<S: IsTerminal>(stream: &S) -> Self {
        Self::detect_with(&EnvSnapshot::capture(), stream.is_terminal(), ColorOverride::Auto)
    }

    pub fn detect_with(env: &EnvSnapshot, stream_is_tty: bool, color: ColorOverride) -> Self {
        let config = EnvConfig::from_snapshot(env);
        let in_ci = CI_VARS.iter().any(|key| env.contains(key));
        let is_tty = stream_is_tty && !in_ci;
        let unicode = detect_unicode(env);

        let color_tier = match color {
            ColorOverride::Never => ColorTier::None,
            ColorOverride::Tier(tier) => tier,
            ColorOverride::Auto if config.color_forced_off() => ColorTier::None,
            ColorOverride::Auto => match config.force_color {
                Some(ForceColor::Ansi256) => ColorTier::Ansi256,
                Some(ForceColor::TrueColor) => ColorTier::TrueColor,
                Some(_) if env.contains("GITHUB_ACTIONS") => ColorTier::TrueColor,
                Some(_) if in_ci => ColorTier::Ansi16,
                Some(_) => probe_tier(env).max(ColorTier::Ansi16),
                None if !is_tty => ColorTier::None,
                None => probe_tier(env),
            },
        };

        Self {
            color_tier,
            unicode,
            hyperlinks: is_tty && detect_hyperlinks(env),
            is_tty,
        }
    }

    pub fn has_color(&self) -> bool {
        self.color_tier != ColorTier::None
    }
}

fn probe_tier(env: &EnvSnapshot) -> ColorTier {
    let term = env.get("TERM").unwrap_or_default().to_ascii_lowercase();
    let colorterm = env.get("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    let program = env.get("TERM_PROGRAM").unwrap_or_default();

    if colorterm == "truecolor"
        || colorterm == "24bit"
        || term == "xterm-kitty"
        || term.ends_with("-direct")
        || TRUECOLOR_PROGRAMS.contains(&program)
    {
        return ColorTier::TrueColor;
    }
    if colorterm == "yes" || colorterm == "true" || term.contains("256color") || term == "screen" {
        return ColorTier::Ansi256;
    }
    if term == "linux"
        || ["color", "ansi", "xterm", "vt100", "rxvt"]
            .iter()
            .any(|needle| term.contains(needle))
    {
        return ColorTier::Ansi16;
    }
    ColorTier::None
}

fn detect_unicode(env: &EnvSnapshot) -> bool {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .find_map(|key| env.non_empty(key))
        .map(|locale| {
            let locale = locale.to_ascii_lowercase();
            locale.contains("utf-8") || locale.contains("utf8")
        })
        .unwrap_or(false)
}

fn detect_hyperlinks(env: &EnvSnapshot) -> bool {
    let term = env.get("TERM").unwrap_or_default();
    if term.starts_with("screen") || env.contains("TMUX") {
        return false;
    }
    if term == "xterm-kitty" || env.contains("WT_SESSION") {
        return true;
    }
    if let Some(program) = env.get("TERM_PROGRAM") {
        if TRUECOLOR_PROGRAMS.contains(&program) {
            return true;
        }
    }
    env.get("VTE_VERSION")
        .and_then(|value| value.trim().parse::<u32>().ok())
        .is_some_and(|version| version >= 5000)
}

#[cfg(test)]
mod tests {
    use super::{ColorOverride, ColorTier, TerminalCapabilities};
    use crate::config::EnvSnapshot;

    fn detect(pairs: &[(&str, &str)], tty: bool) -> TerminalCapabilities {
        let env = EnvSnapshot::from_pairs(pairs.iter().copied());
        TerminalCapabilities::detect_with(&env, tty, ColorOverride::Auto)
    }

    #[test]
    fn empty_environment_is_colorless() {
        assert_eq!(detect(&[], true).color_tier, ColorTier::None);
        assert_eq!(detect(&[], false), TerminalCapabilities::plain());
    }

    #[test]
    fn non_tty_defaults_to_no_color() {
        let caps = detect(&[("TERM", "xterm-256color"), ("COLORTERM", "truecolor")], false);
        assert_eq!(caps.color_tier, ColorTier::None);
        assert!(!caps.is_tty);
    }

    #[test]
    fn tier_probing_on_tty() {
        assert_eq!(
            detect(&[("COLORTERM", "truecolor")], true).color_tier,
            ColorTier::TrueColor
        );
        assert_eq!(
            detect(&[("TERM", "xterm-kitty")], true).color_tier,
            ColorTier::TrueColor
        );
        assert_eq!(
            detect(&[("TERM", "xterm-256color")], true).color_tier,
            ColorTier::Ansi256
        );
        assert_eq!(detect(&[("TERM", "xterm")], true).color_tier, ColorTier::Ansi16);
        assert_eq!(detect(&[("TERM", "dumb")], true).color_tier, ColorTier::None);
    }

    #[test]
    fn force_flags_override_detection() {
        let caps = detect(&[("FORCE_COLOR", "1")], false);
        assert_eq!(caps.color_tier, ColorTier::Ansi16);

        let caps = detect(&[("FORCE_COLOR", "3"), ("TERM", "xterm")], false);
        assert_eq!(caps.color_tier, ColorTier::TrueColor);

        let caps = detect(&[("NO_COLOR", "1"), ("FORCE_COLOR", "1")], true);
        assert_eq!(caps.color_tier, ColorTier::None);
    }

    #[test]
    fn ci_is_non_interactive_unless_forced() {
        let caps = detect(&[("CI", "true"), ("TERM", "xterm-256color")], true);
        assert!(!caps.is_tty);
        assert_eq!(caps.color_tier, ColorTier::None);

        let caps = detect(&[("GITHUB_ACTIONS", "true"), ("FORCE_COLOR", "")], true);
        assert_eq!(caps.color_tier, ColorTier::TrueColor);
        assert!(!caps.is_tty);

        let caps = detect(&[("GITLAB_CI", "true"), ("FORCE_COLOR", "1")], true);
        assert_eq!(caps.color_tier, ColorTier::Ansi16);
    }

    #[test]
    fn cli_override_beats_environment() {
        let env = EnvSnapshot::from_pairs([("COLORTERM", "truecolor")]);
        let caps = TerminalCapabilities::detect_with(&env, true, ColorOverride::Never);
        assert_eq!(caps.color_tier, ColorTier::None);

        let env = EnvSnapshot::from_pairs([("NO_COLOR", "1")]);
        let caps =
            TerminalCapabilities::detect_with(&env, false, ColorOverride::Tier(ColorTier::Ansi256));
        assert_eq!(caps.color_tier, ColorTier::Ansi256);
    }

    #[test]
    fn unicode_and_hyperlinks() {
        let caps = detect(
            &[("LANG", "en_US.UTF-8"), ("TERM_PROGRAM", "WezTerm")],
            true,
        );
        assert!(caps.unicode);
        assert!(caps.hyperlinks);

        let caps = detect(&[("LANG", "C"), ("TERM", "screen"), ("VTE_VERSION", "6003")], true);
        assert!(!caps.unicode);
        assert!(!caps.hyperlinks);

        let caps = detect(&[("VTE_VERSION", "6003")], false);
        assert!(!caps.hyperlinks);
    }
}

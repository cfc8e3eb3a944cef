//! Themes: a namespaced tree of styles plus the chrome widgets draw with.
//!
//! Color paths look like `location/parts:context/parts`. Resolving a path merges
//! every location prefix and then every context prefix over the root default, so
//! `menu/text:choice/active` inherits from `menu`, `menu/text`, `:choice`,
//! `menu/text:choice` and finally itself. Entries may alias other paths; alias
//! cycles resolve to the default style and produce a warning instead of
//! recursing forever.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Deserialize;

use crate::core::capabilities::TerminalCapabilities;
use crate::core::style::{Attr, Color, Style};
use crate::error::ThemeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeEntry {
    Style(Style),
    /// Resolves to whatever the target path resolves to.
    Alias(String),
    /// Entries merged left to right.
    List(Vec<ThemeEntry>),
}

impl From<Style> for ThemeEntry {
    fn from(style: Style) -> Self {
        Self::Style(style)
    }
}

impl ThemeEntry {
    pub fn alias(path: impl Into<String>) -> Self {
        Self::Alias(path.into())
    }

    /// Parses a space-separated spec such as `bold red on_black` or `@other/path italic`.
    pub fn parse(spec: &str) -> Result<Self, ThemeError> {
        let mut parts = Vec::new();
        let mut style = Style::new();
        let mut styled = false;
        for token in spec.split_whitespace() {
            if let Some(target) = token.strip_prefix('@') {
                if styled {
                    parts.push(ThemeEntry::Style(style));
                    style = Style::new();
                    styled = false;
                }
                parts.push(ThemeEntry::Alias(target.to_string()));
                continue;
            }
            styled = true;
            if let Some(attr) = Attr::parse(token) {
                style = style.with_attr(attr, true);
            } else if let Some(attr) = token.strip_prefix("no_").and_then(Attr::parse) {
                style = style.with_attr(attr, false);
            } else if let Some(color) = token.strip_prefix("on_").and_then(Color::parse) {
                style = style.bg(color);
            } else if let Some(color) = Color::parse(token) {
                style = style.fg(color);
            } else {
                return Err(ThemeError::InvalidColor(token.to_string()));
            }
        }
        if styled || parts.is_empty() {
            parts.push(ThemeEntry::Style(style));
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            ThemeEntry::List(parts)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeWarning {
    Cycle { path: String },
    MissingAlias { from: String, target: String },
}

impl fmt::Display for ThemeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { path } => write!(f, "alias cycle through color path {path:?}"),
            Self::MissingAlias { from, target } => {
                write!(f, "color path {from:?} aliases unknown path {target:?}")
            }
        }
    }
}

/// Result of a traced resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub style: Style,
    pub warnings: Vec<ThemeWarning>,
    /// Distinct paths resolved while answering the request.
    pub paths_resolved: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBarSymbols {
    pub width: usize,
    pub done: String,
    pub pending: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spinner {
    pub frames: Vec<String>,
    pub interval: Duration,
}

impl Spinner {
    pub fn frame(&self, tick: usize) -> &str {
        if self.frames.is_empty() {
            return "";
        }
        &self.frames[tick % self.frames.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    default_style: Style,
    colors: HashMap<String, ThemeEntry>,
    pub progress_bar: ProgressBarSymbols,
    pub spinner: Spinner,
    decorations: HashMap<String, String>,
}

fn normalize_path(path: &str) -> (Vec<String>, Vec<String>) {
    let (loc, ctx) = path.split_once(':').unwrap_or((path, ""));
    let split = |part: &str| {
        part.split(['/', '.'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    (split(loc), split(ctx))
}

fn path_key(loc: &[String], ctx: &[String]) -> String {
    if ctx.is_empty() {
        loc.join("/")
    } else {
        format!("{}:{}", loc.join("/"), ctx.join("/"))
    }
}

/// Keys consulted for a path, least specific first.
fn lookup_keys(path: &str) -> Vec<String> {
    let (loc, ctx) = normalize_path(path);
    let mut keys: Vec<String> = (1..=loc.len()).map(|n| path_key(&loc[..n], &[])).collect();
    for c in 1..=ctx.len() {
        for l in 0..=loc.len() {
            keys.push(path_key(&loc[..l], &ctx[..c]));
        }
    }
    keys
}

struct Resolver<'a> {
    theme: &'a Theme,
    done: HashMap<String, Style>,
    in_progress: HashSet<String>,
    warnings: Vec<ThemeWarning>,
}

impl Resolver<'_> {
    fn resolve_path(&mut self, path: &str) -> Style {
        let key = {
            let (loc, ctx) = normalize_path(path);
            path_key(&loc, &ctx)
        };
        if let Some(style) = self.done.get(&key) {
            return *style;
        }
        if !self.in_progress.insert(key.clone()) {
            self.warnings.push(ThemeWarning::Cycle { path: key });
            return Style::new();
        }

        let theme = self.theme;
        let mut style = Style::new();
        for lookup in lookup_keys(&key) {
            if let Some(entry) = theme.colors.get(&lookup) {
                style = style.merge(&self.resolve_entry(&lookup, entry));
            }
        }

        self.in_progress.remove(&key);
        self.done.insert(key, style);
        style
    }

    fn resolve_entry(&mut self, from: &str, entry: &ThemeEntry) -> Style {
        match entry {
            ThemeEntry::Style(style) => *style,
            ThemeEntry::Alias(target) => {
                if !self.theme.knows(target) {
                    self.warnings.push(ThemeWarning::MissingAlias {
                        from: from.to_string(),
                        target: target.clone(),
                    });
                    return Style::new();
                }
                self.resolve_path(target)
            }
            ThemeEntry::List(entries) => entries.iter().fold(Style::new(), |acc, entry| {
                acc.merge(&self.resolve_entry(from, entry))
            }),
        }
    }
}

impl Theme {
    /// A theme with no colors and ascii chrome.
    pub fn empty() -> Self {
        Self {
            default_style: Style::new(),
            colors: HashMap::new(),
            progress_bar: ProgressBarSymbols {
                width: 15,
                done: "#".to_string(),
                pending: "-".to_string(),
            },
            spinner: Spinner {
                frames: ["|", "/", "-", "\\"].map(str::to_string).to_vec(),
                interval: Duration::from_millis(200),
            },
            decorations: HashMap::new(),
        }
    }

    /// Built-in theme with symbols chosen for the given device.
    pub fn for_capabilities(caps: &TerminalCapabilities) -> Self {
        let mut theme = Self::empty();
        let blue = Style::new().fg(Color::Ansi(4));
        let entries: [(&str, ThemeEntry); 24] = [
            ("accent", blue.into()),
            ("muted", Style::new().dim().into()),
            ("success", Style::new().fg(Color::Ansi(2)).into()),
            ("warning", Style::new().fg(Color::Ansi(3)).into()),
            ("error", Style::new().fg(Color::Ansi(1)).into()),
            ("msg/text:heading", Style::new().bold().into()),
            ("msg/decoration:heading", ThemeEntry::alias("accent")),
            ("msg/text:question", Style::new().bold().into()),
            ("msg/decoration:question", ThemeEntry::alias("accent")),
            ("msg/text:warning", ThemeEntry::alias("warning")),
            ("msg/text:error", ThemeEntry::alias("error")),
            ("msg/text:success", ThemeEntry::alias("success")),
            ("msg/text:hint", ThemeEntry::alias("muted")),
            ("task/spinner", ThemeEntry::alias("accent")),
            ("task/progressbar/done", ThemeEntry::alias("accent")),
            ("task/progressbar/pending", ThemeEntry::alias("muted")),
            ("task:done", ThemeEntry::alias("success")),
            ("task:error", ThemeEntry::alias("error")),
            ("input/decoration", ThemeEntry::alias("accent")),
            ("input/placeholder", ThemeEntry::alias("muted")),
            ("menu/decoration", ThemeEntry::alias("accent")),
            (
                "menu/text:choice/active",
                ThemeEntry::List(vec![ThemeEntry::alias("accent"), Style::new().bold().into()]),
            ),
            ("menu/text:choice/selected", ThemeEntry::alias("success")),
            ("menu/description", ThemeEntry::alias("muted")),
        ];
        for (path, entry) in entries {
            theme.set(path, entry);
        }

        let decorations: [(&str, &str, &str); 9] = [
            ("heading", "⣿ ", "# "),
            ("question", "> ", "> "),
            ("input", "> ", "> "),
            ("choice/active", "> ", "> "),
            ("choice/inactive", "  ", "  "),
            ("checkbox/on", "◼ ", "[x] "),
            ("checkbox/off", "◻ ", "[ ] "),
            ("more/above", "↑ ", "^ "),
            ("more/below", "↓ ", "v "),
        ];
        for (name, unicode, ascii) in decorations {
            let symbol = if caps.unicode { unicode } else { ascii };
            theme.decorations.insert(name.to_string(), symbol.to_string());
        }

        if caps.unicode {
            theme.progress_bar.done = "■".to_string();
            theme.progress_bar.pending = "□".to_string();
            theme.spinner.frames = "⣤⣤⣤⠶⠛⠛⠛⠶".chars().map(String::from).collect();
        }
        theme
    }

    pub fn with_default_style(mut self, style: Style) -> Self {
        self.default_style = style;
        self
    }

    pub fn set(&mut self, path: &str, entry: impl Into<ThemeEntry>) {
        let (loc, ctx) = normalize_path(path);
        self.colors.insert(path_key(&loc, &ctx), entry.into());
    }

    pub fn set_decoration(&mut self, name: &str, symbol: impl Into<String>) {
        self.decorations.insert(name.to_string(), symbol.into());
    }

    pub fn decoration(&self, name: &str) -> &str {
        self.decorations.get(name).map(String::as_str).unwrap_or("")
    }

    fn knows(&self, path: &str) -> bool {
        lookup_keys(path)
            .iter()
            .any(|key| self.colors.contains_key(key))
    }

    /// Resolves `path`, logging any warnings.
    pub fn resolve(&self, path: &str) -> Style {
        let resolution = self.resolve_traced(path);
        for warning in &resolution.warnings {
            tracing::warn!(%warning, "theme resolution fell back to default style");
        }
        resolution.style
    }

    pub fn resolve_traced(&self, path: &str) -> Resolution {
        let mut resolver = Resolver {
            theme: self,
            done: HashMap::new(),
            in_progress: HashSet::new(),
            warnings: Vec::new(),
        };
        let style = resolver.resolve_path(path);
        Resolution {
            style: self.default_style.merge(&style),
            warnings: resolver.warnings,
            paths_resolved: resolver.done.len(),
        }
    }

    /// Applies overrides from a JSON theme file on top of this theme.
    pub fn load_overrides(&mut self, path: &Path) -> Result<(), ThemeError> {
        let raw = fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ThemeFile = serde_json::from_str(&raw).map_err(|source| ThemeError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply(file)
    }

    fn apply(&mut self, file: ThemeFile) -> Result<(), ThemeError> {
        for (path, value) in file.colors {
            let entry = match value {
                ColorValue::One(spec) => ThemeEntry::parse(&spec)?,
                ColorValue::Many(specs) => ThemeEntry::List(
                    specs
                        .iter()
                        .map(|spec| ThemeEntry::parse(spec))
                        .collect::<Result<_, _>>()?,
                ),
            };
            self.set(&path, entry);
        }
        if let Some(bar) = file.progress_bar {
            if let Some(width) = bar.width {
                self.progress_bar.width = width;
            }
            if let Some(done) = bar.done {
                self.progress_bar.done = done;
            }
            if let Some(pending) = bar.pending {
                self.progress_bar.pending = pending;
            }
        }
        if let Some(spinner) = file.spinner {
            if let Some(pattern) = spinner.pattern {
                self.spinner.frames = pattern.chars().map(String::from).collect();
            }
            if let Some(frames) = spinner.frames {
                self.spinner.frames = frames;
            }
            if let Some(ms) = spinner.interval_ms {
                self.spinner.interval = Duration::from_millis(ms.max(1));
            }
        }
        self.decorations.extend(file.decorations);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColorValue {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct ProgressBarFile {
    width: Option<usize>,
    done: Option<String>,
    pending: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpinnerFile {
    pattern: Option<String>,
    frames: Option<Vec<String>>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThemeFile {
    #[serde(default)]
    colors: HashMap<String, ColorValue>,
    progress_bar: Option<ProgressBarFile>,
    spinner: Option<SpinnerFile>,
    #[serde(default)]
    decorations: HashMap<String, String>,
}

/// Swappable handle to the current theme.
#[derive(Debug)]
pub struct ThemeSlot {
    current: RwLock<Arc<Theme>>,
}

impl ThemeSlot {
    pub fn new(theme: Theme) -> Self {
        Self {
            current: RwLock::new(Arc::new(theme)),
        }
    }

    pub fn current(&self) -> Arc<Theme> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn swap(&self, theme: Theme) -> Arc<Theme> {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, Arc::new(theme))
    }
}

#[cfg(test)]
mod tests {
    use super::{lookup_keys, Theme, ThemeEntry, ThemeSlot, ThemeWarning};
    use crate::core::capabilities::TerminalCapabilities;
    use crate::core::style::{Attr, Color, Style};
    use std::io::Write;

    #[test]
    fn lookup_keys_go_from_general_to_specific() {
        assert_eq!(
            lookup_keys("menu/text:choice/active"),
            vec![
                "menu",
                "menu/text",
                ":choice",
                "menu:choice",
                "menu/text:choice",
                ":choice/active",
                "menu:choice/active",
                "menu/text:choice/active",
            ]
        );
        assert_eq!(lookup_keys("a.b"), vec!["a", "a/b"]);
    }

    #[test]
    fn prefixes_are_inherited() {
        let mut theme = Theme::empty();
        theme.set("msg", Style::new().fg(Color::Ansi(1)));
        theme.set("msg/text:heading", Style::new().bold());

        let style = theme.resolve("msg/text:heading");
        assert_eq!(style.fg, Some(Color::Ansi(1)));
        assert!(style.has(Attr::Bold));
    }

    #[test]
    fn literal_is_merged_over_root_default() {
        let mut theme = Theme::empty().with_default_style(Style::new().bg(Color::Ansi(0)));
        theme.set("x", Style::new().fg(Color::Ansi(2)));
        let style = theme.resolve("x");
        assert_eq!(style.bg, Some(Color::Ansi(0)));
        assert_eq!(style.fg, Some(Color::Ansi(2)));
    }

    #[test]
    fn aliases_follow_targets() {
        let mut theme = Theme::empty();
        theme.set("accent", Style::new().fg(Color::Ansi(4)));
        theme.set("link", ThemeEntry::alias("accent"));
        assert_eq!(theme.resolve("link").fg, Some(Color::Ansi(4)));
    }

    #[test]
    fn two_node_cycle_yields_default_and_one_warning() {
        let mut theme = Theme::empty();
        theme.set("a", ThemeEntry::alias("b"));
        theme.set("b", ThemeEntry::alias("a"));

        let resolution = theme.resolve_traced("a");
        assert_eq!(resolution.style, Style::new());
        assert_eq!(resolution.warnings, vec![ThemeWarning::Cycle { path: "a".into() }]);
    }

    #[test]
    fn self_alias_terminates() {
        let mut theme = Theme::empty();
        theme.set("loop", ThemeEntry::alias("loop"));
        let resolution = theme.resolve_traced("loop");
        assert_eq!(resolution.style, Style::new());
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[test]
    fn missing_alias_target_warns() {
        let mut theme = Theme::empty();
        theme.set("a", ThemeEntry::alias("nowhere"));
        let resolution = theme.resolve_traced("a");
        assert_eq!(
            resolution.warnings,
            vec![ThemeWarning::MissingAlias {
                from: "a".into(),
                target: "nowhere".into()
            }]
        );
    }

    #[test]
    fn diamond_aliases_resolve_each_path_once() {
        let mut theme = Theme::empty();
        theme.set("top", ThemeEntry::List(vec![ThemeEntry::alias("l"), ThemeEntry::alias("r")]));
        theme.set("l", ThemeEntry::alias("base"));
        theme.set("r", ThemeEntry::alias("base"));
        theme.set("base", Style::new().italic());
        let resolution = theme.resolve_traced("top");
        assert!(resolution.style.has(Attr::Italic));
        assert!(resolution.warnings.is_empty());
        assert_eq!(resolution.paths_resolved, 4);
    }

    #[test]
    fn parses_entry_specs() {
        assert_eq!(
            ThemeEntry::parse("bold red on_black").expect("spec"),
            ThemeEntry::Style(Style::new().bold().fg(Color::Ansi(1)).bg(Color::Ansi(0)))
        );
        assert_eq!(
            ThemeEntry::parse("@accent italic").expect("spec"),
            ThemeEntry::List(vec![
                ThemeEntry::alias("accent"),
                ThemeEntry::Style(Style::new().italic())
            ])
        );
        assert!(ThemeEntry::parse("sparkly").is_err());
    }

    #[test]
    fn default_theme_resolves_without_warnings() {
        let theme = Theme::for_capabilities(&TerminalCapabilities::plain());
        for path in [
            "menu/text:choice/active",
            "task/progressbar/done",
            "msg/decoration:heading",
            "input/placeholder",
        ] {
            let resolution = theme.resolve_traced(path);
            assert!(resolution.warnings.is_empty(), "{path}");
        }
        let active = theme.resolve("menu/text:choice/active");
        assert_eq!(active.fg, Some(Color::Ansi(4)));
        assert!(active.has(Attr::Bold));
        assert_eq!(theme.decoration("checkbox/on"), "[x] ");
    }

    #[test]
    fn loads_overrides_from_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r##"{{
                "colors": {{ "accent": "#ff0000", "task/spinner": ["@accent", "bold"] }},
                "spinner": {{ "pattern": "ab", "interval_ms": 50 }},
                "progress_bar": {{ "width": 8 }},
                "decorations": {{ "heading": "* " }}
            }}"##
        )
        .expect("write theme");

        let mut theme = Theme::for_capabilities(&TerminalCapabilities::plain());
        theme.load_overrides(file.path()).expect("load theme");

        let spinner = theme.resolve("task/spinner");
        assert_eq!(spinner.fg, Some(Color::Rgb(255, 0, 0)));
        assert!(spinner.has(Attr::Bold));
        assert_eq!(theme.spinner.frames, vec!["a", "b"]);
        assert_eq!(theme.spinner.interval.as_millis(), 50);
        assert_eq!(theme.progress_bar.width, 8);
        assert_eq!(theme.decoration("heading"), "* ");
    }

    #[test]
    fn slot_swaps_whole_theme() {
        let slot = ThemeSlot::new(Theme::empty());
        let before = slot.current();
        let mut next = Theme::empty();
        next.set("x", Style::new().bold());
        let previous = slot.swap(next);
        assert_eq!(*previous, *before);
        assert!(slot.current().resolve("x").has(Attr::Bold));
    }
}

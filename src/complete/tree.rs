//! Command tree and completer descriptors.
//!
//! A [`CommandTree`] is what an application hands to the encoder: options,
//! positionals and nested subcommands, each with help text, an [`Arity`] and a
//! [`Completer`].

use std::fmt;

use crate::error::CompletionError;

/// How many values an option or positional consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exactly(usize),
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `-`: takes nothing and ends parsing (help, version).
    Terminal,
}

impl Arity {
    pub fn parse(raw: &str) -> Result<Self, CompletionError> {
        match raw {
            "?" => Ok(Self::Optional),
            "*" => Ok(Self::ZeroOrMore),
            "+" => Ok(Self::OneOrMore),
            "-" => Ok(Self::Terminal),
            _ => raw
                .parse::<usize>()
                .map(Self::Exactly)
                .map_err(|_| CompletionError::InvalidArity(raw.to_string())),
        }
    }

    /// Remaining arity after one more value was consumed.
    ///
    /// `+` degrades to `*` once it has its first value.
    pub fn after_value(self) -> Self {
        match self {
            Self::Exactly(n) => Self::Exactly(n.saturating_sub(1)),
            Self::Optional | Self::Terminal => Self::Exactly(0),
            Self::ZeroOrMore | Self::OneOrMore => Self::ZeroOrMore,
        }
    }

    pub fn is_exhausted(self) -> bool {
        matches!(self, Self::Exactly(0) | Self::Terminal)
    }

    /// Whether a following flag may close the slot early.
    pub fn is_satisfied(self) -> bool {
        matches!(
            self,
            Self::Exactly(0) | Self::Optional | Self::ZeroOrMore | Self::Terminal
        )
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::Optional => f.write_str("?"),
            Self::ZeroOrMore => f.write_str("*"),
            Self::OneOrMore => f.write_str("+"),
            Self::Terminal => f.write_str("-"),
        }
    }
}

/// Which git refs a [`Completer::GitRef`] offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GitModes {
    pub branches: bool,
    pub remotes: bool,
    pub tags: bool,
    pub heads: bool,
}

impl Default for GitModes {
    fn default() -> Self {
        Self {
            branches: true,
            remotes: false,
            tags: true,
            heads: true,
        }
    }
}

impl GitModes {
    pub const fn none() -> Self {
        Self {
            branches: false,
            remotes: false,
            tags: false,
            heads: false,
        }
    }

    /// Parses a mode mask such as `bth`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut modes = Self::none();
        for ch in raw.chars() {
            match ch {
                'b' => modes.branches = true,
                'r' => modes.remotes = true,
                't' => modes.tags = true,
                'h' => modes.heads = true,
                _ => return None,
            }
        }
        Some(modes)
    }
}

impl fmt::Display for GitModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, ch) in [
            (self.branches, 'b'),
            (self.remotes, 'r'),
            (self.tags, 't'),
            (self.heads, 'h'),
        ] {
            if on {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// How to produce candidates for one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completer {
    Empty,
    Choices(Vec<String>),
    ChoicesWithDescription(Vec<(String, String)>),
    /// Extensions without the leading dot; empty accepts every file.
    FilePath(Vec<String>),
    DirectoryPath,
    GitRef(GitModes),
    /// `many`: elements arrive as separate words instead of one delimited word.
    DelimitedList {
        inner: Box<Completer>,
        delimiter: String,
        many: bool,
    },
    DelimitedTuple {
        inners: Vec<Completer>,
        delimiter: String,
        many: bool,
    },
    /// `(branch description, completer)` pairs.
    Alternatives(Vec<(String, Completer)>),
    /// Token passed back to the application's registered callback.
    CustomCallback(String),
}

impl Completer {
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choices(choices.into_iter().map(Into::into).collect())
    }

    pub fn described<I, S, D>(choices: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        Self::ChoicesWithDescription(
            choices
                .into_iter()
                .map(|(value, description)| (value.into(), description.into()))
                .collect(),
        )
    }

    pub fn files<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FilePath(
            extensions
                .into_iter()
                .map(|ext| ext.into().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
        )
    }

    pub fn list(inner: Completer, delimiter: impl Into<String>) -> Self {
        Self::DelimitedList {
            inner: Box::new(inner),
            delimiter: delimiter.into(),
            many: false,
        }
    }

    /// List whose elements are separate command-line words.
    pub fn list_many(inner: Completer) -> Self {
        Self::DelimitedList {
            inner: Box::new(inner),
            delimiter: " ".to_string(),
            many: true,
        }
    }

    pub fn tuple(inners: Vec<Completer>, delimiter: impl Into<String>) -> Self {
        Self::DelimitedTuple {
            inners,
            delimiter: delimiter.into(),
            many: false,
        }
    }

    /// Tuple whose elements are separate command-line words.
    pub fn tuple_many(inners: Vec<Completer>) -> Self {
        Self::DelimitedTuple {
            inners,
            delimiter: " ".to_string(),
            many: true,
        }
    }

    pub fn alternatives<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = (S, Completer)>,
        S: Into<String>,
    {
        Self::Alternatives(
            branches
                .into_iter()
                .map(|(description, completer)| (description.into(), completer))
                .collect(),
        )
    }

    pub fn custom(token: impl Into<String>) -> Self {
        Self::CustomCallback(token.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub flags: Vec<String>,
    pub help: String,
    pub metavar: Vec<String>,
    pub arity: Arity,
    pub completer: Completer,
    /// Also offered in every subcommand that does not shadow its flags.
    pub inherited: bool,
}

impl OptionSpec {
    /// Flag taking no value.
    pub fn switch<I, S>(flags: I, help: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            help: help.into(),
            metavar: Vec::new(),
            arity: Arity::Exactly(0),
            completer: Completer::Empty,
            inherited: false,
        }
    }

    /// Flag taking one value.
    pub fn value<I, S>(flags: I, metavar: impl Into<String>, completer: Completer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            help: String::new(),
            metavar: vec![metavar.into()],
            arity: Arity::Exactly(1),
            completer,
            inherited: false,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn metavar<I, S>(mut self, metavar: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metavar = metavar.into_iter().map(Into::into).collect();
        self
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSpec {
    pub help: String,
    pub metavar: String,
    pub arity: Arity,
    pub completer: Completer,
}

impl PositionalSpec {
    pub fn new(metavar: impl Into<String>, completer: Completer) -> Self {
        Self {
            help: String::new(),
            metavar: metavar.into(),
            arity: Arity::Exactly(1),
            completer,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcommand {
    pub name: String,
    pub aliases: Vec<String>,
    pub tree: CommandTree,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTree {
    pub name: String,
    pub help: String,
    pub options: Vec<OptionSpec>,
    pub positionals: Vec<PositionalSpec>,
    pub subcommands: Vec<Subcommand>,
}

impl CommandTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn positional(mut self, positional: PositionalSpec) -> Self {
        self.positionals.push(positional);
        self
    }

    pub fn subcommand(mut self, tree: CommandTree) -> Self {
        self.subcommands.push(Subcommand {
            name: tree.name.clone(),
            aliases: Vec::new(),
            tree,
        });
        self
    }

    pub fn subcommand_with_aliases<I, S>(mut self, tree: CommandTree, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcommands.push(Subcommand {
            name: tree.name.clone(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            tree,
        });
        self
    }

    pub fn find_subcommand(&self, name: &str) -> Option<&CommandTree> {
        self.subcommands
            .iter()
            .find(|sub| sub.name == name || sub.aliases.iter().any(|alias| alias == name))
            .map(|sub| &sub.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::{Arity, Completer, GitModes};

    #[test]
    fn arity_parses_and_prints() {
        for raw in ["0", "3", "?", "*", "+", "-"] {
            assert_eq!(Arity::parse(raw).unwrap().to_string(), raw);
        }
        assert!(Arity::parse("x").is_err());
        assert!(Arity::parse("-1").is_err());
    }

    #[test]
    fn plus_degrades_to_star_after_first_value() {
        assert_eq!(Arity::OneOrMore.after_value(), Arity::ZeroOrMore);
        assert_eq!(Arity::ZeroOrMore.after_value(), Arity::ZeroOrMore);
        assert_eq!(Arity::Exactly(2).after_value(), Arity::Exactly(1));
        assert!(Arity::Optional.after_value().is_exhausted());
        assert!(!Arity::OneOrMore.is_satisfied());
    }

    #[test]
    fn git_modes_mask() {
        assert_eq!(GitModes::default().to_string(), "bth");
        assert_eq!(GitModes::parse("rt").unwrap().to_string(), "rt");
        assert!(GitModes::parse("bx").is_none());
    }

    #[test]
    fn file_extensions_drop_leading_dots() {
        assert_eq!(
            Completer::files([".rs", "toml", ""]),
            Completer::FilePath(vec!["rs".to_string(), "toml".to_string()])
        );
    }
}

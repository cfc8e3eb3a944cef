//! Glue for applications built on clap: shared terminal flags, custom
//! completer callbacks and the conversion from a `clap::Command` into a
//! completion [`CommandTree`].

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use clap::builder::ValueRange;
use clap::{ArgAction, Args, ValueEnum, ValueHint};

use crate::complete::{
    completion_data_dir, format_candidates, install_completion_data_in,
    uninstall_completion_data_in, Arity, Candidate, CommandTree, Completer, OptionSpec,
    PositionalSpec,
};
use crate::core::capabilities::{ColorOverride, ColorTier};
use crate::error::CompletionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Never,
    /// 16 colors
    Ansi,
    /// 256 colors
    Ansi256,
    Truecolor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionShell {
    All,
    Bash,
    Zsh,
    Fish,
    Pwsh,
    /// Remove the installed completion data
    Uninstall,
}

/// Flags every hosted application shares; flatten into the app's parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct TerminalArgs {
    /// When to use colors
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    /// Disable colors (same as --color never)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Install shell completion data and exit
    #[arg(
        long,
        value_enum,
        value_name = "SHELL",
        num_args = 0..=1,
        default_missing_value = "all"
    )]
    pub completions: Option<CompletionShell>,

    #[arg(
        long = "_tape-complete",
        hide = true,
        num_args = 2,
        value_names = ["TOKEN", "WORD"],
        allow_hyphen_values = true
    )]
    pub tape_complete: Option<Vec<String>>,
}

impl TerminalArgs {
    pub fn color_override(&self) -> ColorOverride {
        if self.no_color {
            return ColorOverride::Never;
        }
        match self.color {
            ColorChoice::Auto => ColorOverride::Auto,
            ColorChoice::Never => ColorOverride::Never,
            ColorChoice::Ansi => ColorOverride::Tier(ColorTier::Ansi16),
            ColorChoice::Ansi256 => ColorOverride::Tier(ColorTier::Ansi256),
            ColorChoice::Truecolor => ColorOverride::Tier(ColorTier::TrueColor),
        }
    }
}

type CustomFn = Box<dyn Fn(&str) -> Vec<(String, String)> + Send + Sync>;

/// Callbacks behind `cc` completers, keyed by token.
#[derive(Default)]
pub struct CustomRegistry {
    callbacks: HashMap<String, CustomFn>,
}

impl fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<&String> = self.callbacks.keys().collect();
        tokens.sort();
        f.debug_struct("CustomRegistry").field("tokens", &tokens).finish()
    }
}

impl CustomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback`, which receives the word being completed and
    /// returns `(value, description)` pairs.
    pub fn register<F>(mut self, token: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str) -> Vec<(String, String)> + Send + Sync + 'static,
    {
        self.callbacks.insert(token.into(), Box::new(callback));
        self
    }

    pub fn contains(&self, token: &str) -> bool {
        self.callbacks.contains_key(token)
    }

    pub fn run(&self, token: &str, word: &str) -> Result<Vec<Candidate>, CompletionError> {
        let callback = self
            .callbacks
            .get(token)
            .ok_or_else(|| CompletionError::Custom {
                token: token.to_string(),
                reason: "no callback registered".to_string(),
            })?;
        Ok(callback(word)
            .into_iter()
            .map(|(value, description)| Candidate::new(value, description))
            .collect())
    }
}

/// What the caller should do after [`handle_builtin_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// No built-in flag was given; run the application.
    NotHandled,
    /// A built-in flag ran; exit with this status.
    Exit(i32),
}

/// Answers `--_tape-complete` and `--completions` for `command`.
///
/// Completion data goes under [`completion_data_dir`].
pub fn handle_builtin_flags(
    args: &TerminalArgs,
    command: &clap::Command,
    registry: &CustomRegistry,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<Builtin> {
    if args.tape_complete.is_none() && args.completions.is_none() {
        return Ok(Builtin::NotHandled);
    }
    match completion_data_dir() {
        Some(dir) => handle_builtin_flags_in(&dir, args, command, registry, out, err),
        None => {
            writeln!(err, "error: no user data directory for completion data")?;
            Ok(Builtin::Exit(1))
        }
    }
}

/// [`handle_builtin_flags`] with an explicit data directory.
pub fn handle_builtin_flags_in(
    data_dir: &Path,
    args: &TerminalArgs,
    command: &clap::Command,
    registry: &CustomRegistry,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<Builtin> {
    if let Some(request) = args.tape_complete.as_deref() {
        let [token, word] = request else {
            writeln!(err, "error: --_tape-complete takes a token and a word")?;
            return Ok(Builtin::Exit(2));
        };
        return match registry.run(token, word) {
            Ok(candidates) => {
                out.write_all(format_candidates(&candidates).as_bytes())?;
                Ok(Builtin::Exit(0))
            }
            Err(error) => {
                writeln!(err, "error: {error}")?;
                Ok(Builtin::Exit(1))
            }
        };
    }

    let Some(shell) = args.completions else {
        return Ok(Builtin::NotHandled);
    };
    let prog = command.get_name();
    if shell == CompletionShell::Uninstall {
        let removed = uninstall_completion_data_in(data_dir, prog)?;
        if removed {
            writeln!(out, "removed completion data for {prog}")?;
        } else {
            writeln!(out, "no completion data installed for {prog}")?;
        }
        return Ok(Builtin::Exit(0));
    }

    // Every front end reads the same table, so the shell only matters for logs.
    tracing::debug!(?shell, prog, "installing completion data");
    let path = install_completion_data_in(data_dir, prog, &command_tree(command))?;
    writeln!(out, "wrote {}", path.display())?;
    Ok(Builtin::Exit(0))
}

/// Completion tree for a clap command, subcommands included.
///
/// Hidden arguments and subcommands are left out. `--help` is skipped since
/// every table carries an implicit help row; `--version` keeps parsing from
/// going further.
pub fn command_tree(command: &clap::Command) -> CommandTree {
    let mut command = command.clone();
    command.build();
    tree_from(&command)
}

fn tree_from(command: &clap::Command) -> CommandTree {
    let mut tree = CommandTree::new(command.get_name())
        .help(command.get_about().map(ToString::to_string).unwrap_or_default());

    for arg in command.get_arguments() {
        if arg.is_hide_set() || arg.is_positional() {
            continue;
        }
        let action = arg.get_action();
        if matches!(action, ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong) {
            continue;
        }

        let mut flags: Vec<String> = Vec::new();
        if let Some(short) = arg.get_short() {
            flags.push(format!("-{short}"));
        }
        for short in arg.get_visible_short_aliases().unwrap_or_default() {
            flags.push(format!("-{short}"));
        }
        if let Some(long) = arg.get_long() {
            flags.push(format!("--{long}"));
        }
        for long in arg.get_visible_aliases().unwrap_or_default() {
            flags.push(format!("--{long}"));
        }
        if flags.is_empty() {
            continue;
        }

        let arity = match action {
            ArgAction::Version => Arity::Terminal,
            ArgAction::SetTrue | ArgAction::SetFalse | ArgAction::Count => Arity::Exactly(0),
            _ => arg.get_num_args().map_or(Arity::Exactly(1), arity_from_range),
        };
        let completer = if arity.is_exhausted() {
            Completer::Empty
        } else {
            completer_for(arg)
        };
        let mut option = OptionSpec {
            flags,
            help: arg.get_help().map(ToString::to_string).unwrap_or_default(),
            metavar: Vec::new(),
            arity,
            completer,
            inherited: arg.is_global_set(),
        };
        if !arity.is_exhausted() {
            option.metavar = metavar(arg);
        }
        tree = tree.option(option);
    }

    for arg in command.get_positionals() {
        if arg.is_hide_set() {
            continue;
        }
        let arity = arg.get_num_args().map_or(Arity::Exactly(1), arity_from_range);
        let positional = PositionalSpec::new(metavar(arg).join(" "), completer_for(arg))
            .help(arg.get_help().map(ToString::to_string).unwrap_or_default())
            .arity(if arg.is_required_set() { arity } else { optional(arity) });
        tree = tree.positional(positional);
    }

    for sub in command.get_subcommands() {
        if sub.is_hide_set() || sub.get_name() == "help" {
            continue;
        }
        tree = tree.subcommand_with_aliases(tree_from(sub), sub.get_visible_aliases());
    }
    tree
}

fn arity_from_range(range: ValueRange) -> Arity {
    let (min, max) = (range.min_values(), range.max_values());
    match (min, max) {
        (0, 0) => Arity::Exactly(0),
        (0, 1) => Arity::Optional,
        (0, _) => Arity::ZeroOrMore,
        (min, max) if min == max => Arity::Exactly(min),
        _ => Arity::OneOrMore,
    }
}

/// A positional that is not required may be left out entirely.
fn optional(arity: Arity) -> Arity {
    match arity {
        Arity::Exactly(1) => Arity::Optional,
        Arity::OneOrMore => Arity::ZeroOrMore,
        other => other,
    }
}

fn metavar(arg: &clap::Arg) -> Vec<String> {
    match arg.get_value_names() {
        Some(names) if !names.is_empty() => names.iter().map(ToString::to_string).collect(),
        _ => vec![arg.get_id().as_str().to_uppercase()],
    }
}

fn completer_for(arg: &clap::Arg) -> Completer {
    let values: Vec<_> = arg
        .get_possible_values()
        .into_iter()
        .filter(|value| !value.is_hide_set())
        .collect();
    if !values.is_empty() {
        if values.iter().any(|value| value.get_help().is_some()) {
            return Completer::described(values.iter().map(|value| {
                (
                    value.get_name().to_string(),
                    value.get_help().map(ToString::to_string).unwrap_or_default(),
                )
            }));
        }
        return Completer::choices(values.iter().map(|value| value.get_name().to_string()));
    }
    match arg.get_value_hint() {
        ValueHint::FilePath | ValueHint::AnyPath | ValueHint::ExecutablePath => {
            Completer::files(Vec::<String>::new())
        }
        ValueHint::DirPath => Completer::DirectoryPath,
        _ => Completer::Empty,
    }
}

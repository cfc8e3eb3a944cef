//! Replays the words before the cursor to find what the cursor word is.

use crate::complete::table::CompletionTable;
use crate::complete::tree::Arity;

/// Option whose values are still being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOption {
    pub path: String,
    pub flag: String,
    pub remaining: Arity,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionState {
    /// Subcommand path, `""` for the root.
    pub path: String,
    /// Set by `--`; flags are no longer recognized.
    pub free_args_only: bool,
    pub open: Option<OpenOption>,
    /// Index of the current positional slot.
    pub positional: usize,
    /// Remaining arity of the current slot; `None` until it takes a value.
    pub positional_remaining: Option<Arity>,
    pub positional_values: Vec<String>,
    /// A `-` arity flag ended parsing.
    pub terminated: bool,
}

pub fn looks_like_flag(word: &str) -> bool {
    word.starts_with('-') && word != "-"
}

/// Splits `--flag=value`; short flags and bare words are left alone.
pub fn split_inline_value(word: &str) -> (&str, Option<&str>) {
    if word.starts_with("--") {
        if let Some((flag, value)) = word.split_once('=') {
            return (flag, Some(value));
        }
    }
    (word, None)
}

impl CompletionState {
    /// State after `words`, which exclude the program name and the cursor word.
    pub fn replay<S: AsRef<str>>(table: &CompletionTable, words: &[S]) -> Self {
        let mut state = Self::default();
        for word in words {
            if state.terminated {
                break;
            }
            state.consume(table, word.as_ref());
        }
        state
    }

    fn consume(&mut self, table: &CompletionTable, word: &str) {
        if let Some(open) = self.open.as_mut() {
            let closes_early =
                !self.free_args_only && open.remaining.is_satisfied() && looks_like_flag(word);
            if !closes_early {
                open.values.push(word.to_string());
                open.remaining = open.remaining.after_value();
                if open.remaining.is_exhausted() {
                    self.open = None;
                }
                return;
            }
            self.open = None;
        }

        if !self.free_args_only {
            if word == "--" {
                self.free_args_only = true;
                return;
            }
            if looks_like_flag(word) {
                self.consume_flag(table, word);
                return;
            }
        }
        self.consume_free_word(table, word);
    }

    fn consume_flag(&mut self, table: &CompletionTable, word: &str) {
        let (flag, inline) = split_inline_value(word);
        let Some(row) = table.option(&self.path, flag) else {
            tracing::debug!(flag, path = %self.path, "ignoring unknown flag");
            return;
        };
        if row.arity == Arity::Terminal {
            self.terminated = true;
            return;
        }
        if inline.is_some() || row.arity.is_exhausted() {
            return;
        }
        self.open = Some(OpenOption {
            path: self.path.clone(),
            flag: flag.to_string(),
            remaining: row.arity,
            values: Vec::new(),
        });
    }

    fn consume_free_word(&mut self, table: &CompletionTable, word: &str) {
        let sub_path = format!("{}/{}", self.path, word);
        let names_subcommand = !self.free_args_only
            && table.subcommands(&self.path).is_some()
            && table.has_path(&sub_path);

        match self.current_positional(table) {
            Some(arity) if !(names_subcommand && arity.is_satisfied()) => {
                self.positional_values.push(word.to_string());
                self.positional_remaining = Some(arity.after_value());
            }
            _ if names_subcommand => {
                self.path = sub_path;
                self.positional = 0;
                self.positional_remaining = None;
                self.positional_values.clear();
            }
            _ => tracing::debug!(word, path = %self.path, "extra argument"),
        }
    }

    /// Remaining arity of the first positional slot that still takes values,
    /// advancing past exhausted slots.
    pub fn current_positional(&mut self, table: &CompletionTable) -> Option<Arity> {
        loop {
            let row = table.positional(&self.path, self.positional)?;
            let remaining = *self.positional_remaining.get_or_insert(row.arity);
            if !remaining.is_exhausted() {
                return Some(remaining);
            }
            self.positional += 1;
            self.positional_remaining = None;
            self.positional_values.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{split_inline_value, CompletionState};
    use crate::complete::encode::encode_tree;
    use crate::complete::table::CompletionTable;
    use crate::complete::tree::{Arity, CommandTree, Completer, OptionSpec, PositionalSpec};

    fn table() -> CompletionTable {
        let tree = CommandTree::new("app")
            .option(OptionSpec::value(["-o", "--out"], "FILE", Completer::Empty))
            .option(
                OptionSpec::value(["--tag"], "TAG", Completer::Empty).arity(Arity::ZeroOrMore),
            )
            .option(OptionSpec::switch(["-V", "--version"], "").arity(Arity::Terminal))
            .subcommand(
                CommandTree::new("run")
                    .positional(PositionalSpec::new("SRC", Completer::Empty))
                    .positional(
                        PositionalSpec::new("ARGS", Completer::Empty).arity(Arity::ZeroOrMore),
                    ),
            );
        CompletionTable::parse(&encode_tree(&tree)).unwrap()
    }

    #[test]
    fn option_consumes_its_values() {
        let state = CompletionState::replay(&table(), &["-o"]);
        let open = state.open.unwrap();
        assert_eq!(open.flag, "-o");
        assert_eq!(open.remaining, Arity::Exactly(1));

        let state = CompletionState::replay(&table(), &["-o", "-x"]);
        assert!(state.open.is_none());
        assert_eq!(state.path, "");
    }

    #[test]
    fn star_option_closes_on_next_flag() {
        let state = CompletionState::replay(&table(), &["--tag", "a", "b"]);
        assert_eq!(state.open.as_ref().unwrap().values, vec!["a", "b"]);
        let state = CompletionState::replay(&table(), &["--tag", "a", "-o"]);
        assert_eq!(state.open.unwrap().flag, "-o");
    }

    #[test]
    fn inline_value_closes_option() {
        assert_eq!(split_inline_value("--out=x=y"), ("--out", Some("x=y")));
        assert_eq!(split_inline_value("-o=x"), ("-o=x", None));
        let state = CompletionState::replay(&table(), &["--out=file"]);
        assert!(state.open.is_none());
    }

    #[test]
    fn subcommand_then_positionals() {
        let table = table();
        let mut state = CompletionState::replay(&table, &["run", "main.rs", "a"]);
        assert_eq!(state.path, "/run");
        assert_eq!(state.current_positional(&table), Some(Arity::ZeroOrMore));
        assert_eq!(state.positional, 1);
        assert_eq!(state.positional_values, vec!["a"]);
    }

    #[test]
    fn double_dash_and_terminal_flags() {
        let state = CompletionState::replay(&table(), &["--", "-o"]);
        assert!(state.free_args_only);
        assert!(state.open.is_none());

        let state = CompletionState::replay(&table(), &["--version", "run"]);
        assert!(state.terminated);
        assert_eq!(state.path, "");
    }
}

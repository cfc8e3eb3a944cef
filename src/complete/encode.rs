//! Command tree to completion table encoder.
//!
//! One row per `(path, selector)`:
//!
//! ```text
//! path \t flags \t description \t metavar \t arity \t opcode \t size \t operands...
//! ```
//!
//! `path` is `""` for the root and `/sub/subsub` below it. `flags` are the
//! option flags separated by spaces, a positional index (`0`, `1`, ...), or
//! `c` for the subcommand row. Every completer encodes as
//! `opcode size operand...` where `size` counts the tokens that follow, so a
//! reader can skip a completer it does not understand.

use crate::complete::tree::{Arity, CommandTree, Completer, OptionSpec};

/// Selector of the row that lists subcommands.
pub const SUBCOMMAND_SELECTOR: &str = "c";

const HELP_FLAGS: [&str; 2] = ["-h", "--help"];
const HELP_DESCRIPTION: &str = "show help and exit";

/// Opcode stream for one completer.
pub fn encode_completer(completer: &Completer) -> Vec<String> {
    let (opcode, operands) = match completer {
        Completer::Empty => ("-", Vec::new()),
        Completer::Choices(choices) => ("c", choices.iter().map(|c| sanitize(c)).collect()),
        Completer::ChoicesWithDescription(choices) => {
            let mut operands: Vec<String> = choices.iter().map(|(v, _)| sanitize(v)).collect();
            operands.extend(choices.iter().map(|(_, d)| sanitize(d)));
            ("cd", operands)
        }
        Completer::FilePath(extensions) => ("f", vec![sanitize(&extensions.join("|"))]),
        Completer::DirectoryPath => ("d", Vec::new()),
        Completer::GitRef(modes) => ("g", vec![modes.to_string()]),
        Completer::DelimitedList {
            inner,
            delimiter,
            many,
        } => {
            let mut operands = vec![sanitize(delimiter)];
            operands.extend(encode_completer(inner));
            (if *many { "lm" } else { "l" }, operands)
        }
        Completer::DelimitedTuple {
            inners,
            delimiter,
            many,
        } => {
            let mut operands = vec![sanitize(delimiter), inners.len().to_string()];
            for inner in inners {
                operands.extend(encode_completer(inner));
            }
            (if *many { "tm" } else { "t" }, operands)
        }
        Completer::Alternatives(branches) => {
            let mut operands = vec![branches.len().to_string()];
            for (description, inner) in branches {
                operands.push(sanitize(description));
                operands.extend(encode_completer(inner));
            }
            ("a", operands)
        }
        Completer::CustomCallback(token) => ("cc", vec![sanitize(token)]),
    };

    let mut tokens = Vec::with_capacity(operands.len() + 2);
    tokens.push(opcode.to_string());
    tokens.push(operands.len().to_string());
    tokens.extend(operands);
    tokens
}

/// Encodes the whole tree, one row per line.
pub fn encode_tree(tree: &CommandTree) -> String {
    let mut rows = Vec::new();
    dump(tree, "", &[], &mut rows);
    rows.join("\n")
}

fn dump(tree: &CommandTree, path: &str, parent_inherited: &[OptionSpec], rows: &mut Vec<String>) {
    rows.push(row(
        path,
        &HELP_FLAGS.join(" "),
        HELP_DESCRIPTION,
        &[],
        Arity::Terminal,
        &Completer::Empty,
    ));

    let mut seen_flags: Vec<&str> = HELP_FLAGS.to_vec();
    let mut inherited: Vec<OptionSpec> = Vec::new();
    for option in &tree.options {
        rows.push(option_row(path, option, &option.flags));
        seen_flags.extend(option.flags.iter().map(String::as_str));
        if option.inherited {
            inherited.push(option.clone());
        }
    }

    for option in parent_inherited {
        let flags: Vec<String> = option
            .flags
            .iter()
            .filter(|flag| !seen_flags.contains(&flag.as_str()))
            .cloned()
            .collect();
        if flags.is_empty() {
            continue;
        }
        rows.push(option_row(path, option, &flags));
        let mut narrowed = option.clone();
        narrowed.flags = flags;
        inherited.push(narrowed);
    }

    for (index, positional) in tree.positionals.iter().enumerate() {
        rows.push(row(
            path,
            &index.to_string(),
            &positional.help,
            std::slice::from_ref(&positional.metavar),
            positional.arity,
            &positional.completer,
        ));
    }

    if !tree.subcommands.is_empty() {
        let names = Completer::described(
            tree.subcommands
                .iter()
                .map(|sub| (sub.name.as_str(), sub.tree.help.as_str())),
        );
        rows.push(row(
            path,
            SUBCOMMAND_SELECTOR,
            "subcommand",
            &["<cmd>".to_string()],
            Arity::Exactly(1),
            &names,
        ));
    }

    for sub in &tree.subcommands {
        for name in std::iter::once(&sub.name).chain(sub.aliases.iter()) {
            dump(&sub.tree, &format!("{path}/{name}"), &inherited, rows);
        }
    }
}

fn option_row(path: &str, option: &OptionSpec, flags: &[String]) -> String {
    row(
        path,
        &flags.join(" "),
        &option.help,
        &option.metavar,
        option.arity,
        &option.completer,
    )
}

fn row(
    path: &str,
    selector: &str,
    description: &str,
    metavar: &[String],
    arity: Arity,
    completer: &Completer,
) -> String {
    let metavar = metavar
        .iter()
        .map(|word| escape_metavar(word))
        .collect::<Vec<_>>()
        .join(" ");
    let mut fields = vec![
        sanitize(path),
        sanitize(selector),
        sanitize(description),
        sanitize(&metavar),
        arity.to_string(),
    ];
    fields.extend(encode_completer(completer));
    fields.join("\t")
}

/// Replaces characters that would break the row or line structure with spaces.
pub fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|ch| match ch {
            '\t' | '\r' | '\n' | '\x07' | '\x08' => ' ',
            other => other,
        })
        .collect()
}

/// Metavar words are space-joined, so spaces become `\S` and backslashes `\L`.
pub fn escape_metavar(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for ch in word.chars() {
        match ch {
            '\\' => escaped.push_str("\\L"),
            ' ' => escaped.push_str("\\S"),
            other => escaped.push(other),
        }
    }
    escaped
}

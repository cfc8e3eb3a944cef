//! Reference interpreter: words before the cursor plus the cursor word in,
//! candidates out.

use std::path::{Path, PathBuf};

use crate::complete::collector::{Candidate, Collector};
use crate::complete::host::CompletionHost;
use crate::complete::state::{looks_like_flag, split_inline_value, CompletionState};
use crate::complete::table::{CompletionTable, Row};
use crate::complete::tree::Completer;
use crate::error::CompletionError;

/// Candidates for `current` after `words` (program name excluded).
///
/// Only the rows that govern this request are decoded, so a malformed row
/// elsewhere in the table does not affect it.
pub fn complete<S: AsRef<str>>(
    table: &CompletionTable,
    words: &[S],
    current: &str,
    host: &dyn CompletionHost,
) -> Result<Vec<Candidate>, CompletionError> {
    let mut state = CompletionState::replay(table, words);
    if state.terminated {
        return Ok(Vec::new());
    }
    let mut collector = Collector::new(current);

    if let Some(open) = state.open.clone() {
        if let Some(row) = table.option(&open.path, &open.flag) {
            run(&row.completer()?, &mut collector, host, &open.values)?;
        }
        if !state.free_args_only && looks_like_flag(current) && open.remaining.is_satisfied() {
            add_flags(table, &state.path, &mut collector);
        }
        return Ok(collector.finish());
    }

    if !state.free_args_only && looks_like_flag(current) {
        if let (flag, Some(value)) = split_inline_value(current) {
            if let Some(row) = table.option(&state.path, flag) {
                if !row.arity.is_exhausted() {
                    let completer = row.completer()?;
                    collector.with_segment(&format!("{flag}="), value, |c| {
                        run(&completer, c, host, &[])
                    })?;
                }
            }
            return Ok(collector.finish());
        }
        add_flags(table, &state.path, &mut collector);
        return Ok(collector.finish());
    }

    let positional = state.current_positional(table);
    if positional.is_some() {
        if let Some(row) = table.positional(&state.path, state.positional) {
            run(&row.completer()?, &mut collector, host, &state.positional_values)?;
        }
    }
    let offers_subcommands = positional.map_or(true, |arity| arity.is_satisfied());
    if offers_subcommands && !state.free_args_only {
        if let Some(row) = table.subcommands(&state.path) {
            run(&row.completer()?, &mut collector, host, &[])?;
        }
    }
    Ok(collector.finish())
}

fn add_flags(table: &CompletionTable, path: &str, collector: &mut Collector) {
    for row in table.option_rows(path) {
        add_row_flags(row, collector);
    }
}

fn add_row_flags(row: &Row, collector: &mut Collector) {
    for flag in &row.flags {
        collector.add(flag, &row.description);
    }
}

/// Runs one completer against the collector's current prefix.
///
/// `consumed` holds the values the governing option or positional already
/// took; the word-separated list and tuple forms read it.
fn run(
    completer: &Completer,
    collector: &mut Collector,
    host: &dyn CompletionHost,
    consumed: &[String],
) -> Result<(), CompletionError> {
    match completer {
        Completer::Empty => {}
        Completer::Choices(choices) => {
            for choice in choices {
                collector.add(choice, "");
            }
        }
        Completer::ChoicesWithDescription(choices) => {
            for (value, description) in choices {
                collector.add(value, description);
            }
        }
        Completer::FilePath(extensions) => {
            complete_path(collector, host, Some(extensions.as_slice()))
        }
        Completer::DirectoryPath => complete_path(collector, host, None),
        Completer::GitRef(modes) => {
            for (name, kind) in host.git_refs(*modes) {
                collector.add_exact(&name, &kind);
            }
        }
        Completer::DelimitedList {
            inner, many: true, ..
        } => {
            collector.excluding(consumed, |c| run(inner, c, host, &[]))?;
        }
        Completer::DelimitedList {
            inner, delimiter, ..
        } => {
            let prefix = collector.prefix().to_string();
            match split_last(&prefix, delimiter) {
                Some((head, tail)) => {
                    let earlier: Vec<String> = head
                        .split(delimiter.as_str())
                        .filter(|element| !element.is_empty())
                        .map(str::to_string)
                        .collect();
                    collector.with_segment(head, tail, |c| {
                        c.excluding(&earlier, |c| run(inner, c, host, &[]))
                    })?;
                }
                None => run(inner, collector, host, &[])?,
            }
        }
        Completer::DelimitedTuple {
            inners, many: true, ..
        } => {
            if let Some(inner) = inners.get(consumed.len()) {
                run(inner, collector, host, &[])?;
            }
        }
        Completer::DelimitedTuple {
            inners, delimiter, ..
        } => {
            let prefix = collector.prefix().to_string();
            let (position, split) = if delimiter.is_empty() {
                (1, None)
            } else {
                (prefix.split(delimiter.as_str()).count(), split_last(&prefix, delimiter))
            };
            if let Some(inner) = inners.get(position - 1) {
                match split {
                    Some((head, tail)) => {
                        collector.with_segment(head, tail, |c| run(inner, c, host, &[]))?
                    }
                    None => run(inner, collector, host, &[])?,
                }
            }
        }
        Completer::Alternatives(branches) => {
            for (description, inner) in branches {
                collector.with_description(description, |c| run(inner, c, host, consumed))?;
            }
        }
        Completer::CustomCallback(token) => {
            let prefix = collector.prefix().to_string();
            for (value, description) in host.custom(token, &prefix)? {
                collector.add_exact(&value, &description);
            }
        }
    }
    Ok(())
}

/// `("x,y,", "z")` for `"x,y,z"` split on `,`; the head keeps its delimiter.
fn split_last<'a>(word: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    if delimiter.is_empty() {
        return None;
    }
    word.rfind(delimiter).map(|index| word.split_at(index + delimiter.len()))
}

/// Filesystem candidates. `extensions` is `None` for directories only and an
/// empty list for every file.
fn complete_path(
    collector: &mut Collector,
    host: &dyn CompletionHost,
    extensions: Option<&[String]>,
) {
    let prefix = collector.prefix().to_string();
    let (dir_part, name_part) = match prefix.rfind('/') {
        Some(index) => prefix.split_at(index + 1),
        None => ("", prefix.as_str()),
    };
    let listing_dir = match dir_part.strip_prefix("~/") {
        Some(rest) => match host.home_dir() {
            Some(home) => home.join(rest),
            None => return,
        },
        None if dir_part.is_empty() => PathBuf::new(),
        None => PathBuf::from(dir_part),
    };

    let entries = match host.list_dir(&listing_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(%err, dir = %listing_dir.display(), "cannot list directory");
            return;
        }
    };
    let show_hidden = name_part.starts_with('.');
    collector.with_segment(dir_part, name_part, |c| {
        for entry in entries {
            if entry.name.starts_with('.') && !show_hidden {
                continue;
            }
            if entry.is_dir {
                c.add_exact(&format!("{}/", entry.name), "");
                continue;
            }
            let wanted = match extensions {
                None => false,
                Some(extensions) => extensions.is_empty() || has_extension(&entry.name, extensions),
            };
            if wanted {
                c.add_exact(&entry.name, "");
            }
        }
    });
}

fn has_extension(name: &str, extensions: &[String]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

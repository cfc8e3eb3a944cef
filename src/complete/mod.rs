//! Portable shell completion.
//!
//! An application describes its command line once as a [`CommandTree`];
//! [`encode_tree`] flattens it into a tab-separated table that shell front
//! ends read without running the application. [`complete`] is the reference
//! interpreter every front end must agree with.
//!
//! ```
//! use tape_term::complete::{complete, encode_tree, CommandTree, Completer, CompletionTable,
//!     OptionSpec, SystemHost};
//!
//! let tree = CommandTree::new("demo")
//!     .option(OptionSpec::value(["--level"], "N", Completer::choices(["low", "high"])));
//! let table = CompletionTable::parse(&encode_tree(&tree)).unwrap();
//! let candidates = complete(&table, &["--level"], "h", &SystemHost::new()).unwrap();
//! assert_eq!(candidates[0].value, "high");
//! ```

pub mod collector;
pub mod encode;
pub mod host;
pub mod install;
pub mod interpret;
pub mod state;
pub mod table;
pub mod tree;

use std::io::Write;

pub use collector::{correction_threshold, osa_distance, Candidate};
pub use encode::{encode_completer, encode_tree};
pub use host::{parse_custom_output, CompletionHost, DirEntry, SystemHost, CUSTOM_COMPLETE_FLAG};
pub use install::{
    completion_data_dir, completion_data_path, install_completion_data,
    install_completion_data_in, uninstall_completion_data, uninstall_completion_data_in,
};
pub use interpret::complete;
pub use state::CompletionState;
pub use table::{CompletionTable, Row};
pub use tree::{Arity, CommandTree, Completer, GitModes, OptionSpec, PositionalSpec, Subcommand};

/// Parses `table_text` and completes `current`.
///
/// Any failure aborts just this request: the diagnostic goes to `errors` and
/// no candidates are returned.
pub fn complete_or_report<S: AsRef<str>>(
    table_text: &str,
    words: &[S],
    current: &str,
    host: &dyn CompletionHost,
    errors: &mut dyn Write,
) -> Vec<Candidate> {
    let result = CompletionTable::parse(table_text)
        .and_then(|table| complete(&table, words, current, host));
    match result {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::warn!(%err, "completion request aborted");
            let _ = writeln!(errors, "completion failed: {err}");
            Vec::new()
        }
    }
}

/// `value\tdescription` lines, the format front ends and `cc` callbacks share.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    let mut out = String::new();
    for candidate in candidates {
        out.push_str(&candidate.value);
        if !candidate.description.is_empty() {
            out.push('\t');
            out.push_str(&candidate.description);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{complete_or_report, format_candidates, Candidate, SystemHost};

    #[test]
    fn malformed_table_reports_and_yields_nothing() {
        let mut errors = Vec::new();
        let candidates =
            complete_or_report("\tonly\ttwo", &[] as &[&str], "", &SystemHost::new(), &mut errors);
        assert!(candidates.is_empty());
        assert_eq!(
            String::from_utf8(errors).unwrap(),
            "completion failed: line 1: expected at least 5 tab-separated fields, found 3\n"
        );
    }

    #[test]
    fn formats_value_and_description() {
        let out = format_candidates(&[Candidate::new("a", "first"), Candidate::new("b", "")]);
        assert_eq!(out, "a\tfirst\nb\n");
    }
}

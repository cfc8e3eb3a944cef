//! Reference completion interpreter.
//!
//! Reads an installed completion table and prints `value\tdescription` lines
//! for the words typed so far. Shell front ends are checked against it:
//!
//! ```text
//! tape-complete --program deploy -- --env p
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tape_term::complete::{
    complete, completion_data_path, format_candidates, CompletionTable, SystemHost,
};
use tape_term::config::EnvConfig;
use tape_term::logging::init_logging;

#[derive(Parser)]
#[command(name = "tape-complete")]
#[command(about = "Complete a command line from a tape_term completion table")]
#[command(version)]
struct Cli {
    /// Completion table; defaults to the installed table of --program
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    data: Option<PathBuf>,

    /// Program answering custom completers, and whose table to load
    #[arg(long, value_name = "PROG")]
    program: Option<String>,

    /// Words after the program name; the last one is being completed
    #[arg(last = true)]
    words: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&EnvConfig::from_env());

    let Some(path) = cli
        .data
        .clone()
        .or_else(|| cli.program.as_deref().and_then(completion_data_path))
    else {
        eprintln!("tape-complete: pass --data FILE or --program PROG");
        return ExitCode::from(2);
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("tape-complete: {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut host = SystemHost::new();
    if let Some(program) = cli.program.as_deref() {
        host = host.with_program(program);
    }
    let (current, words) = match cli.words.split_last() {
        Some((current, words)) => (current.as_str(), words),
        None => ("", &[][..]),
    };

    let result =
        CompletionTable::parse(&text).and_then(|table| complete(&table, words, current, &host));
    match result {
        Ok(candidates) => {
            let mut stdout = io::stdout().lock();
            if stdout
                .write_all(format_candidates(&candidates).as_bytes())
                .and_then(|()| stdout.flush())
                .is_err()
            {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("tape-complete: {}: {err}", path.display());
            ExitCode::FAILURE
        }
    }
}

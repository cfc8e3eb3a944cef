//! Completion table decoder.
//!
//! Rows are split and their arity checked when the table is parsed; a row's
//! opcode stream is only decoded when that row governs a request, so damage
//! in an unrelated row does not break completion elsewhere.

use crate::complete::encode::SUBCOMMAND_SELECTOR;
use crate::complete::tree::{Arity, Completer, GitModes};
use crate::error::CompletionError;

const MIN_FIELDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub path: String,
    pub flags: Vec<String>,
    pub description: String,
    pub metavar: Vec<String>,
    pub arity: Arity,
    program: Vec<String>,
}

impl Row {
    fn parse(line: usize, raw: &str) -> Result<Self, CompletionError> {
        let fields: Vec<&str> = raw.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(CompletionError::MissingFields {
                line,
                found: fields.len(),
            });
        }
        let metavar = fields[3]
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(unescape_metavar)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            line,
            path: fields[0].to_string(),
            flags: fields[1]
                .split(' ')
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect(),
            description: fields[2].to_string(),
            metavar,
            arity: Arity::parse(fields[4])?,
            program: fields[5..].iter().map(|token| token.to_string()).collect(),
        })
    }

    pub fn is_subcommand_row(&self) -> bool {
        self.flags.len() == 1 && self.flags[0] == SUBCOMMAND_SELECTOR
    }

    pub fn positional_index(&self) -> Option<usize> {
        match self.flags.as_slice() {
            [only] => only.parse().ok(),
            _ => None,
        }
    }

    pub fn is_option_row(&self) -> bool {
        self.flags.iter().any(|flag| flag.starts_with('-'))
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.is_option_row() && self.flags.iter().any(|f| f == flag)
    }

    /// Decodes this row's completer.
    pub fn completer(&self) -> Result<Completer, CompletionError> {
        decode_program(&self.program)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionTable {
    rows: Vec<Row>,
}

impl CompletionTable {
    pub fn parse(text: &str) -> Result<Self, CompletionError> {
        let rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| Row::parse(index + 1, line))
            .collect::<Result<_, _>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_at<'a, 'p>(&'a self, path: &'p str) -> impl Iterator<Item = &'a Row> + 'p
    where
        'a: 'p,
    {
        self.rows.iter().filter(move |row| row.path == path)
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.rows_at(path).next().is_some()
    }

    pub fn option(&self, path: &str, flag: &str) -> Option<&Row> {
        self.rows_at(path).find(|row| row.has_flag(flag))
    }

    pub fn positional(&self, path: &str, index: usize) -> Option<&Row> {
        self.rows_at(path)
            .find(|row| !row.is_option_row() && row.positional_index() == Some(index))
    }

    pub fn subcommands(&self, path: &str) -> Option<&Row> {
        self.rows_at(path).find(|row| row.is_subcommand_row())
    }

    pub fn option_rows<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows_at(path).filter(|row| row.is_option_row())
    }
}

/// Undoes `escape_metavar`.
pub fn unescape_metavar(word: &str) -> Result<String, CompletionError> {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('S') => out.push(' '),
            Some('L') => out.push('\\'),
            _ => return Err(CompletionError::InvalidEscape(word.to_string())),
        }
    }
    Ok(out)
}

/// Decodes a row's opcode stream, which must hold exactly one completer.
///
/// An empty stream means [`Completer::Empty`].
pub fn decode_program(tokens: &[String]) -> Result<Completer, CompletionError> {
    if tokens.is_empty() {
        return Ok(Completer::Empty);
    }
    let (completer, used) = decode_one(tokens)?;
    if used != tokens.len() {
        return Err(CompletionError::MalformedOperands {
            opcode: tokens[0].clone(),
            reason: format!("{} trailing tokens", tokens.len() - used),
        });
    }
    Ok(completer)
}

fn parse_count(raw: Option<&String>, what: &'static str) -> Result<usize, CompletionError> {
    let raw = raw.ok_or(CompletionError::UnexpectedEnd(what))?;
    raw.parse().map_err(|_| CompletionError::InvalidNumber {
        what,
        value: raw.clone(),
    })
}

/// Decodes one completer from the front of `tokens`, returning it and the
/// number of tokens used.
fn decode_one(tokens: &[String]) -> Result<(Completer, usize), CompletionError> {
    let opcode = tokens.first().ok_or(CompletionError::UnexpectedEnd("opcode"))?;
    let size = parse_count(tokens.get(1), "operand count")?;
    let available = tokens.len() - 2;
    if size > available {
        return Err(CompletionError::Truncated {
            opcode: opcode.clone(),
            size,
            available,
        });
    }
    let operands = &tokens[2..2 + size];
    let malformed = |reason: &str| CompletionError::MalformedOperands {
        opcode: opcode.clone(),
        reason: reason.to_string(),
    };

    let completer = match opcode.as_str() {
        "-" => Completer::Empty,
        "c" => Completer::Choices(operands.to_vec()),
        "cd" => {
            if size % 2 != 0 {
                return Err(malformed("odd number of operands"));
            }
            let (values, descriptions) = operands.split_at(size / 2);
            Completer::ChoicesWithDescription(
                values
                    .iter()
                    .cloned()
                    .zip(descriptions.iter().cloned())
                    .collect(),
            )
        }
        "f" => Completer::FilePath(
            operands
                .first()
                .map(|exts| {
                    exts.split('|')
                        .filter(|ext| !ext.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        "d" => Completer::DirectoryPath,
        "g" => match operands.first() {
            None => Completer::GitRef(GitModes::default()),
            Some(mask) => {
                Completer::GitRef(GitModes::parse(mask).ok_or_else(|| malformed("bad git mode"))?)
            }
        },
        "l" | "lm" => {
            let delimiter = operands.first().ok_or_else(|| malformed("missing delimiter"))?;
            let inner = decode_exact(&operands[1..], opcode)?;
            Completer::DelimitedList {
                inner: Box::new(inner),
                delimiter: delimiter.clone(),
                many: opcode == "lm",
            }
        }
        "t" | "tm" => {
            let delimiter = operands.first().ok_or_else(|| malformed("missing delimiter"))?;
            let count = parse_count(operands.get(1), "tuple length")?;
            let mut rest = operands.get(2..).unwrap_or(&[]);
            let mut inners = Vec::with_capacity(count.min(rest.len()));
            for _ in 0..count {
                let (inner, used) = decode_one(rest)?;
                inners.push(inner);
                rest = &rest[used..];
            }
            if !rest.is_empty() {
                return Err(malformed("operands left after tuple elements"));
            }
            if inners.is_empty() {
                return Err(malformed("empty tuple"));
            }
            Completer::DelimitedTuple {
                inners,
                delimiter: delimiter.clone(),
                many: opcode == "tm",
            }
        }
        "a" => {
            let count = parse_count(operands.first(), "alternative count")?;
            let mut rest = operands.get(1..).unwrap_or(&[]);
            let mut branches = Vec::with_capacity(count.min(rest.len()));
            for _ in 0..count {
                let (description, tail) = rest
                    .split_first()
                    .ok_or(CompletionError::UnexpectedEnd("alternative description"))?;
                let (inner, used) = decode_one(tail)?;
                branches.push((description.clone(), inner));
                rest = &tail[used..];
            }
            if !rest.is_empty() {
                return Err(malformed("operands left after alternatives"));
            }
            Completer::Alternatives(branches)
        }
        "cc" => Completer::CustomCallback(
            operands
                .first()
                .cloned()
                .ok_or_else(|| malformed("missing token"))?,
        ),
        unknown => {
            tracing::warn!(opcode = unknown, size, "skipping unknown completion opcode");
            Completer::Empty
        }
    };
    Ok((completer, 2 + size))
}

fn decode_exact(tokens: &[String], parent: &str) -> Result<Completer, CompletionError> {
    let (inner, used) = decode_one(tokens)?;
    if used != tokens.len() {
        return Err(CompletionError::MalformedOperands {
            opcode: parent.to_string(),
            reason: "operands left after inner completer".to_string(),
        });
    }
    Ok(inner)
}

#[cfg(test)]
mod tests {
    use super::{decode_program, unescape_metavar, CompletionTable};
    use crate::complete::encode::{encode_completer, encode_tree};
    use crate::complete::tree::{
        Arity, CommandTree, Completer, GitModes, OptionSpec, PositionalSpec,
    };
    use crate::error::CompletionError;

    fn tokens(raw: &str) -> Vec<String> {
        raw.split(' ').map(str::to_string).collect()
    }

    #[test]
    fn decodes_what_the_encoder_writes() {
        let completer = Completer::alternatives([
            (
                "pair",
                Completer::tuple(
                    vec![
                        Completer::list(Completer::choices(["a", "b"]), ","),
                        Completer::GitRef(GitModes::parse("rt").unwrap()),
                    ],
                    ":",
                ),
            ),
            ("custom", Completer::custom("tok")),
            ("files", Completer::files(["rs"])),
        ]);
        assert_eq!(decode_program(&encode_completer(&completer)).unwrap(), completer);
    }

    #[test]
    fn unknown_opcodes_are_skipped_by_size() {
        let completer = decode_program(&tokens("a 10 2 new zz 2 x y old c 1 v")).unwrap();
        assert_eq!(
            completer,
            Completer::alternatives([
                ("new", Completer::Empty),
                ("old", Completer::choices(["v"])),
            ])
        );
    }

    #[test]
    fn truncated_stream_is_an_error() {
        assert_eq!(
            decode_program(&tokens("c 3 a b")),
            Err(CompletionError::Truncated {
                opcode: "c".to_string(),
                size: 3,
                available: 2,
            })
        );
        assert!(matches!(
            decode_program(&tokens("c x")),
            Err(CompletionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            decode_program(&tokens("cd 3 a b c")),
            Err(CompletionError::MalformedOperands { .. })
        ));
        assert!(matches!(
            decode_program(&tokens("l 3 , c 5")),
            Err(CompletionError::Truncated { .. })
        ));
        assert!(matches!(
            decode_program(&tokens("t 4 : 2 d 0")),
            Err(CompletionError::UnexpectedEnd(_))
        ));
    }

    #[test]
    fn table_lookups() {
        let tree = CommandTree::new("app")
            .option(OptionSpec::value(["-o", "--out"], "FILE", Completer::files(["txt"])))
            .positional(PositionalSpec::new("SRC", Completer::DirectoryPath).arity(Arity::OneOrMore))
            .subcommand(CommandTree::new("build"));
        let table = CompletionTable::parse(&encode_tree(&tree)).unwrap();

        let out = table.option("", "--out").unwrap();
        assert_eq!(out.metavar, vec!["FILE".to_string()]);
        assert_eq!(out.completer().unwrap(), Completer::files(["txt"]));
        assert_eq!(table.positional("", 0).unwrap().arity, Arity::OneOrMore);
        assert!(table.positional("", 1).is_none());
        assert!(table.subcommands("").is_some());
        assert!(table.has_path("/build"));
        assert!(table.option("/build", "--help").is_some());
    }

    #[test]
    fn short_rows_and_bad_arity_fail_parsing() {
        assert_eq!(
            CompletionTable::parse("\t-x\tdesc\n"),
            Err(CompletionError::MissingFields { line: 1, found: 3 })
        );
        assert_eq!(
            CompletionTable::parse("\t-x\t\t\tmany\t-\t0"),
            Err(CompletionError::InvalidArity("many".to_string()))
        );
    }

    #[test]
    fn metavar_escapes() {
        assert_eq!(unescape_metavar("a\\Sb\\Lc").unwrap(), "a b\\c");
        assert!(unescape_metavar("a\\x").is_err());
    }
}

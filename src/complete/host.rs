//! Side effects the interpreter needs: directory listings, git refs and
//! custom completer callbacks.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::complete::tree::GitModes;
use crate::error::CompletionError;

/// Hidden flag a hosted program answers with `value\tdescription` lines.
pub const CUSTOM_COMPLETE_FLAG: &str = "--_tape-complete";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait CompletionHost {
    /// Entries of `dir`, which is relative to the host's working directory
    /// unless absolute.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// `(ref, kind)` pairs for the requested modes.
    fn git_refs(&self, modes: GitModes) -> Vec<(String, String)>;

    /// Runs the custom completer registered under `token` for `word`.
    fn custom(&self, token: &str, word: &str) -> Result<Vec<(String, String)>, CompletionError>;

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// Host backed by the real filesystem, `git` and the hosted program.
#[derive(Debug, Clone)]
pub struct SystemHost {
    program: Option<PathBuf>,
    base_dir: PathBuf,
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemHost {
    pub fn new() -> Self {
        Self {
            program: None,
            base_dir: PathBuf::from("."),
        }
    }

    /// Program invoked for `cc` completers.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.base_dir)
            .output()
            .ok()?;
        if !output.status.success() {
            tracing::debug!(?args, status = %output.status, "git query failed");
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }
}

impl CompletionHost for SystemHost {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.base_dir.join(dir))? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // Follows symlinks so a link to a directory completes like one.
            let is_dir = entry.path().is_dir();
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn git_refs(&self, modes: GitModes) -> Vec<(String, String)> {
        let mut refs = Vec::new();
        if modes.heads {
            if let Some(git_dir) = self.git(&["rev-parse", "--git-dir"]) {
                let git_dir = self.base_dir.join(git_dir.trim());
                for head in ["HEAD", "FETCH_HEAD", "ORIG_HEAD", "MERGE_HEAD"] {
                    if git_dir.join(head).exists() {
                        refs.push((head.to_string(), "head".to_string()));
                    }
                }
            }
        }

        let mut namespaces = Vec::new();
        if modes.branches {
            namespaces.push(("refs/heads/", "branch"));
        }
        if modes.remotes {
            namespaces.push(("refs/remotes/", "remote branch"));
        }
        if modes.tags {
            namespaces.push(("refs/tags/", "tag"));
        }
        if namespaces.is_empty() {
            return refs;
        }

        let mut args = vec!["for-each-ref", "--format=%(refname)"];
        args.extend(namespaces.iter().map(|(prefix, _)| *prefix));
        let Some(listing) = self.git(&args) else {
            return refs;
        };
        for line in listing.lines() {
            for (prefix, kind) in &namespaces {
                if let Some(name) = line.strip_prefix(prefix) {
                    if *kind == "remote branch" && name.ends_with("/HEAD") {
                        continue;
                    }
                    refs.push((name.to_string(), kind.to_string()));
                }
            }
        }
        refs
    }

    fn custom(&self, token: &str, word: &str) -> Result<Vec<(String, String)>, CompletionError> {
        let failure = |reason: String| CompletionError::Custom {
            token: token.to_string(),
            reason,
        };
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| failure("no program to ask".to_string()))?;
        let output = Command::new(program)
            .arg(CUSTOM_COMPLETE_FLAG)
            .arg(token)
            .arg(word)
            .current_dir(&self.base_dir)
            .output()
            .map_err(|err| failure(format!("{}: {err}", program.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(parse_custom_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses `value\tdescription` lines; the description is optional.
pub fn parse_custom_output(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('\t') {
            Some((value, description)) => (value.to_string(), description.to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_custom_output, CompletionHost, DirEntry, SystemHost};
    use crate::error::CompletionError;
    use std::path::Path;

    #[test]
    fn custom_output_lines() {
        assert_eq!(
            parse_custom_output("alpha\tfirst\nbeta\n\ngamma\ta\tb\n"),
            vec![
                ("alpha".to_string(), "first".to_string()),
                ("beta".to_string(), String::new()),
                ("gamma".to_string(), "a\tb".to_string()),
            ]
        );
    }

    #[test]
    fn lists_directory_sorted_with_kinds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        let host = SystemHost::new().with_base_dir(dir.path());
        assert_eq!(
            host.list_dir(Path::new("")).unwrap(),
            vec![
                DirEntry {
                    name: "a".to_string(),
                    is_dir: true
                },
                DirEntry {
                    name: "b.txt".to_string(),
                    is_dir: false
                },
            ]
        );
        assert!(host.list_dir(Path::new("missing")).is_err());
    }

    #[test]
    fn custom_without_program_is_an_error() {
        let err = SystemHost::new().custom("tok", "").unwrap_err();
        assert!(matches!(err, CompletionError::Custom { ref token, .. } if token == "tok"));
    }
}

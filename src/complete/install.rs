//! Writes encoded completion tables where shell front ends look for them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::complete::encode::encode_tree;
use crate::complete::tree::CommandTree;

const DATA_SUBDIR: &str = "tape_term";
const DATA_EXTENSION: &str = "compdata.tsv";

/// `<data dir>/tape_term`, e.g. `~/.local/share/tape_term` on Linux.
pub fn completion_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(DATA_SUBDIR))
}

pub fn completion_data_path(prog: &str) -> Option<PathBuf> {
    completion_data_dir().map(|dir| data_file(&dir, prog))
}

fn data_file(dir: &Path, prog: &str) -> PathBuf {
    // Invoked as `./bin/app`, installed as `app`.
    let name = Path::new(prog)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(prog);
    dir.join(format!("{name}.{DATA_EXTENSION}"))
}

fn no_data_dir() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "no user data directory")
}

/// Encodes `tree` and writes it to [`completion_data_path`].
pub fn install_completion_data(prog: &str, tree: &CommandTree) -> io::Result<PathBuf> {
    let dir = completion_data_dir().ok_or_else(no_data_dir)?;
    install_completion_data_in(&dir, prog, tree)
}

pub fn install_completion_data_in(dir: &Path, prog: &str, tree: &CommandTree) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = data_file(dir, prog);
    let staging = path.with_extension("tsv.tmp");
    let mut encoded = encode_tree(tree);
    encoded.push('\n');
    fs::write(&staging, encoded)?;
    fs::rename(&staging, &path)?;
    tracing::debug!(path = %path.display(), "installed completion data");
    Ok(path)
}

/// Removes the installed table; `Ok(false)` when there was none.
pub fn uninstall_completion_data(prog: &str) -> io::Result<bool> {
    let dir = completion_data_dir().ok_or_else(no_data_dir)?;
    uninstall_completion_data_in(&dir, prog)
}

pub fn uninstall_completion_data_in(dir: &Path, prog: &str) -> io::Result<bool> {
    match fs::remove_file(data_file(dir, prog)) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::{install_completion_data_in, uninstall_completion_data_in};
    use crate::complete::table::CompletionTable;
    use crate::complete::tree::{CommandTree, OptionSpec};

    #[test]
    fn install_writes_parseable_table_and_uninstall_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let tree = CommandTree::new("demo").option(OptionSpec::switch(["-q"], "quiet"));

        let path = install_completion_data_in(&target, "./bin/demo", &tree).unwrap();
        assert_eq!(path, target.join("demo.compdata.tsv"));
        let table = CompletionTable::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(table.option("", "-q").is_some());
        assert!(!target.join("demo.compdata.tsv.tmp").exists());

        assert!(uninstall_completion_data_in(&target, "demo").unwrap());
        assert!(!uninstall_completion_data_in(&target, "demo").unwrap());
    }
}

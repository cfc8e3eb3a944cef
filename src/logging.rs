//! Debug logging sinks.
//!
//! Nothing is installed unless `TAPE_TERM_DEBUG` or `TAPE_TERM_DEBUG_LOG` is set,
//! so interactive output never interleaves with log lines by default.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

const DEFAULT_FILTER: &str = "tape_term=debug";

/// Where the installed subscriber sends its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Installs a global `tracing` subscriber when debug logging is enabled.
///
/// Returns `None` when logging stays off or another subscriber already owns the
/// global slot.
pub fn init_logging(config: &EnvConfig) -> Option<LogTarget> {
    if !config.debug {
        return None;
    }

    let filter = config
        .log_filter
        .as_deref()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let (writer, target, ansi) = match config.debug_log.as_ref() {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => (
                BoxMakeWriter::new(Mutex::new(file)),
                LogTarget::File(path.clone()),
                false,
            ),
            Err(err) => {
                eprintln!(
                    "warning: failed to open debug log {}: {err}",
                    path.display()
                );
                stderr_writer()
            }
        },
        None => stderr_writer(),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(ansi)
        .with_writer(writer);

    subscriber.try_init().ok().map(|()| target)
}

fn stderr_writer() -> (BoxMakeWriter, LogTarget, bool) {
    (
        BoxMakeWriter::new(std::io::stderr),
        LogTarget::Stderr,
        std::io::stderr().is_terminal(),
    )
}

#[cfg(test)]
mod tests {
    use super::init_logging;
    use crate::config::EnvConfig;

    #[test]
    fn disabled_config_installs_nothing() {
        assert_eq!(init_logging(&EnvConfig::default()), None);
    }
}

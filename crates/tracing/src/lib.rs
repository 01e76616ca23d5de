//! Logging setup for the `etc-node` binary: a stdout layer plus an optional rolling file layer,
//! with verbosity controlled by repeated `-v` flags and refinable via `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Verbosity requested on the command line, lowest first. Each step widens the default filter;
/// `RUST_LOG` always takes precedence when set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet,
    /// Info-level, the default.
    Normal,
    /// Debug-level (`-v`).
    Verbose,
    /// Trace-level (`-vv`).
    VeryVerbose,
}

impl Verbosity {
    /// Maps a `-v` occurrence count to a verbosity level.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::VeryVerbose,
        }
    }

    fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::VeryVerbose => "trace",
        }
    }
}

/// Where the rolling file layer writes, if enabled.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub directory: std::path::PathBuf,
    pub file_name_prefix: String,
}

/// Builds and installs the global subscriber: a stdout fmt layer sized to `verbosity`, plus an
/// optional non-blocking rolling file layer. Returns the file layer's worker guard, which must
/// be kept alive for the process lifetime or buffered log lines are dropped on exit.
pub struct LayerInfo {
    verbosity: Verbosity,
    file: Option<FileInfo>,
}

impl LayerInfo {
    /// Starts a builder at the given verbosity with no file layer.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity, file: None }
    }

    /// Adds a rolling daily file layer alongside stdout.
    pub fn with_file(mut self, file: FileInfo) -> Self {
        self.file = Some(file);
        self
    }

    /// Installs the global subscriber. Call once, at process startup.
    pub fn init(self) -> Option<tracing_appender::non_blocking::WorkerGuard> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.verbosity.default_directive()));
        let stdout_layer = fmt::layer().with_target(true).with_filter(filter);

        match self.file {
            Some(file) => {
                let appender =
                    tracing_appender::rolling::daily(&file.directory, &file.file_name_prefix);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_filter = EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(self.verbosity.default_directive()));
                let file_layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter);
                tracing_subscriber::registry().with(stdout_layer).with(file_layer).init();
                Some(guard)
            }
            None => {
                tracing_subscriber::registry().with(stdout_layer).init();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_escalates_with_flag_count() {
        assert_eq!(Verbosity::from_count(0), Verbosity::Normal);
        assert_eq!(Verbosity::from_count(1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_count(5), Verbosity::VeryVerbose);
    }

    #[test]
    fn ordering_increases_with_verbosity() {
        assert!(Verbosity::VeryVerbose > Verbosity::Verbose);
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Verbosity::Normal > Verbosity::Quiet);
    }
}

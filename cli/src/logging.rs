//! Tracing setup: a console layer and a daily log file under `log/`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default directives for the log file.
pub const FILE_FILTER: &str = "info,scrapefrb=debug";

/// Console verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    /// No console output.
    Quiet,
    /// Info and above.
    Normal,
    /// Debug and above.
    Verbose,
}

impl Console {
    /// Pick the console mode from the `-q`/`-v` flags; quiet wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    fn directives(self) -> &'static str {
        match self {
            Self::Verbose => "debug",
            Self::Quiet | Self::Normal => "info",
        }
    }
}

/// `RUST_LOG` when set, `default` otherwise.
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber, appending to `log_file`.
pub fn init_tracing(console: Console, log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .with_filter(filter(FILE_FILTER));

    let console_layer = (console != Console::Quiet).then(|| {
        fmt::layer()
            .with_target(false)
            .with_filter(filter(console.directives()))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(())
}

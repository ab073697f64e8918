//! Console reporting and tracing setup.

use std::fmt;

use tracing::level_filters::LevelFilter;

/// How much the tool prints while working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    Silent,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// Resolve the command line switches. `silent` wins when both are set.
    pub fn from_flags(verbose: bool, silent: bool) -> Self {
        match (verbose, silent) {
            (_, true) => Verbosity::Silent,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Install the stderr tracing subscriber. Later calls are ignored.
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(verbosity.level_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Logger value owned by the compiler and the watch loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbosity: Verbosity,
}

impl Reporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn is_silent(&self) -> bool {
        self.verbosity == Verbosity::Silent
    }

    /// Step-by-step progress, shown only with `--verbose`.
    pub fn detail(&self, message: fmt::Arguments<'_>) {
        if self.is_verbose() {
            tracing::debug!("{message}");
        }
    }

    /// Non-fatal problems, hidden by `--silent`.
    pub fn warn(&self, message: fmt::Arguments<'_>) {
        if !self.is_silent() {
            tracing::warn!("{message}");
        }
    }

    pub fn error(&self, error: &anyhow::Error) {
        tracing::error!("{error:#}");
    }

    /// Final user-facing lines such as `Done.`.
    pub fn status(&self, message: &str) {
        println!("{message}");
    }
}

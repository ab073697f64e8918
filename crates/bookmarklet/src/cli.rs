//! Command line interface.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::app::compile::{CompileOptions, Compiler};
use crate::app::watch::{CancelToken, RetryPolicy, Watcher};
use crate::infra::config::Config;
use crate::infra::logging::{self, Reporter, Verbosity};

#[derive(Debug, Parser)]
#[command(
    name = "bookmarklet",
    author,
    version,
    about = "Compile a marked region of a JavaScript file into a javascript: bookmarklet"
)]
pub struct Cli {
    /// Input file (default: bookmarklet-uncompiled.js)
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file (default: bookmarklet.js)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Silent output
    #[arg(short, long)]
    pub silent: bool,

    /// Watch input file for changes
    #[arg(short, long)]
    pub watch: bool,

    /// Watch interval in seconds (default: 1)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub watch_interval: Option<u64>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.silent)
    }

    /// Run the command described by the parsed arguments.
    pub fn run(self) -> Result<()> {
        if let Some(shell) = self.completions {
            clap_complete::generate(shell, &mut Cli::command(), "bookmarklet", &mut io::stdout());
            return Ok(());
        }

        let verbosity = self.verbosity();
        logging::init(verbosity);
        let reporter = Reporter::new(verbosity);

        let config = Config::load()?.with_cli(self.input, self.output, self.watch_interval);
        let compiler = Compiler::new(CompileOptions::from_config(&config), reporter);
        compiler.compile()?;

        if !self.watch {
            reporter.status("Done.");
            return Ok(());
        }

        let cancel = CancelToken::new();
        cancel.cancel_on_ctrl_c()?;
        let interval = Duration::from_secs(config.watch.interval_secs().max(1));
        Watcher::new(compiler, interval)
            .with_policy(RetryPolicy::from_config(&config.watch))
            .run(&cancel)
    }
}

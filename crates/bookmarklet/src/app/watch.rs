//! Polling watch loop that recompiles whenever the input file changes.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::app::compile::Compiler;
use crate::app::minify::{JsMin, Minifier};
use crate::infra::config::{OnError, Watch};

/// Upper bound on how long an interrupt can go unnoticed while sleeping.
const CANCEL_CHECK: Duration = Duration::from_millis(50);

/// Shared flag flipped when the user asks the loop to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel this token on Ctrl-C. Only one handler may be installed per process.
    pub fn cancel_on_ctrl_c(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || token.cancel()).context("failed to install Ctrl-C handler")
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Unchanged,
    Recompiled,
}

/// Next step after a failed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue { backoff: Duration },
    Abort,
}

/// How the loop treats errors raised by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    LogAndContinue { backoff: Duration },
    Abort,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::LogAndContinue {
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(watch: &Watch) -> Self {
        match watch.on_error() {
            OnError::Continue => RetryPolicy::LogAndContinue {
                backoff: watch.error_backoff(),
            },
            OnError::Abort => RetryPolicy::Abort,
        }
    }

    pub fn decide(&self, _error: &anyhow::Error) -> LoopAction {
        match *self {
            RetryPolicy::LogAndContinue { backoff } => LoopAction::Continue { backoff },
            RetryPolicy::Abort => LoopAction::Abort,
        }
    }
}

/// Re-runs the compiler each time the input content differs from the last poll.
pub struct Watcher<M = JsMin> {
    compiler: Compiler<M>,
    interval: Duration,
    policy: RetryPolicy,
    last_content: String,
}

impl<M: Minifier> Watcher<M> {
    pub fn new(compiler: Compiler<M>, interval: Duration) -> Self {
        Self {
            compiler,
            interval,
            policy: RetryPolicy::default(),
            last_content: String::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read the input once and recompile if it changed since the previous poll.
    pub fn poll_once(&mut self) -> Result<PollOutcome> {
        let input = self.compiler.input();
        let reporter = self.compiler.reporter();
        reporter.detail(format_args!("Checking {}", input.display()));

        let current = fs::read_to_string(input)
            .with_context(|| format!("failed to read input file {}", input.display()))?;
        if current == self.last_content {
            return Ok(PollOutcome::Unchanged);
        }
        self.last_content = current;

        let bookmarklet = self.compiler.compile()?;
        if reporter.is_verbose() {
            match OffsetDateTime::now_utc().format(format_description!("[hour]:[minute]:[second]")) {
                Ok(stamp) => reporter.detail(format_args!(
                    "Compiled {} bytes at {stamp} UTC",
                    bookmarklet.as_str().len()
                )),
                Err(err) => reporter.warn(format_args!("failed to format timestamp: {err}")),
            }
        }
        Ok(PollOutcome::Recompiled)
    }

    /// Poll until `cancel` fires, applying the retry policy to failed iterations.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<()> {
        loop {
            if !sleep_unless_cancelled(self.interval, cancel) {
                break;
            }
            if let Err(error) = self.poll_once() {
                match self.policy.decide(&error) {
                    LoopAction::Continue { backoff } => {
                        self.compiler.reporter().error(&error);
                        if !sleep_unless_cancelled(backoff, cancel) {
                            break;
                        }
                    }
                    LoopAction::Abort => return Err(error),
                }
            }
        }
        self.compiler.reporter().status("Exiting...");
        Ok(())
    }
}

/// Returns `false` if the token was cancelled before `duration` elapsed.
fn sleep_unless_cancelled(duration: Duration, cancel: &CancelToken) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(CANCEL_CHECK));
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::app::compile::CompileOptions;
    use crate::infra::logging::{Reporter, Verbosity};

    const FIRST: &str = "(() => { // start bookmarklet\nalert(1);\n// end bookmarklet\n})()";
    const SECOND: &str = "(() => { // start bookmarklet\nalert(2);\n// end bookmarklet\n})()";

    fn watcher_for(dir: &Path, interval: Duration) -> Watcher {
        let compiler = Compiler::new(
            CompileOptions::new(dir.join("in.js"), dir.join("out.js")),
            Reporter::new(Verbosity::Silent),
        );
        Watcher::new(compiler, interval)
    }

    #[test]
    fn recompiles_only_on_change() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let output = temp.path().join("out.js");
        fs::write(temp.path().join("in.js"), FIRST)?;
        let mut watcher = watcher_for(temp.path(), Duration::from_millis(10));

        assert_eq!(watcher.poll_once()?, PollOutcome::Recompiled);
        assert!(fs::read_to_string(&output)?.contains("alert(1)"));

        fs::remove_file(&output)?;
        assert_eq!(watcher.poll_once()?, PollOutcome::Unchanged);
        assert!(!output.exists());

        fs::write(temp.path().join("in.js"), SECOND)?;
        assert_eq!(watcher.poll_once()?, PollOutcome::Recompiled);
        assert!(fs::read_to_string(&output)?.contains("alert(2)"));
        Ok(())
    }

    #[test]
    fn read_failure_surfaces_from_poll() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut watcher = watcher_for(temp.path(), Duration::from_millis(10));
        let err = watcher.poll_once().unwrap_err();
        assert!(format!("{err:#}").contains("failed to read input file"));
        Ok(())
    }

    #[test]
    fn failed_compile_waits_for_next_change() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("in.js"), "no markers here")?;
        let mut watcher = watcher_for(temp.path(), Duration::from_millis(10));

        assert!(watcher.poll_once().is_err());
        assert_eq!(watcher.poll_once()?, PollOutcome::Unchanged);

        fs::write(temp.path().join("in.js"), FIRST)?;
        assert_eq!(watcher.poll_once()?, PollOutcome::Recompiled);
        Ok(())
    }

    #[test]
    fn policy_decisions() {
        let error = anyhow::anyhow!("boom");
        let backoff = Duration::from_millis(250);
        assert_eq!(
            RetryPolicy::LogAndContinue { backoff }.decide(&error),
            LoopAction::Continue { backoff }
        );
        assert_eq!(RetryPolicy::Abort.decide(&error), LoopAction::Abort);
        assert_eq!(
            RetryPolicy::default().decide(&error),
            LoopAction::Continue {
                backoff: Duration::from_secs(1)
            }
        );
        assert_eq!(
            RetryPolicy::from_config(&Watch::default()),
            RetryPolicy::default()
        );
    }

    #[test]
    fn abort_policy_stops_the_loop() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut watcher =
            watcher_for(temp.path(), Duration::from_millis(10)).with_policy(RetryPolicy::Abort);
        assert!(watcher.run(&CancelToken::new()).is_err());
        Ok(())
    }

    #[test]
    fn cancelled_token_ends_run() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut watcher = watcher_for(temp.path(), Duration::from_secs(60));
        let cancel = CancelToken::new();
        cancel.cancel();
        watcher.run(&cancel)?;
        Ok(())
    }

    #[test]
    fn picks_up_changes_while_running() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let input = temp.path().join("in.js");
        let output = temp.path().join("out.js");
        fs::write(&input, FIRST)?;

        let mut watcher = watcher_for(temp.path(), Duration::from_millis(20));
        let cancel = CancelToken::new();
        let handle = thread::spawn({
            let cancel = cancel.clone();
            move || watcher.run(&cancel)
        });

        wait_for(&output, "alert(1)");
        fs::write(&input, SECOND)?;
        wait_for(&output, "alert(2)");

        cancel.cancel();
        handle.join().expect("watch thread")?;
        Ok(())
    }

    #[test]
    fn verbose_poll_reports_and_recompiles() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("in.js"), FIRST)?;
        let compiler = Compiler::new(
            CompileOptions::new(temp.path().join("in.js"), temp.path().join("out.js")),
            Reporter::new(Verbosity::Verbose),
        );
        let mut watcher = Watcher::new(compiler, Duration::from_millis(10));

        assert_eq!(watcher.poll_once()?, PollOutcome::Recompiled);
        assert!(temp.path().join("out.js").exists());
        Ok(())
    }

    #[test]
    fn keeps_running_after_failed_iterations() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let input = temp.path().join("in.js");
        let output = temp.path().join("out.js");

        let mut watcher = watcher_for(temp.path(), Duration::from_millis(20)).with_policy(
            RetryPolicy::LogAndContinue {
                backoff: Duration::from_millis(10),
            },
        );
        let cancel = CancelToken::new();
        let handle = thread::spawn({
            let cancel = cancel.clone();
            move || watcher.run(&cancel)
        });

        thread::sleep(Duration::from_millis(100));
        fs::write(&input, "no markers here")?;
        thread::sleep(Duration::from_millis(100));
        assert!(!output.exists());
        assert!(!handle.is_finished());

        fs::write(&input, FIRST)?;
        wait_for(&output, "alert(1)");

        cancel.cancel();
        handle.join().expect("watch thread")?;
        Ok(())
    }

    fn wait_for(path: &Path, expected: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if fs::read_to_string(path).is_ok_and(|content| content.contains(expected)) {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("{} never contained {expected:?}", path.display());
    }
}

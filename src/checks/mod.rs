//! Check executors
//!
//! One executor per [`CheckKind`], all reached through [`run`]:
//!
//! - `command` - runs an external program, judged by its exit code
//! - `pattern_scan` - reports the first forbidden pattern in each file
//! - `coverage` - compares a supplied coverage figure with a threshold
//! - `reference_validation` - checks that asset references resolve
//!
//! Executors return `Ok` with a Pass/Fail/Skipped outcome for anything the
//! check itself decides. An `Err` means the check could not run (bad
//! parameters, missing program, unreadable artifact) and becomes Errored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{CheckDefinition, CheckKind};
use crate::external::{CommandRunner, FileSystem};
use crate::filter::FileSet;
use crate::report::{CheckResult, CheckStatus};

pub mod command;
pub mod coverage;
pub mod pattern;
pub mod reference;

/// Capabilities and defaults shared by every check in a run
#[derive(Clone)]
pub struct CheckContext {
    pub runner: Arc<dyn CommandRunner>,
    pub fs: Arc<dyn FileSystem>,
    /// Timeout for command checks that do not set their own
    pub default_timeout: Duration,
}

impl CheckContext {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            fs,
            default_timeout,
        }
    }
}

/// What an executor concluded, before it is stamped with a name and duration
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl CheckOutcome {
    fn with_status(status: CheckStatus, messages: Vec<String>) -> Self {
        Self {
            status,
            messages,
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn pass() -> Self {
        Self::with_status(CheckStatus::Pass, Vec::new())
    }

    pub fn fail(messages: Vec<String>) -> Self {
        Self::with_status(CheckStatus::Fail, messages)
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Skipped, vec![message.into()])
    }

    pub fn errored(messages: Vec<String>) -> Self {
        Self::with_status(CheckStatus::Errored, messages)
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn into_result(self, name: &str, duration: Duration) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            status: self.status,
            messages: self.messages,
            warnings: self.warnings,
            suggestions: self.suggestions,
            duration,
        }
    }
}

/// Run one check against its already-filtered files
pub async fn run(check: &CheckDefinition, files: &FileSet, ctx: &CheckContext) -> CheckResult {
    let started = Instant::now();
    tracing::debug!("Running {} check '{}' on {} files", check.kind, check.name, files.len());

    let outcome = match check.kind {
        CheckKind::Command => command::run(check, files, ctx).await,
        _ => evaluate_local(check, files, ctx.fs.as_ref()),
    };
    finish(check, outcome, started)
}

/// Run a check that only reads files, on the calling thread.
///
/// Reads block, so call this from a blocking-capable thread
/// (`spawn_blocking`). Command checks need the async runner and are
/// reported as Errored here.
pub fn run_blocking(check: &CheckDefinition, files: &FileSet, ctx: &CheckContext) -> CheckResult {
    let started = Instant::now();
    tracing::debug!("Running {} check '{}' on {} files", check.kind, check.name, files.len());

    let outcome = evaluate_local(check, files, ctx.fs.as_ref());
    finish(check, outcome, started)
}

fn evaluate_local(
    check: &CheckDefinition,
    files: &FileSet,
    fs: &dyn FileSystem,
) -> anyhow::Result<CheckOutcome> {
    match check.kind {
        CheckKind::Command => {
            anyhow::bail!("command check '{}' cannot run without the process runner", check.name)
        }
        CheckKind::PatternScan => pattern::run(check, files, fs),
        CheckKind::Coverage => coverage::run(check, fs),
        CheckKind::ReferenceValidation => reference::run(check, files, fs),
    }
}

fn finish(check: &CheckDefinition, outcome: anyhow::Result<CheckOutcome>, started: Instant) -> CheckResult {
    let outcome = outcome.unwrap_or_else(|e| {
        tracing::warn!("Check '{}' could not run: {:#}", check.name, e);
        CheckOutcome::errored(vec![format!("{e:#}")])
    });

    outcome.into_result(&check.name, started.elapsed())
}

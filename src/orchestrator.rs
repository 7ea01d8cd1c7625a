//! Hook orchestration
//!
//! The [`Orchestrator`] walks the hook list in order, resolves each name
//! against the registry, narrows the file set with the exclusion rules and
//! dispatches to the check executors. Unknown and disabled hooks become
//! Skipped results; they never abort a run.
//!
//! In concurrent mode, runs of consecutive independent checks are executed
//! as one batch of tokio tasks, with file-reading checks on blocking threads.
//! Their results are slotted by hook position, so the report is always in
//! hook order.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::checks::{self, CheckContext};
use crate::config::{CheckDefinition, CheckKind, ExclusionRules, GateConfig};
use crate::external::{CommandRunner, FileSystem};
use crate::filter::{self, FileSet};
use crate::registry::{CheckRegistry, Resolution};
use crate::report::{CheckResult, Report};

/// How checks are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One check at a time, in hook order
    #[default]
    Sequential,
    /// Consecutive independent checks run together, at most `max_parallel`
    /// at once (0 = number of CPU cores)
    Concurrent { max_parallel: usize },
}

/// What a dry run would do for one hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPlan {
    pub name: String,
    pub action: PlannedAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Run {
        kind: CheckKind,
        description: String,
        /// Files left after exclusions
        files: usize,
    },
    Skip { reason: String },
    /// The check's exclusion rules do not compile
    Invalid { reason: String },
}

/// A hook resolved and ready to dispatch
struct Prepared {
    check: CheckDefinition,
    files: FileSet,
}

/// A hook either ready to run or already settled without running
enum Step {
    Run(Prepared),
    Settled(CheckResult),
}

pub struct Orchestrator {
    registry: CheckRegistry,
    exclusions: ExclusionRules,
    context: CheckContext,
    fail_fast: bool,
    schedule: Schedule,
}

impl Orchestrator {
    pub fn new(registry: CheckRegistry, exclusions: ExclusionRules, context: CheckContext) -> Self {
        Self {
            registry,
            exclusions,
            context,
            fail_fast: false,
            schedule: Schedule::Sequential,
        }
    }

    /// Build from a loaded configuration and the capabilities to run with
    pub fn from_config(
        config: &GateConfig,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let context = CheckContext::new(runner, fs, Duration::from_secs(config.execution.timeout));
        let schedule = if config.execution.parallel {
            Schedule::Concurrent {
                max_parallel: config.execution.max_parallel,
            }
        } else {
            Schedule::Sequential
        };

        Self::new(
            CheckRegistry::from_config(config),
            config.exclusions.clone(),
            context,
        )
        .with_fail_fast(config.reporting.fail_fast)
        .with_schedule(schedule)
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Files a check sees once the global and its own exclusions are applied
    fn files_for(&self, check: &CheckDefinition, files: &FileSet) -> anyhow::Result<FileSet> {
        if !check.respect_exclusions {
            return Ok(files.clone());
        }
        filter::filter(files, &self.exclusions.merged(&check.exclusions))
    }

    fn prepare(&self, hook: &str, files: &FileSet) -> Step {
        let check = match self.registry.lookup(hook) {
            Resolution::Found(check) => check,
            resolution => {
                let reason = resolution.skip_reason(hook).unwrap_or_default();
                tracing::warn!("Skipping hook '{}': {}", hook, reason);
                return Step::Settled(CheckResult::skipped(hook, reason));
            }
        };

        match self.files_for(check, files) {
            Ok(filtered) => Step::Run(Prepared {
                check: check.clone(),
                files: filtered,
            }),
            Err(e) => Step::Settled(CheckResult::errored(hook, format!("{e:#}"))),
        }
    }

    /// Resolve every hook without running anything
    pub fn plan(&self, hooks: &[String], files: &FileSet) -> Vec<HookPlan> {
        hooks
            .iter()
            .map(|hook| {
                let action = match self.registry.lookup(hook) {
                    Resolution::Found(check) => match self.files_for(check, files) {
                        Ok(filtered) => PlannedAction::Run {
                            kind: check.kind,
                            description: check.description.clone(),
                            files: filtered.len(),
                        },
                        Err(e) => PlannedAction::Invalid {
                            reason: format!("{e:#}"),
                        },
                    },
                    resolution => PlannedAction::Skip {
                        reason: resolution.skip_reason(hook).unwrap_or_default(),
                    },
                };
                HookPlan {
                    name: hook.clone(),
                    action,
                }
            })
            .collect()
    }

    /// Run the hooks in order against `files` and seal the report
    pub async fn run(&self, hooks: &[String], files: &FileSet) -> Report {
        let started_at = Utc::now();
        tracing::info!("Running {} hooks against {} files", hooks.len(), files.len());

        let results = match self.schedule {
            Schedule::Sequential => self.run_sequential(hooks, files).await,
            Schedule::Concurrent { max_parallel } => {
                let limit = if max_parallel == 0 {
                    num_cpus::get()
                } else {
                    max_parallel
                };
                self.run_concurrent(hooks, files, limit.max(1)).await
            }
        };

        let report = Report::new(results, started_at, Utc::now());
        tracing::info!(
            "Run finished with {:?} after {} of {} hooks",
            report.overall,
            report.results.len(),
            hooks.len()
        );
        report
    }

    async fn run_sequential(&self, hooks: &[String], files: &FileSet) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(hooks.len());
        for hook in hooks {
            let result = match self.prepare(hook, files) {
                Step::Settled(result) => result,
                Step::Run(prepared) => {
                    checks::run(&prepared.check, &prepared.files, &self.context).await
                }
            };
            if self.record(&mut results, result) {
                break;
            }
        }
        results
    }

    async fn run_concurrent(&self, hooks: &[String], files: &FileSet, limit: usize) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(hooks.len());
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut steps = hooks.iter().map(|hook| self.prepare(hook, files)).peekable();

        while let Some(step) = steps.next() {
            let prepared = match step {
                Step::Settled(result) => {
                    if self.record(&mut results, result) {
                        break;
                    }
                    continue;
                }
                Step::Run(prepared) if !prepared.check.runs_independently() => {
                    let result =
                        checks::run(&prepared.check, &prepared.files, &self.context).await;
                    if self.record(&mut results, result) {
                        break;
                    }
                    continue;
                }
                Step::Run(prepared) => prepared,
            };

            // Extend the batch with the independent checks that follow
            let mut batch = vec![prepared];
            while let Some(Step::Run(next)) = steps.peek() {
                if !next.check.runs_independently() {
                    break;
                }
                if let Some(Step::Run(next)) = steps.next() {
                    batch.push(next);
                }
            }

            let mut stopped = false;
            for result in self.run_batch(batch, &semaphore).await {
                if self.record(&mut results, result) {
                    stopped = true;
                    break;
                }
            }
            if stopped {
                break;
            }
        }
        results
    }

    /// Run a batch of independent checks, returning results in batch order
    async fn run_batch(&self, batch: Vec<Prepared>, semaphore: &Arc<Semaphore>) -> Vec<CheckResult> {
        tracing::debug!("Running {} independent checks concurrently", batch.len());

        let names: Vec<String> = batch.iter().map(|p| p.check.name.clone()).collect();
        let mut slots: Vec<Option<CheckResult>> = vec![None; batch.len()];
        let mut tasks = JoinSet::new();

        for (slot, prepared) in batch.into_iter().enumerate() {
            let context = self.context.clone();
            // The permit travels with the task and is released when it ends
            let permit = Arc::clone(semaphore).acquire_owned().await.ok();

            // File-reading checks block, so they get a blocking thread
            // instead of a runtime worker
            if prepared.check.kind == CheckKind::Command {
                tasks.spawn(async move {
                    let _permit = permit;
                    let result = checks::run(&prepared.check, &prepared.files, &context).await;
                    (slot, result)
                });
            } else {
                tasks.spawn_blocking(move || {
                    let _permit = permit;
                    let result = checks::run_blocking(&prepared.check, &prepared.files, &context);
                    (slot, result)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => slots[slot] = Some(result),
                Err(e) => tracing::warn!("Check task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| CheckResult::errored(&name, "check task did not complete"))
            })
            .collect()
    }

    /// Append a result; true when fail-fast says to stop
    fn record(&self, results: &mut Vec<CheckResult>, result: CheckResult) -> bool {
        tracing::info!(
            "Check '{}' {} in {:?}",
            result.name,
            result.status,
            result.duration
        );
        let stop = self.fail_fast && result.status.is_failure();
        if stop {
            tracing::info!("Stopping after '{}' (fail-fast)", result.name);
        }
        results.push(result);
        stop
    }
}

//! Configuration management for gatecheck
//!
//! This module holds the typed configuration the orchestrator runs from:
//! the hook list, the check table, exclusion rules, reporting and
//! notification settings. Loading and layering of configuration files lives
//! in [`core`]; everything here is plain data that callers may also build
//! in memory.

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub mod core;

use crate::filter::PathFilter;

/// Main configuration structure for gatecheck
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Check names in execution order
    pub hooks: Vec<String>,

    /// Check definitions keyed by name
    pub checks: BTreeMap<String, CheckDefinition>,

    /// Global exclusion rules
    pub exclusions: ExclusionRules,

    /// Report rendering and run policy
    pub reporting: ReportingConfig,

    /// Banner texts printed after the summary
    pub notifications: NotificationConfig,

    /// Command timeouts and scheduling
    pub execution: ExecutionConfig,
}

/// The execution strategy of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Launch an external command and judge it by its exit code
    Command,
    /// Scan file contents for forbidden substrings or regular expressions
    PatternScan,
    /// Compare a supplied coverage percentage against a threshold
    Coverage,
    /// Verify that asset references point at existing files
    #[serde(alias = "reference")]
    ReferenceValidation,
}

impl CheckKind {
    /// Whether checks of this kind never consume another check's output and
    /// may therefore run alongside other independent checks.
    pub fn runs_independently(self) -> bool {
        matches!(self, CheckKind::PatternScan | CheckKind::ReferenceValidation)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::Command => "command",
            CheckKind::PatternScan => "pattern_scan",
            CheckKind::Coverage => "coverage",
            CheckKind::ReferenceValidation => "reference_validation",
        };
        f.write_str(name)
    }
}

/// A named check: its kind, whether it is enabled and its kind-specific
/// parameters.
///
/// In configuration files the parameters sit next to `kind` and `enabled`:
///
/// ```toml
/// [checks.style_check]
/// kind = "command"
/// command = "cargo fmt --all -- --check"
/// timeout = 60
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    /// Check name, taken from its key in the check table
    #[serde(skip)]
    pub name: String,

    pub kind: CheckKind,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Human readable summary shown in dry runs
    #[serde(default)]
    pub description: String,

    /// Extra exclusions merged with the global rules for this check only
    #[serde(default)]
    pub exclusions: ExclusionRules,

    /// When false the check sees every file, ignoring all exclusion rules
    #[serde(default = "default_respect_exclusions")]
    pub respect_exclusions: bool,

    /// Overrides whether the check may run concurrently with its neighbours
    #[serde(default)]
    pub parallel: Option<bool>,

    /// Kind-specific parameters
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_respect_exclusions() -> bool {
    true
}

impl CheckDefinition {
    /// Create an enabled check with no parameters
    pub fn new(name: impl Into<String>, kind: CheckKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            description: String::new(),
            exclusions: ExclusionRules::default(),
            respect_exclusions: true,
            parallel: None,
            parameters: Map::new(),
        }
    }

    /// Set a parameter
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set per-check exclusions
    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Decode the parameter table into a kind-specific parameter struct
    pub fn params<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.parameters.clone()))
            .with_context(|| format!("Invalid parameters for check '{}'", self.name))
    }

    /// Whether this check may join a concurrent batch
    pub fn runs_independently(&self) -> bool {
        self.parallel.unwrap_or_else(|| self.kind.runs_independently())
    }
}

/// Glob rules removing paths from consideration before a check runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionRules {
    /// Globs matched against the path and each of its ancestor directories
    pub ignore_paths: Vec<String>,

    /// Globs matched against the file name only
    pub ignore_files: Vec<String>,
}

impl ExclusionRules {
    pub fn new(ignore_paths: &[&str], ignore_files: &[&str]) -> Self {
        Self {
            ignore_paths: ignore_paths.iter().map(|p| p.to_string()).collect(),
            ignore_files: ignore_files.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ignore_paths.is_empty() && self.ignore_files.is_empty()
    }

    /// Union of both rule sets, keeping first-seen order
    pub fn merged(&self, other: &ExclusionRules) -> ExclusionRules {
        fn union(a: &[String], b: &[String]) -> Vec<String> {
            let mut out = a.to_vec();
            for pattern in b {
                if !out.contains(pattern) {
                    out.push(pattern.clone());
                }
            }
            out
        }

        ExclusionRules {
            ignore_paths: union(&self.ignore_paths, &other.ignore_paths),
            ignore_files: union(&self.ignore_files, &other.ignore_files),
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    pub format: ReportFormat,

    /// Print warnings attached to results
    pub show_warnings: bool,

    /// Print suggestions attached to results
    pub show_suggestions: bool,

    /// Stop at the first failing or errored check
    pub fail_fast: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            show_warnings: true,
            show_suggestions: true,
            fail_fast: false,
        }
    }
}

/// Banner texts shown after the summary line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub on_success: String,
    pub on_failure: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            on_success: "All checks passed, commit can proceed".to_string(),
            on_failure: "Commit blocked: fix the failing checks above".to_string(),
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Default command timeout in seconds
    pub timeout: u64,

    /// Run independent checks concurrently
    pub parallel: bool,

    /// Upper bound on concurrently running checks (0 = number of CPU cores)
    pub max_parallel: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: 300,
            parallel: false,
            max_parallel: 0,
        }
    }
}

impl GateConfig {
    /// Copy each check's table key into its `name`
    pub fn normalize(&mut self) {
        for (name, check) in self.checks.iter_mut() {
            check.name = name.clone();
        }
    }

    /// Hooks that do not resolve to an enabled check, in hook order
    pub fn unresolved_hooks(&self) -> Vec<&str> {
        self.hooks
            .iter()
            .filter(|hook| !self.checks.get(*hook).is_some_and(|c| c.enabled))
            .map(String::as_str)
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.execution.timeout == 0 {
            bail!("execution.timeout cannot be 0");
        }

        PathFilter::new(&self.exclusions).context("Invalid global exclusion rules")?;

        for (name, check) in &self.checks {
            if check.kind == CheckKind::Command
                && check.parameters.get("timeout").and_then(Value::as_u64) == Some(0)
            {
                bail!("check '{name}': timeout cannot be 0");
            }
            if !check.exclusions.is_empty() {
                PathFilter::new(&check.exclusions)
                    .with_context(|| format!("Invalid exclusion rules for check '{name}'"))?;
            }
        }

        Ok(())
    }
}

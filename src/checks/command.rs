//! Command checks
//!
//! Runs an external program (compiler, formatter, test runner) and maps its
//! exit status onto a check outcome:
//!
//! ```toml
//! [checks.style_check]
//! kind = "command"
//! command = "cargo fmt --all -- --check"
//! timeout = 60
//!
//! [checks.prettier]
//! kind = "command"
//! command = "npx"
//! args = ["prettier", "--check", "{files}"]
//! patterns = ["**/*.ts", "**/*.css"]
//! ```

use anyhow::{Result, bail};
use serde::Deserialize;
use std::time::Duration;

use super::{CheckContext, CheckOutcome};
use crate::config::CheckDefinition;
use crate::external::{CommandOutput, ExecError};
use crate::filter::FileSet;
use crate::shared::glob::{build_globset, matches_path_or_name};
use crate::shared::text::{capped, format_duration, meaningful_lines};

/// Argument replaced by the target file list
const FILES_PLACEHOLDER: &str = "{files}";

#[derive(Debug, Deserialize)]
struct CommandParams {
    /// Program, or a whole command line when `args` is absent
    command: String,

    #[serde(default)]
    args: Option<Vec<String>>,

    /// Seconds before the command is killed
    #[serde(default)]
    timeout: Option<u64>,

    /// Append the target files to the arguments
    #[serde(default)]
    pass_files: bool,

    /// Restrict target files to these globs
    #[serde(default)]
    patterns: Vec<String>,

    #[serde(default = "default_max_output_lines")]
    max_output_lines: usize,
}

fn default_max_output_lines() -> usize {
    50
}

impl CommandParams {
    /// Split into program and arguments
    fn invocation(&self) -> Result<(String, Vec<String>)> {
        match &self.args {
            Some(args) => {
                let program = self.command.trim();
                if program.is_empty() {
                    bail!("`command` cannot be empty");
                }
                Ok((program.to_string(), args.clone()))
            }
            None => {
                let mut words = self.command.split_whitespace().map(str::to_string);
                match words.next() {
                    Some(program) => Ok((program, words.collect())),
                    None => bail!("`command` cannot be empty"),
                }
            }
        }
    }
}

pub async fn run(check: &CheckDefinition, files: &FileSet, ctx: &CheckContext) -> Result<CheckOutcome> {
    let params: CommandParams = check.params()?;
    let (program, args) = params.invocation()?;

    let targets: Vec<String> = if params.patterns.is_empty() {
        files.iter().map(|path| path.display().to_string()).collect()
    } else {
        let globs = build_globset(&params.patterns)?;
        let matching: Vec<String> = files
            .iter()
            .filter(|path| matches_path_or_name(&globs, path))
            .map(|path| path.display().to_string())
            .collect();
        if matching.is_empty() {
            return Ok(CheckOutcome::skipped(format!(
                "no files match {}",
                params.patterns.join(", ")
            )));
        }
        matching
    };

    let args = expand_args(args, &targets, params.pass_files);
    let command_line = std::iter::once(program.as_str())
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    let timeout = match params.timeout {
        Some(0) => bail!("`timeout` cannot be 0"),
        Some(secs) => Duration::from_secs(secs),
        None => ctx.default_timeout,
    };

    match ctx.runner.execute(&program, &args, timeout).await {
        Ok(output) => Ok(evaluate(&command_line, output, params.max_output_lines)),
        Err(ExecError::Timeout { timeout, .. }) => Ok(CheckOutcome::fail(vec![format!(
            "`{command_line}` timed out after {}",
            format_duration(timeout)
        )])
        .with_suggestion(
            "raise this check's `timeout` or make the command faster",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Replace `{files}` with the target list, or append it when `pass_files` is set
fn expand_args(args: Vec<String>, targets: &[String], pass_files: bool) -> Vec<String> {
    let mut expanded = Vec::with_capacity(args.len() + targets.len());
    let mut substituted = false;
    for arg in args {
        if arg == FILES_PLACEHOLDER {
            expanded.extend(targets.iter().cloned());
            substituted = true;
        } else {
            expanded.push(arg);
        }
    }
    if pass_files && !substituted {
        expanded.extend(targets.iter().cloned());
    }
    expanded
}

fn evaluate(command_line: &str, output: CommandOutput, max_lines: usize) -> CheckOutcome {
    let stderr: Vec<String> = meaningful_lines(&output.stderr).map(str::to_string).collect();
    let stdout: Vec<String> = meaningful_lines(&output.stdout).map(str::to_string).collect();

    match output.exit_code {
        Some(0) => CheckOutcome::pass().with_warnings(capped(stderr, max_lines)),
        exit_code => {
            let headline = match exit_code {
                Some(code) => format!("`{command_line}` exited with code {code}"),
                None => format!("`{command_line}` was terminated by a signal"),
            };
            let mut messages = vec![headline];
            messages.extend(capped(stderr.into_iter().chain(stdout).collect(), max_lines));
            CheckOutcome::fail(messages)
                .with_suggestion(format!("run `{command_line}` locally to see the full output"))
        }
    }
}

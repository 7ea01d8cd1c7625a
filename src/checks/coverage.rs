//! Coverage threshold checks
//!
//! The coverage figure is produced elsewhere (a test run, a CI artifact) and
//! handed over either inline as `coverage` or as a `coverage_file` holding a
//! bare percentage or a JSON document.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::CheckOutcome;
use crate::config::CheckDefinition;
use crate::external::FileSystem;

#[derive(Debug, Deserialize)]
struct CoverageParams {
    minimum_coverage: Option<f64>,

    #[serde(default)]
    coverage: Option<f64>,

    #[serde(default)]
    coverage_file: Option<PathBuf>,

    #[serde(default = "default_json_pointer")]
    json_pointer: String,
}

fn default_json_pointer() -> String {
    "/coverage".to_string()
}

pub fn run(check: &CheckDefinition, fs: &dyn FileSystem) -> Result<CheckOutcome> {
    let params: CoverageParams = check.params()?;

    let Some(minimum) = params.minimum_coverage else {
        bail!("`minimum_coverage` is required");
    };
    let minimum = percentage(minimum).context("Invalid `minimum_coverage`")?;

    let actual = match (params.coverage, &params.coverage_file) {
        (Some(value), _) => value,
        (None, Some(path)) => read_artifact(fs, path, &params.json_pointer)?,
        (None, None) => bail!("no coverage data: set `coverage` or `coverage_file`"),
    };
    let actual = percentage(actual).context("Invalid coverage value")?;

    tracing::debug!("Coverage {}% against minimum {}%", actual, minimum);

    if actual < minimum {
        let gap = ((minimum - actual) * 100.0).round() / 100.0;
        return Ok(CheckOutcome::fail(vec![format!(
            "coverage {actual}% is below the minimum of {minimum}% (gap: {gap} points)"
        )])
        .with_suggestion("add tests for uncovered code paths"));
    }
    Ok(CheckOutcome::pass())
}

fn percentage(value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        bail!("{value} is not a percentage between 0 and 100");
    }
    Ok(value)
}

/// Read a coverage figure from a plain `87.5` / `87.5%` file or a JSON document
fn read_artifact(fs: &dyn FileSystem, path: &Path, pointer: &str) -> Result<f64> {
    let bytes = fs
        .read_file(path)
        .with_context(|| format!("Failed to read coverage file {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let trimmed = text.trim();

    if let Ok(value) = trimmed.trim_end_matches('%').trim().parse::<f64>() {
        return Ok(value);
    }

    let document: serde_json::Value = serde_json::from_str(trimmed)
        .with_context(|| format!("Failed to parse coverage file {}", path.display()))?;
    let node = document.pointer(pointer).with_context(|| {
        format!("{} has no value at {}", path.display(), pointer)
    })?;

    match node {
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("{} at {} is not a number", path.display(), pointer)),
        serde_json::Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .with_context(|| format!("{} at {} is not a number", path.display(), pointer)),
        other => bail!("{} at {} is not a number: {}", path.display(), pointer, other),
    }
}

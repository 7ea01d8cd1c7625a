//! Asset reference validation
//!
//! Finds references such as `"assets/sprites/hero.png"` in the target files
//! and verifies each one names an existing asset with an allowed format,
//! inside the asset directory.

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use super::CheckOutcome;
use crate::config::CheckDefinition;
use crate::external::FileSystem;
use crate::filter::FileSet;
use crate::shared::text::is_binary;

#[derive(Debug, Deserialize)]
struct ReferenceParams {
    asset_dir: PathBuf,

    /// Allowed extensions, with or without a leading dot
    formats: Vec<String>,

    /// Regex whose first capture group is the path relative to `asset_dir`
    #[serde(default)]
    reference_pattern: Option<String>,
}

impl ReferenceParams {
    fn formats(&self) -> Result<Vec<String>> {
        let formats: Vec<String> = self
            .formats
            .iter()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        if formats.is_empty() {
            bail!("`formats` must list at least one extension");
        }
        Ok(formats)
    }

    fn pattern(&self) -> Result<Regex> {
        let source = match &self.reference_pattern {
            Some(pattern) => pattern.clone(),
            None => {
                let dir = self.asset_dir.to_string_lossy();
                format!(
                    r#"["']{}/([^"'\s]+)["']"#,
                    regex::escape(dir.trim_end_matches('/'))
                )
            }
        };
        let regex =
            Regex::new(&source).with_context(|| format!("Invalid reference pattern: {source}"))?;
        if regex.captures_len() < 2 {
            bail!("reference pattern needs a capture group: {source}");
        }
        Ok(regex)
    }
}

/// Why a single reference is invalid
enum Problem {
    EscapesAssetDir,
    UnsupportedFormat,
    Missing,
}

struct Validator<'a> {
    asset_dir: &'a Path,
    formats: &'a [String],
    assets: &'a FileSet,
}

impl Validator<'_> {
    fn check(&self, reference: &str) -> Option<Problem> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Some(Problem::EscapesAssetDir);
        }

        let extension = relative
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if !extension.is_some_and(|ext| self.formats.contains(&ext)) {
            return Some(Problem::UnsupportedFormat);
        }

        let full = self.asset_dir.join(relative);
        let normalized: PathBuf = full
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        if !self.assets.contains(&normalized) {
            return Some(Problem::Missing);
        }
        None
    }

    fn describe(&self, problem: Problem, reference: &str) -> String {
        match problem {
            Problem::EscapesAssetDir => {
                format!("'{reference}' escapes the asset directory {}", self.asset_dir.display())
            }
            Problem::UnsupportedFormat => format!(
                "'{reference}' has an unsupported format (allowed: {})",
                self.formats.join(", ")
            ),
            Problem::Missing => format!(
                "'{reference}' does not exist in {}",
                self.asset_dir.display()
            ),
        }
    }
}

pub fn run(check: &CheckDefinition, files: &FileSet, fs: &dyn FileSystem) -> Result<CheckOutcome> {
    let params: ReferenceParams = check.params()?;
    let formats = params.formats()?;
    let pattern = params.pattern()?;

    // Generated assets are often gitignored but still exist
    let assets = fs
        .list_all_files(&params.asset_dir)
        .with_context(|| format!("Failed to list assets in {}", params.asset_dir.display()))?;
    tracing::debug!("Found {} assets in {}", assets.len(), params.asset_dir.display());

    let validator = Validator {
        asset_dir: &params.asset_dir,
        formats: &formats,
        assets: &assets,
    };

    let mut invalid = Vec::new();
    let mut references = 0usize;
    for path in files {
        let content = fs
            .read_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if is_binary(&content) {
            continue;
        }
        let text = String::from_utf8_lossy(&content);
        for (index, line) in text.lines().enumerate() {
            for captures in pattern.captures_iter(line) {
                let Some(reference) = captures.get(1) else {
                    continue;
                };
                references += 1;
                if let Some(problem) = validator.check(reference.as_str()) {
                    invalid.push(format!(
                        "{}:{}: {}",
                        path.display(),
                        index + 1,
                        validator.describe(problem, reference.as_str())
                    ));
                }
            }
        }
    }

    tracing::debug!("Validated {} references, {} invalid", references, invalid.len());

    if invalid.is_empty() {
        Ok(CheckOutcome::pass())
    } else {
        Ok(CheckOutcome::fail(invalid)
            .with_suggestion(format!("add the missing assets to {}", params.asset_dir.display())))
    }
}

//! Pattern scan checks
//!
//! Reads every target file and reports the first line matching any forbidden
//! pattern, e.g. hard-coded credentials. Lines carrying the ignore marker
//! (`gatecheck:ignore` unless configured otherwise) are never reported.

use anyhow::{Context, Result, bail};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::Path;

use super::CheckOutcome;
use crate::config::CheckDefinition;
use crate::external::FileSystem;
use crate::filter::FileSet;
use crate::shared::text::is_binary;

const DEFAULT_IGNORE_MARKER: &str = "gatecheck:ignore";

#[derive(Debug, Deserialize)]
struct PatternParams {
    #[serde(default)]
    patterns: Vec<String>,

    /// Matched literally
    #[serde(default)]
    substrings: Vec<String>,

    #[serde(default)]
    case_insensitive: bool,

    /// Empty disables the marker
    #[serde(default = "default_ignore_marker")]
    ignore_marker: String,
}

fn default_ignore_marker() -> String {
    DEFAULT_IGNORE_MARKER.to_string()
}

/// A compiled pattern and the text it is reported as
struct Matcher {
    label: String,
    regex: Regex,
}

impl PatternParams {
    fn matchers(&self) -> Result<Vec<Matcher>> {
        let sources = self
            .patterns
            .iter()
            .map(|p| (p.clone(), p.clone()))
            .chain(self.substrings.iter().map(|s| (s.clone(), regex::escape(s))));

        let mut matchers = Vec::new();
        for (label, source) in sources {
            let regex = RegexBuilder::new(&source)
                .case_insensitive(self.case_insensitive)
                .build()
                .with_context(|| format!("Invalid pattern: {label}"))?;
            matchers.push(Matcher { label, regex });
        }

        if matchers.is_empty() {
            bail!("no `patterns` or `substrings` configured");
        }
        Ok(matchers)
    }
}

/// First matching line of `text` as `(line number, pattern label)`
fn first_match<'a>(text: &str, matchers: &'a [Matcher], marker: &str) -> Option<(usize, &'a str)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| marker.is_empty() || !line.contains(marker))
        .find_map(|(index, line)| {
            matchers
                .iter()
                .find(|m| m.regex.is_match(line))
                .map(|m| (index + 1, m.label.as_str()))
        })
}

pub fn run(check: &CheckDefinition, files: &FileSet, fs: &dyn FileSystem) -> Result<CheckOutcome> {
    let params: PatternParams = check.params()?;
    let matchers = params.matchers()?;

    let mut findings = Vec::new();
    let mut read_errors = Vec::new();

    for path in files {
        match scan_file(path, fs, &matchers, &params.ignore_marker) {
            Ok(Some(finding)) => findings.push(finding),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Could not scan {}: {:#}", path.display(), e);
                read_errors.push(format!("{e:#}"));
            }
        }
    }

    tracing::debug!(
        "Scanned {} files for {} patterns: {} matches",
        files.len(),
        matchers.len(),
        findings.len()
    );

    if !read_errors.is_empty() {
        findings.extend(read_errors);
        return Ok(CheckOutcome::errored(findings));
    }
    if findings.is_empty() {
        return Ok(CheckOutcome::pass());
    }
    let suggestion = if params.ignore_marker.is_empty() {
        "remove the matched content".to_string()
    } else {
        format!(
            "remove the matched content, or mark an intentional line with `{}`",
            params.ignore_marker
        )
    };
    Ok(CheckOutcome::fail(findings).with_suggestion(suggestion))
}

fn scan_file(
    path: &Path,
    fs: &dyn FileSystem,
    matchers: &[Matcher],
    marker: &str,
) -> Result<Option<String>> {
    let content = fs
        .read_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if is_binary(&content) {
        return Ok(None);
    }
    let text = String::from_utf8_lossy(&content);
    Ok(first_match(&text, matchers, marker)
        .map(|(line, label)| format!("{}:{}: matched '{}'", path.display(), line, label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckKind;
    use crate::report::CheckStatus;
    use crate::testing::{MemoryFs, files};
    use serde_json::json;

    fn scan(patterns: serde_json::Value) -> CheckDefinition {
        CheckDefinition::new("security_scan", CheckKind::PatternScan).with_param("patterns", patterns)
    }

    fn config_file_with_key_on_line_12() -> String {
        let mut lines: Vec<String> = (1..=11).map(|i| format!("setting_{i} = {i}")).collect();
        lines.push("api_key = \"sk-live-1234\"".to_string());
        lines.push("timeout = 30".to_string());
        lines.join("\n")
    }

    #[test]
    fn test_reports_first_match_with_line_number() {
        let fs = MemoryFs::new()
            .with_file("config/app.toml", config_file_with_key_on_line_12())
            .with_file("src/lib.rs", "pub fn add(a: i32, b: i32) -> i32 { a + b }\n");
        let check = CheckDefinition::new("security_scan", CheckKind::PatternScan)
            .with_param("substrings", json!(["api_key"]));

        let outcome = run(&check, &fs.paths(), &fs).unwrap();

        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.messages, vec!["config/app.toml:12: matched 'api_key'"]);
        assert_eq!(outcome.suggestions.len(), 1);
    }

    #[test]
    fn test_only_first_match_per_file_but_every_file() {
        let fs = MemoryFs::new()
            .with_file("a.env", "TOKEN=abc\nSECRET=def\n")
            .with_file("b.env", "nothing\nSECRET=xyz\n");
        let check = scan(json!(["TOKEN=", "SECRET="]));

        let outcome = run(&check, &fs.paths(), &fs).unwrap();
        assert_eq!(
            outcome.messages,
            vec!["a.env:1: matched 'TOKEN='", "b.env:2: matched 'SECRET='"]
        );
    }

    #[test]
    fn test_clean_files_pass() {
        let fs = MemoryFs::new().with_file("src/main.rs", "fn main() {}\n");
        let outcome = run(&scan(json!(["password\\s*="])), &fs.paths(), &fs).unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_case_insensitive_and_literal_substrings() {
        let fs = MemoryFs::new().with_file("notes.txt", "the AWS_SECRET_ACCESS_KEY (example)\n");
        let check = CheckDefinition::new("scan", CheckKind::PatternScan)
            .with_param("substrings", json!(["aws_secret_access_key (example)"]))
            .with_param("case_insensitive", true);

        let outcome = run(&check, &fs.paths(), &fs).unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
    }

    #[test]
    fn test_ignore_marker_suppresses_line() {
        let fs = MemoryFs::new().with_file(
            "tests/fixtures.rs",
            "let key = \"api_key\"; // gatecheck:ignore\nlet other = 1;\n",
        );
        let check = scan(json!(["api_key"]));
        assert_eq!(run(&check, &fs.paths(), &fs).unwrap().status, CheckStatus::Pass);

        let check = scan(json!(["api_key"])).with_param("ignore_marker", "");
        assert_eq!(run(&check, &fs.paths(), &fs).unwrap().status, CheckStatus::Fail);
    }

    #[test]
    fn test_binary_files_are_skipped() {
        let fs = MemoryFs::new().with_file("logo.png", b"\x89PNG\0\0api_key");
        let outcome = run(&scan(json!(["api_key"])), &fs.paths(), &fs).unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
    }

    #[test]
    fn test_unreadable_file_errors_but_others_are_reported() {
        let fs = MemoryFs::new()
            .with_file("a.txt", "api_key here")
            .with_unreadable("b.txt")
            .with_file("c.txt", "fine");

        let outcome = run(&scan(json!(["api_key"])), &fs.paths(), &fs).unwrap();

        assert_eq!(outcome.status, CheckStatus::Errored);
        assert_eq!(outcome.messages[0], "a.txt:1: matched 'api_key'");
        assert!(outcome.messages[1].starts_with("Failed to read b.txt"));
        assert_eq!(fs.reads().len(), 3);
    }

    #[test]
    fn test_missing_or_invalid_patterns_are_errors() {
        let fs = MemoryFs::new().with_file("a.txt", "x");
        let empty = CheckDefinition::new("scan", CheckKind::PatternScan);
        assert!(run(&empty, &fs.paths(), &fs).is_err());

        let err = run(&scan(json!(["(unclosed"])), &fs.paths(), &fs).unwrap_err();
        assert!(err.to_string().contains("Invalid pattern: (unclosed"));
    }

    #[test]
    fn test_more_files_never_mean_fewer_findings() {
        let fs = MemoryFs::new()
            .with_file("a.rs", "let secret = 1;")
            .with_file("b.rs", "clean")
            .with_file("c.rs", "secret again")
            .with_file("d.rs", "also clean");
        let check = scan(json!(["secret"]));

        let subset = files(&["a.rs", "b.rs"]);
        let superset = fs.paths();
        let few = run(&check, &subset, &fs).unwrap().messages;
        let many = run(&check, &superset, &fs).unwrap().messages;

        assert!(few.iter().all(|finding| many.contains(finding)));
        assert!(many.len() >= few.len());
    }

    #[test]
    fn test_empty_file_set_passes() {
        let fs = MemoryFs::new();
        let outcome = run(&scan(json!(["secret"])), &FileSet::new(), &fs).unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
    }
}

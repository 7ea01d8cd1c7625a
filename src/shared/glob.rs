//! Glob pattern utilities
//!
//! This module provides the glob compilation shared by exclusion rules and
//! command checks that only target some files.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Create a GlobSet from a list of patterns for efficient batch matching.
///
/// `*` never crosses a `/`, `**` does. Matching is case-sensitive.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(&normalize_pattern(pattern))
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }

    builder
        .build()
        .with_context(|| "Failed to build glob set")
}

/// Turn ignore-style spellings into plain globs: `./target/` becomes `target`
pub fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        pattern.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether a path matches by full path or by file name
pub fn matches_path_or_name(set: &GlobSet, path: &Path) -> bool {
    set.is_match(path) || path.file_name().is_some_and(|name| set.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> GlobSet {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        build_globset(&patterns).unwrap()
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("target/"), "target");
        assert_eq!(normalize_pattern("./build/**"), "build/**");
        assert_eq!(normalize_pattern("  *.rs "), "*.rs");
        assert_eq!(normalize_pattern("/"), "/");
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let globs = set(&["src/*.rs"]);
        assert!(globs.is_match("src/main.rs"));
        assert!(!globs.is_match("src/cli/mod.rs"));
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let globs = set(&["src/**/*.rs"]);
        assert!(globs.is_match("src/main.rs"));
        assert!(globs.is_match("src/cli/commands/run.rs"));
        assert!(!globs.is_match("tests/cli.rs"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let globs = set(&["*.md"]);
        assert!(globs.is_match("README.md"));
        assert!(!globs.is_match("README.MD"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = build_globset(&["src/[oops".to_string()]).unwrap_err();
        assert!(err.to_string().contains("src/[oops"));
    }

    #[test]
    fn test_matches_path_or_name() {
        let globs = set(&["*.rs"]);
        assert!(matches_path_or_name(&globs, Path::new("src/deep/lib.rs")));
        assert!(!matches_path_or_name(&globs, Path::new("src/deep/lib.py")));
    }
}

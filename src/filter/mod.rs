//! Exclusion filtering
//!
//! [`PathFilter`] removes files matched by an [`ExclusionRules`] set before a
//! check sees them. `ignore_paths` globs are tested against the path and each
//! of its ancestor directories, so `target`, `target/` and `target/**` all
//! drop `target/debug/app`. `ignore_files` globs are tested against the file
//! name alone.

use anyhow::Result;
use globset::GlobSet;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::ExclusionRules;
use crate::shared::glob::build_globset;

/// A set of file paths, ordered so that reports are deterministic
pub type FileSet = BTreeSet<PathBuf>;

/// Compiled exclusion rules
#[derive(Debug, Clone)]
pub struct PathFilter {
    ignore_paths: GlobSet,
    ignore_files: GlobSet,
}

impl PathFilter {
    /// Compile a filter; fails on an invalid glob
    pub fn new(rules: &ExclusionRules) -> Result<Self> {
        Ok(Self {
            ignore_paths: build_globset(&rules.ignore_paths)?,
            ignore_files: build_globset(&rules.ignore_files)?,
        })
    }

    /// A filter that keeps everything
    pub fn allow_all() -> Self {
        Self {
            ignore_paths: GlobSet::empty(),
            ignore_files: GlobSet::empty(),
        }
    }

    /// Whether `path` is removed by these rules
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.strip_prefix("./").unwrap_or(path);

        if let Some(name) = path.file_name() {
            if self.ignore_files.is_match(name) {
                return true;
            }
        }

        path.ancestors()
            .filter(|candidate| !candidate.as_os_str().is_empty())
            .any(|candidate| self.ignore_paths.is_match(candidate))
    }

    /// Keep the files not excluded by these rules
    pub fn filter(&self, files: &FileSet) -> FileSet {
        files
            .iter()
            .filter(|path| {
                let excluded = self.is_excluded(path);
                if excluded {
                    tracing::trace!("Excluded {}", path.display());
                }
                !excluded
            })
            .cloned()
            .collect()
    }
}

/// Compile `rules` and apply them to `files`
pub fn filter(files: &FileSet, rules: &ExclusionRules) -> Result<FileSet> {
    Ok(PathFilter::new(rules)?.filter(files))
}

//! # gatecheck - configuration-driven pre-commit verification
//!
//! gatecheck reads a declarative set of named checks, runs them in hook order
//! against a set of files and produces one report whose verdict decides
//! whether a commit may proceed.
//!
//! ## Features
//!
//! - **Four check kinds**: external commands (compile, style, tests), pattern
//!   scans for leaked secrets, coverage thresholds and asset reference validation
//! - **Exclusion rules**: glob-based ignore paths and ignore files, global and per check
//! - **Fail-fast or continue**: a runtime policy, not a compile-time choice
//! - **Deterministic reports**: results always follow hook order, even when
//!   independent checks run concurrently
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the hooks listed in gatecheck.toml against every file in the tree
//! gatecheck
//!
//! # Only check the given files and stop at the first failure
//! gatecheck --fail-fast src/main.rs src/lib.rs
//!
//! # Show how each hook resolves without running anything
//! gatecheck --dry-run
//! ```
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatecheck::{GateConfig, Orchestrator};
//! use gatecheck::external::{FileSystem, LocalFs, ProcessRunner};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GateConfig::load(None)?;
//! let root = std::env::current_dir()?;
//! let fs = Arc::new(LocalFs::new(&root));
//! let files = fs.list_files(std::path::Path::new("."))?;
//!
//! let orchestrator = Orchestrator::from_config(&config, Arc::new(ProcessRunner::new(&root)), fs);
//! let report = orchestrator.run(&config.hooks, &files).await;
//! std::process::exit(report.exit_code());
//! # }
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod external;
pub mod filter;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod shared;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::{Cli, Output};
pub use config::{CheckDefinition, CheckKind, ExclusionRules, GateConfig};
pub use filter::{FileSet, PathFilter};
pub use orchestrator::{Orchestrator, Schedule};
pub use registry::CheckRegistry;
pub use report::{CheckResult, CheckStatus, Overall, Report, Reporter};

/// Result type alias for gatecheck operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

//! Command-line interface for gatecheck
//!
//! One command: load the layered configuration, collect the files to check,
//! run the configured hooks and exit with the report's status.

use anyhow::{Context, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

mod output;

pub use output::Output;

use crate::config::{GateConfig, ReportFormat};
use crate::external::{FileSystem, LocalFs, ProcessRunner};
use crate::filter::FileSet;
use crate::orchestrator::Orchestrator;
use crate::report::Reporter;

#[derive(Parser, Debug)]
#[command(
    name = "gatecheck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Configuration-driven pre-commit verification pipeline",
    long_about = "Configuration-driven pre-commit verification pipeline.\n\n\
                  gatecheck runs the hooks listed in its configuration (compile, style, \
                  secret scanning, coverage and asset checks) against a set of files and \
                  exits non-zero when any of them fails."
)]
pub struct Cli {
    /// Files to check (default: every file under the working directory)
    pub files: Vec<PathBuf>,

    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory")]
    pub directory: Option<PathBuf>,

    /// Use this configuration file instead of the user and repository files
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Stop at the first failing check
    #[arg(long)]
    pub fail_fast: bool,

    /// Show how each hook resolves without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Run independent checks concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Treat hooks naming undefined or disabled checks as a configuration error
    #[arg(long)]
    pub strict: bool,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Why a run ended without a report
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0:#}")]
    Config(anyhow::Error),

    #[error("{0:#}")]
    Runtime(anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 2,
            CliError::Runtime(_) => 1,
        }
    }
}

impl Cli {
    pub async fn run(self) -> ExitCode {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        match self.execute(&output).await {
            Ok(code) => ExitCode::from(code),
            Err(e) => {
                output.error(&e.to_string());
                ExitCode::from(e.exit_code())
            }
        }
    }

    async fn execute(&self, output: &Output) -> Result<u8, CliError> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Failed to change directory to {}", dir.display()))
                .map_err(CliError::Runtime)?;
        }
        let root = std::env::current_dir()
            .context("Failed to determine working directory")
            .map_err(CliError::Runtime)?;

        let config = self.load_config().map_err(CliError::Config)?;
        if config.hooks.is_empty() {
            output.warning("No hooks configured, nothing to check");
        }

        let fs = Arc::new(LocalFs::new(&root));
        let files = self
            .collect_files(fs.as_ref(), &root)
            .map_err(CliError::Runtime)?;
        output.verbose(&format!(
            "{} hooks, {} files in {}",
            config.hooks.len(),
            files.len(),
            root.display()
        ));

        let orchestrator =
            Orchestrator::from_config(&config, Arc::new(ProcessRunner::new(&root)), fs);

        if self.dry_run {
            output.plan(&orchestrator.plan(&config.hooks, &files), files.len());
            return Ok(0);
        }

        let report = orchestrator.run(&config.hooks, &files).await;
        let rendered = Reporter::new(config.reporting.clone(), config.notifications.clone())
            .render(&report)
            .map_err(CliError::Runtime)?;

        print!("{}", rendered.text);
        Ok(u8::try_from(rendered.exit_code).unwrap_or(1))
    }

    /// Load, apply command-line overrides and validate
    fn load_config(&self) -> anyhow::Result<GateConfig> {
        let mut config = GateConfig::load(self.config.as_deref())?;

        if self.fail_fast {
            config.reporting.fail_fast = true;
        }
        if self.parallel {
            config.execution.parallel = true;
        }
        if let Some(format) = self.format {
            config.reporting.format = format;
        }

        config.validate()?;

        if self.strict {
            let unresolved = config.unresolved_hooks();
            if !unresolved.is_empty() {
                return Err(anyhow!(
                    "Hooks without an enabled check: {}",
                    unresolved.join(", ")
                ));
            }
        }

        Ok(config)
    }

    /// Explicit files become relative to `root`, so exclusions match them
    fn collect_files(&self, fs: &dyn FileSystem, root: &Path) -> anyhow::Result<FileSet> {
        if self.files.is_empty() {
            return fs
                .list_files(Path::new("."))
                .context("Failed to list files in working directory");
        }
        Ok(self
            .files
            .iter()
            .map(|path| {
                path.strip_prefix(root)
                    .or_else(|_| path.strip_prefix("./"))
                    .unwrap_or(path)
                    .to_path_buf()
            })
            .collect())
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // Keep ignore/globset quiet unless everything is requested
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_long_help_describes_the_tool() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("pre-commit verification pipeline"));
        assert!(help.contains("--strict"));
    }

    #[test]
    fn test_parses_flags_and_files() {
        let cli = Cli::try_parse_from([
            "gatecheck",
            "-vv",
            "--fail-fast",
            "--format",
            "json",
            "-C",
            "repo",
            "src/lib.rs",
            "./src/main.rs",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(cli.fail_fast);
        assert!(!cli.dry_run);
        assert_eq!(cli.format, Some(ReportFormat::Json));
        assert_eq!(cli.directory, Some(PathBuf::from("repo")));
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn test_explicit_files_are_normalized() {
        let cli = Cli::try_parse_from(["gatecheck", "./src/main.rs", "README.md"]).unwrap();
        let fs = LocalFs::new(Path::new("."));

        let files = cli.collect_files(&fs, Path::new("/work/repo")).unwrap();
        let expected: FileSet = [PathBuf::from("README.md"), PathBuf::from("src/main.rs")]
            .into_iter()
            .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_absolute_files_are_made_relative_to_root() {
        let root = std::env::temp_dir().join("gatecheck-repo");
        let inside = root.join("target").join("debug").join("x.rs");
        let cli = Cli::try_parse_from([
            "gatecheck".into(),
            inside.into_os_string(),
            "/elsewhere/notes.md".into(),
        ])
        .unwrap();
        let fs = LocalFs::new(&root);

        let files = cli.collect_files(&fs, &root).unwrap();
        let expected: FileSet = ["target/debug/x.rs", "/elsewhere/notes.md"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(files, expected);

        // Now relative, the path is caught by the default `target` exclusion
        let rules = crate::config::ExclusionRules {
            ignore_paths: vec!["target".to_string()],
            ..Default::default()
        };
        let kept = crate::filter::filter(&files, &rules).unwrap();
        assert!(!kept.contains(Path::new("target/debug/x.rs")));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config(anyhow!("bad")).exit_code(), 2);
        assert_eq!(CliError::Runtime(anyhow!("bad")).exit_code(), 1);
    }
}

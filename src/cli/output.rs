//! Styled terminal messages for the CLI
//!
//! The report itself is rendered by [`crate::report::Reporter`]; this covers
//! everything around it.

use console::style;

use crate::orchestrator::{HookPlan, PlannedAction};

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a dry-run plan, one line per hook
    pub fn plan(&self, plan: &[HookPlan], file_count: usize) {
        println!(
            "{} {} {}",
            style("Dry run:").bold().underlined(),
            style(format!("{} hooks", plan.len())).bold(),
            style(format!("({file_count} files)")).dim()
        );

        for entry in plan {
            match &entry.action {
                PlannedAction::Run {
                    kind,
                    description,
                    files,
                } => {
                    let detail = if description.is_empty() {
                        String::new()
                    } else {
                        format!(" - {description}")
                    };
                    println!(
                        "  {} {} {}{}",
                        style("❯").cyan(),
                        style(&entry.name).bold(),
                        style(format!("({kind}, {files} files)")).dim(),
                        detail
                    );
                }
                PlannedAction::Skip { reason } => {
                    println!(
                        "  {} {} {}",
                        style("○").yellow(),
                        style(&entry.name).bold(),
                        style(format!("skipped: {reason}")).yellow()
                    );
                }
                PlannedAction::Invalid { reason } => {
                    println!(
                        "  {} {} {}",
                        style("✖").red(),
                        style(&entry.name).bold(),
                        style(format!("invalid: {reason}")).red()
                    );
                }
            }
        }
    }
}

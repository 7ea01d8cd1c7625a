//! Report rendering: styled text, JSON or YAML

use anyhow::{Context, Result};
use console::Style;

use super::{CheckResult, CheckStatus, Report};
use crate::config::{NotificationConfig, ReportFormat, ReportingConfig};
use crate::shared::text::format_duration;

/// A rendered report and the exit status that goes with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub exit_code: i32,
}

/// Turns a [`Report`] into output according to the reporting settings
#[derive(Debug, Clone)]
pub struct Reporter {
    reporting: ReportingConfig,
    notifications: NotificationConfig,
    color: bool,
}

impl Reporter {
    pub fn new(reporting: ReportingConfig, notifications: NotificationConfig) -> Self {
        Self {
            reporting,
            notifications,
            color: console::colors_enabled(),
        }
    }

    /// Force styling on or off regardless of the terminal
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn render(&self, report: &Report) -> Result<Rendered> {
        let text = match self.reporting.format {
            ReportFormat::Text => self.render_text(report),
            ReportFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize report as JSON")?
            }
            ReportFormat::Yaml => {
                serde_yml::to_string(report).context("Failed to serialize report as YAML")?
            }
        };
        Ok(Rendered {
            text,
            exit_code: report.exit_code(),
        })
    }

    fn style(&self, style: Style) -> Style {
        style.force_styling(self.color)
    }

    fn render_text(&self, report: &Report) -> String {
        let mut lines = Vec::new();

        for result in &report.results {
            self.render_result(result, &mut lines);
        }

        lines.push(self.style(Style::new().dim()).apply_to("─".repeat(50)).to_string());
        lines.push(format!(
            "{} passed, {} failed, {} skipped, {} errored in {}",
            report.count(CheckStatus::Pass),
            report.count(CheckStatus::Fail),
            report.count(CheckStatus::Skipped),
            report.count(CheckStatus::Errored),
            format_duration(report.total_duration())
        ));

        let banner = if report.is_success() {
            self.style(Style::new().green().bold())
                .apply_to(&self.notifications.on_success)
        } else {
            self.style(Style::new().red().bold())
                .apply_to(&self.notifications.on_failure)
        };
        if !banner.to_string().is_empty() {
            lines.push(banner.to_string());
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn render_result(&self, result: &CheckResult, lines: &mut Vec<String>) {
        let (icon, style) = match result.status {
            CheckStatus::Pass => ("✔", Style::new().green()),
            CheckStatus::Fail => ("✖", Style::new().red()),
            CheckStatus::Skipped => ("○", Style::new().yellow()),
            CheckStatus::Errored => ("!", Style::new().red().bold()),
        };
        let style = self.style(style);
        let dim = self.style(Style::new().dim());

        lines.push(format!(
            "{} {} {} {}",
            style.apply_to(icon),
            self.style(Style::new().bold()).apply_to(&result.name),
            style.apply_to(result.status.label()),
            dim.apply_to(format!("({})", format_duration(result.duration)))
        ));

        for message in &result.messages {
            lines.push(format!("    {message}"));
        }
        if self.reporting.show_warnings {
            let warn = self.style(Style::new().yellow());
            for warning in &result.warnings {
                lines.push(format!("    {} {}", warn.apply_to("⚠"), warning));
            }
        }
        if self.reporting.show_suggestions {
            let hint = self.style(Style::new().cyan());
            for suggestion in &result.suggestions {
                lines.push(format!("    {} {}", hint.apply_to("→"), suggestion));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn result(name: &str, status: CheckStatus, messages: &[&str]) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            status,
            messages: messages.iter().map(|m| m.to_string()).collect(),
            warnings: vec!["unused import".to_string()],
            suggestions: vec!["run it locally".to_string()],
            duration: Duration::from_millis(120),
        }
    }

    fn notifications() -> NotificationConfig {
        NotificationConfig {
            on_success: "Ship it".to_string(),
            on_failure: "Blocked".to_string(),
        }
    }

    fn reporter(format: ReportFormat, show: bool) -> Reporter {
        let reporting = ReportingConfig {
            format,
            show_warnings: show,
            show_suggestions: show,
            fail_fast: false,
        };
        Reporter::new(reporting, notifications()).with_color(false)
    }

    fn report(results: Vec<CheckResult>) -> Report {
        let now = Utc::now();
        Report::new(results, now, now)
    }

    #[test]
    fn test_text_lists_every_result_in_order() {
        let report = report(vec![
            result("compile_check", CheckStatus::Pass, &[]),
            result("security_scan", CheckStatus::Fail, &["src/a.rs:3: matched 'api_key'"]),
            result("ghost", CheckStatus::Skipped, &["check 'ghost' is not defined"]),
        ]);

        let rendered = reporter(ReportFormat::Text, true).render(&report).unwrap();
        let text = rendered.text;

        assert_eq!(rendered.exit_code, 1);
        let compile = text.find("✔ compile_check passed (120ms)").unwrap();
        let scan = text.find("✖ security_scan failed").unwrap();
        let ghost = text.find("○ ghost skipped").unwrap();
        assert!(compile < scan && scan < ghost);
        assert!(text.contains("    src/a.rs:3: matched 'api_key'"));
        assert!(text.contains("⚠ unused import"));
        assert!(text.contains("→ run it locally"));
        assert!(text.contains("1 passed, 1 failed, 1 skipped, 0 errored in 0ms"));
        assert!(text.trim_end().ends_with("Blocked"));
    }

    #[test]
    fn test_warnings_and_suggestions_can_be_hidden() {
        let report = report(vec![result("lint", CheckStatus::Pass, &[])]);
        let rendered = reporter(ReportFormat::Text, false).render(&report).unwrap();

        assert_eq!(rendered.exit_code, 0);
        assert!(!rendered.text.contains("unused import"));
        assert!(!rendered.text.contains("run it locally"));
        assert!(rendered.text.trim_end().ends_with("Ship it"));
    }

    #[test]
    fn test_json_output() {
        let report = report(vec![result("lint", CheckStatus::Errored, &["boom"])]);
        let rendered = reporter(ReportFormat::Json, true).render(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&rendered.text).unwrap();
        assert_eq!(value["overall"], "failure");
        assert_eq!(value["results"][0]["name"], "lint");
        assert_eq!(value["results"][0]["status"], "errored");
        assert_eq!(rendered.exit_code, 1);
    }

    #[test]
    fn test_yaml_output() {
        let report = report(vec![result("lint", CheckStatus::Pass, &[])]);
        let rendered = reporter(ReportFormat::Yaml, true).render(&report).unwrap();
        assert!(rendered.text.contains("overall: success"));
        assert!(rendered.text.contains("name: lint"));
    }

    #[test]
    fn test_empty_banner_is_omitted() {
        let reporting = ReportingConfig {
            format: ReportFormat::Text,
            show_warnings: true,
            show_suggestions: true,
            fail_fast: false,
        };
        let quiet = NotificationConfig {
            on_success: String::new(),
            on_failure: String::new(),
        };
        let rendered = Reporter::new(reporting, quiet)
            .with_color(false)
            .render(&report(Vec::new()))
            .unwrap();
        assert!(rendered.text.trim_end().ends_with("0 errored in 0ms"));
    }
}

//! Terminal output

use console::{style, Term};
use smokeprobe::{ArtifactSet, ScenarioReport};

/// Writes status lines to stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn prefix(&self, symbol: &str, plain: &str, color: fn(&str) -> String) -> String {
        if self.use_color {
            color(symbol)
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "PASS", |s| style(s).green().bold().to_string());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = self.prefix("✗", "FAIL", |s| style(s).red().bold().to_string());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", |s| style(s).yellow().bold().to_string());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", |s| style(s).blue().bold().to_string());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Summarize a verified run
    pub fn verified(&self, report: &ScenarioReport) {
        self.success(&format!(
            "login smoke verified: {:?} ({} ms)",
            report.landmark_text, report.elapsed_ms
        ));
        for skipped in &report.skipped {
            self.info(skipped);
        }
    }

    /// List the files of an artifact set
    pub fn artifacts(&self, set: &ArtifactSet) {
        if set.is_empty() {
            self.warning("no failure artifacts could be written");
            return;
        }
        for path in set.paths() {
            // artifact paths go out even in quiet mode, next to the failure
            let _ = self.term.write_line(&format!("  artifact: {}", path.display()));
        }
    }
}

/// JSON body printed for a failed run
#[derive(Debug, serde::Serialize)]
pub struct FailureReport<'a> {
    /// Always `"failed"`
    pub status: &'static str,
    /// State the scenario stopped in
    pub state: String,
    /// Error chain rendered as text
    pub error: String,
    /// Files written for the failure
    pub artifacts: Option<&'a ArtifactSet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_reporter_default() {
        let reporter = Reporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
    }

    #[test]
    fn test_plain_prefix() {
        let reporter = Reporter::new(false, false);
        assert_eq!(reporter.prefix("✓", "PASS", |s| s.to_string()), "PASS");
        let colored = Reporter::new(true, false);
        assert_eq!(colored.prefix("✓", "PASS", |s| format!("<{s}>")), "<✓>");
    }

    #[test]
    fn test_failure_report_serializes() {
        let set = ArtifactSet {
            timestamp: 1_700_000_000,
            screenshot: Some(PathBuf::from("artifacts/fail_1700000000.png")),
            markup: None,
            context: None,
        };
        let report = FailureReport {
            status: "failed",
            state: "authenticating".to_string(),
            error: "boom".to_string(),
            artifacts: Some(&set),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["artifacts"]["timestamp"], 1_700_000_000);
    }
}

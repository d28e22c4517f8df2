//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8Path;
use serde::Serialize;
use source_map::LineIndex;
use style_extractor::{Severity, Warning};

/// A formatted warning for JSON output.
#[derive(Debug, Serialize)]
pub struct FormattedWarning {
    /// The warning type (Error or Warning).
    #[serde(rename = "type")]
    pub warning_type: String,
    /// The original source file.
    pub filename: String,
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// The message.
    pub message: String,
    /// The lint rule that reported it.
    pub rule: String,
}

/// Formats mapped warnings for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the warnings of one file.
    ///
    /// `source` is the original file text, used for snippets when available.
    /// JSON output is produced by [`Formatter::format_json_warnings`] instead,
    /// so all files end up in one array.
    pub fn format(&self, warnings: &[Warning], file_path: &Utf8Path, source: Option<&str>) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(warnings, file_path),
            OutputFormat::HumanVerbose => self.format_human_verbose(warnings, file_path, source),
            OutputFormat::Json => {
                let formatted = Self::format_json_warnings(warnings, file_path);
                serde_json::to_string_pretty(&formatted).unwrap_or_default()
            }
            OutputFormat::Machine => self.format_machine(warnings, file_path),
        }
    }

    /// Formats as human-readable output.
    fn format_human(&self, warnings: &[Warning], file_path: &Utf8Path) -> String {
        let mut output = String::new();

        for warning in warnings {
            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n\n",
                file_path,
                warning.line,
                warning.column,
                severity_label(warning.severity()),
                message(warning),
                warning.rule().unwrap_or("unknown")
            ));
        }

        output
    }

    /// Formats as human-readable output with code snippets.
    fn format_human_verbose(
        &self,
        warnings: &[Warning],
        file_path: &Utf8Path,
        source: Option<&str>,
    ) -> String {
        let line_index = source.map(|source| (source, LineIndex::new(source)));
        let mut output = String::new();

        for warning in warnings {
            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n",
                file_path,
                warning.line,
                warning.column,
                severity_label(warning.severity()),
                message(warning),
                warning.rule().unwrap_or("unknown")
            ));

            // Add code snippet
            let line_text = line_index
                .as_ref()
                .and_then(|(source, index)| index.line_text(source, warning.line));
            if let Some(line_text) = line_text {
                let gutter = warning.line.to_string();
                output.push_str(&format!("  {} | {}\n", gutter, line_text));

                // Add pointer
                let padding = " ".repeat(warning.column.saturating_sub(1) as usize);
                output.push_str(&format!("  {} | {}^\n", " ".repeat(gutter.len()), padding));
            }

            output.push('\n');
        }

        output
    }

    /// Formats warnings into JSON-ready structs.
    pub fn format_json_warnings(warnings: &[Warning], file_path: &Utf8Path) -> Vec<FormattedWarning> {
        warnings
            .iter()
            .map(|warning| FormattedWarning {
                warning_type: severity_label(warning.severity()).to_string(),
                filename: file_path.to_string(),
                line: warning.line,
                column: warning.column,
                message: message(warning).to_string(),
                rule: warning.rule().unwrap_or("unknown").to_string(),
            })
            .collect()
    }

    /// Formats as machine-readable output.
    fn format_machine(&self, warnings: &[Warning], file_path: &Utf8Path) -> String {
        let mut output = String::new();

        for warning in warnings {
            let severity = match warning.severity() {
                Severity::Error => "ERROR",
                Severity::Warning => "WARNING",
            };

            output.push_str(&format!(
                "{} {}:{}:{} {} ({})\n",
                severity,
                file_path,
                warning.line,
                warning.column,
                message(warning),
                warning.rule().unwrap_or("unknown")
            ));
        }

        output
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    }
}

fn message(warning: &Warning) -> &str {
    warning.text().unwrap_or("")
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct CheckSummary {
    /// Number of files scanned.
    pub file_count: usize,
    /// Number of files with embedded styles.
    pub styled_file_count: usize,
    /// Number of files the style compiler failed on.
    pub failed_count: usize,
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Whether to fail on warnings.
    pub fail_on_warnings: bool,
}

impl CheckSummary {
    /// Returns true if the run should exit with an error.
    pub fn failed(&self) -> bool {
        self.error_count > 0 || (self.warning_count > 0 && self.fail_on_warnings)
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let error_word = if self.error_count == 1 {
            "error"
        } else {
            "errors"
        };
        let warning_word = if self.warning_count == 1 {
            "warning"
        } else {
            "warnings"
        };
        let file_word = if self.file_count == 1 {
            "file"
        } else {
            "files"
        };

        let mut summary = format!(
            "====================================\nstyled-lint-rs found {} {} and {} {} in {} {} ({} with styles)",
            self.error_count,
            error_word,
            self.warning_count,
            warning_word,
            self.file_count,
            file_word,
            self.styled_file_count
        );
        if self.failed_count > 0 {
            summary.push_str(&format!(
                "\n{} {} could not be compiled",
                self.failed_count,
                if self.failed_count == 1 { "file" } else { "files" }
            ));
        }
        summary
    }
}

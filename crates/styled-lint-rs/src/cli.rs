//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use style_extractor::RuleOrder;

/// Lint CSS-in-JS tagged templates with a CSS linter.
#[derive(Debug, Parser)]
#[command(name = "styled-lint-rs")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Working directory to scan
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Path to the config file (defaults to styled-lint.config.json in the workspace)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Output format for mapped lint results
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Minimum severity threshold
    #[arg(long, value_enum, default_value = "warning")]
    pub threshold: Threshold,

    /// Print the synthetic CSS of every file with embedded styles
    #[arg(long = "emit-css")]
    pub emit_css: bool,

    /// Write the synthetic CSS of every file to <DIR>/<relative path>.css
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Linter JSON results to map back onto the original sources
    #[arg(long)]
    pub results: Option<Utf8PathBuf>,

    /// Exit with error on warnings
    #[arg(long = "fail-on-warnings")]
    pub fail_on_warnings: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Path to the node binary used to run the style compiler
    #[arg(long)]
    pub node: Option<Utf8PathBuf>,

    /// Order in which rules are laid out in the synthetic CSS
    #[arg(long = "rule-order", value_enum)]
    pub rule_order: Option<RuleOrderArg>,

    /// Log debug output
    #[arg(long, short)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Human-readable with code snippets
    HumanVerbose,
    /// JSON output
    Json,
    /// Machine-readable (one line per warning)
    Machine,
}

/// Severity threshold.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum Threshold {
    /// Only show errors
    Error,
    /// Show errors and warnings (default)
    #[default]
    Warning,
}

/// Rule layout order.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RuleOrderArg {
    /// Sort rules by their position in the source
    Source,
    /// Keep the order the compiler reported
    Compiler,
}

impl From<RuleOrderArg> for RuleOrder {
    fn from(arg: RuleOrderArg) -> Self {
        match arg {
            RuleOrderArg::Source => RuleOrder::Source,
            RuleOrderArg::Compiler => RuleOrder::Compiler,
        }
    }
}

//! Lint results as reported by the CSS linter.
//!
//! Only `line` and `column` are modelled; every other field the linter emits
//! is carried along verbatim so results can be handed back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A warning that carries a line/column position.
///
/// Implemented by [`Warning`] and available for hosts that keep warnings in
/// their own types.
pub trait LintWarning {
    /// The reported line.
    fn line(&self) -> u32;
    /// The reported column.
    fn column(&self) -> u32;
    /// Overwrites the reported column.
    fn set_column(&mut self, column: u32);
}

/// The severity of a lint warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// A warning that doesn't fail the run.
    Warning,
    /// An error that should be fixed.
    Error,
}

impl Severity {
    /// Returns the severity as the linter spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single linter warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// The reported line.
    pub line: u32,
    /// The reported column.
    pub column: u32,
    /// All other fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Warning {
    /// Creates a warning with no extra fields.
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            extra: Map::new(),
        }
    }

    /// Sets an extra field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns the warning's severity; anything but `"error"` is a warning.
    pub fn severity(&self) -> Severity {
        match self.extra.get("severity").and_then(Value::as_str) {
            Some("error") => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Returns the warning message.
    pub fn text(&self) -> Option<&str> {
        self.extra.get("text").and_then(Value::as_str)
    }

    /// Returns the name of the lint rule that produced the warning.
    pub fn rule(&self) -> Option<&str> {
        self.extra.get("rule").and_then(Value::as_str)
    }
}

impl LintWarning for Warning {
    fn line(&self) -> u32 {
        self.line
    }

    fn column(&self) -> u32 {
        self.column
    }

    fn set_column(&mut self, column: u32) {
        self.column = column;
    }
}

/// The linter's result for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintResult {
    /// The path of the linted file, when the linter reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The warnings.
    #[serde(default)]
    pub warnings: Vec<Warning>,
    /// All other fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LintResult {
    /// Creates a result holding the given warnings.
    pub fn new(warnings: Vec<Warning>) -> Self {
        Self {
            warnings,
            ..Default::default()
        }
    }

    /// Parses the linter's JSON output, an array of results.
    pub fn parse_many(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

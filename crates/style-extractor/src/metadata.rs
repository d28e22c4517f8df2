//! Metadata produced by the style compiler.

use crate::CompileError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use source_map::{Position, Replacements};

/// A style rule found in a tagged template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Human-readable name of the rule, used as its class selector.
    pub display_name: String,
    /// The template's CSS with interpolations replaced by placeholders.
    pub css_text: String,
    /// Where the template's CSS starts in the original source.
    #[serde(default)]
    pub start: Option<Position>,
    /// The generated class name, if the compiler assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl Rule {
    /// Creates a rule starting at the given position.
    pub fn new(display_name: impl Into<String>, css_text: impl Into<String>, start: Position) -> Self {
        Self {
            display_name: display_name.into(),
            css_text: css_text.into(),
            start: Some(start),
            class_name: None,
        }
    }

    /// Returns the rule's start, or the origin when the compiler had none.
    #[inline]
    pub fn start(&self) -> Position {
        self.start.unwrap_or_default()
    }
}

/// Everything the compiler reports about one file's embedded styles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMetadata {
    /// Rules keyed by selector, in the order the compiler produced them.
    #[serde(default)]
    pub rules: IndexMap<String, Rule>,
    /// Interpolations that were replaced by placeholders.
    #[serde(default)]
    pub replacements: Replacements,
}

impl StyleMetadata {
    /// Parses metadata from the compiler's JSON output.
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::InvalidMetadata(e.to_string()))
    }

    /// Converts an already-decoded JSON value into metadata.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CompileError> {
        serde_json::from_value(value).map_err(|e| CompileError::InvalidMetadata(e.to_string()))
    }
}

//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use style_extractor::{ProcessorOptions, RuleOrder};
use thiserror::Error;

/// Name of the config file looked up in the workspace root.
pub const CONFIG_FILE: &str = "styled-lint.config.json";

const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read {path}: {message}")]
    Read { path: Utf8PathBuf, message: String },

    /// The config file is not valid.
    #[error("failed to parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },
}

/// styled-lint-rs project configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintConfig {
    /// File extensions to process.
    pub extensions: Vec<String>,

    /// Files/patterns to exclude.
    pub exclude: Vec<String>,

    /// How rules are ordered in the synthetic CSS.
    pub rule_order: Option<RuleOrder>,

    /// Whether to skip files without tagged templates before compiling them.
    pub marker_check: Option<bool>,

    /// Path to the node binary.
    pub node: Option<Utf8PathBuf>,
}

impl LintConfig {
    /// Loads configuration from a JSON file (comments allowed).
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_owned(),
            message: e.to_string(),
        })?;

        Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_owned(),
            message,
        })
    }

    /// Loads `styled-lint.config.json` from a project root, or the defaults
    /// when there is none.
    pub fn find(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses configuration text.
    fn parse(content: &str) -> Result<Self, String> {
        let content = remove_json_comments(content);
        serde_json::from_str(&content).map_err(|e| e.to_string())
    }

    /// Returns the file extensions to process.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.to_vec()
        } else {
            self.extensions.iter().map(String::as_str).collect()
        }
    }

    /// Returns the processor options this configuration selects.
    pub fn processor_options(&self) -> ProcessorOptions {
        let defaults = ProcessorOptions::default();
        ProcessorOptions {
            rule_order: self.rule_order.unwrap_or(defaults.rule_order),
            marker_check: self.marker_check.unwrap_or(defaults.marker_check),
        }
    }
}

/// Removes single-line and multi-line comments from JSON.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    // Single-line comment
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    // Multi-line comment
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {
                    result.push(c);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

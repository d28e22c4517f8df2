//! The extract/correct session a lint run drives.

use crate::{
    has_style_marker, synthesize_css, CompileError, LintResult, LintWarning, Rule, StyleCompiler,
};
use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use source_map::Replacements;
use tracing::debug;

/// Order in which rules are laid out in the synthetic buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOrder {
    /// Sort by start position, so padding never has to move backwards.
    #[default]
    Source,
    /// Keep the order the compiler reported.
    Compiler,
}

/// Options for a [`StyleProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// How rules are ordered before synthesis.
    pub rule_order: RuleOrder,
    /// Whether to skip files without a tagged template marker before
    /// compiling them.
    pub marker_check: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            rule_order: RuleOrder::default(),
            marker_check: true,
        }
    }
}

/// The synthetic CSS for a file that had embedded styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedStyles {
    /// The synthetic CSS buffer.
    pub css: String,
    /// Number of rules written.
    pub rule_count: usize,
    /// Number of placeholder replacements remembered for correction.
    pub replacement_count: usize,
}

/// The outcome of extracting styles from one file.
#[derive(Debug)]
pub enum Extraction {
    /// The file has no tagged templates, or the compiler found no styles.
    NoEmbeddedStyles,
    /// The compiler failed; the file should not be linted.
    CompileFailed(CompileError),
    /// Styles were extracted.
    Extracted(ExtractedStyles),
}

impl Extraction {
    /// Returns the CSS to lint, empty when the file should be skipped.
    pub fn css_text(&self) -> &str {
        match self {
            Extraction::Extracted(styles) => &styles.css,
            Extraction::NoEmbeddedStyles | Extraction::CompileFailed(_) => "",
        }
    }

    /// Consumes the extraction and returns the CSS to lint.
    pub fn into_css(self) -> String {
        match self {
            Extraction::Extracted(styles) => styles.css,
            Extraction::NoEmbeddedStyles | Extraction::CompileFailed(_) => String::new(),
        }
    }

    /// Returns true if styles were extracted.
    pub fn is_extracted(&self) -> bool {
        matches!(self, Extraction::Extracted(_))
    }
}

/// One lint session: extracts styles and later corrects the warnings the
/// linter reports for them.
///
/// The session remembers each file's placeholder replacements between
/// [`code`](Self::code) and [`result`](Self::result). Entries are keyed by
/// filename, overwritten by later extractions of the same file, and live as
/// long as the session.
#[derive(Debug)]
pub struct StyleProcessor<C> {
    compiler: C,
    options: ProcessorOptions,
    replacements: FxHashMap<Utf8PathBuf, Replacements>,
}

impl<C: StyleCompiler> StyleProcessor<C> {
    /// Creates a session with default options.
    pub fn new(compiler: C) -> Self {
        Self::with_options(compiler, ProcessorOptions::default())
    }

    /// Creates a session with the given options.
    pub fn with_options(compiler: C, options: ProcessorOptions) -> Self {
        Self {
            compiler,
            options,
            replacements: FxHashMap::default(),
        }
    }

    /// Returns the session's options.
    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Returns the compiler.
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Extracts the styles embedded in `source` into a synthetic CSS buffer.
    ///
    /// On success the file's replacements are remembered for
    /// [`result`](Self::result). Failures leave any earlier entry in place.
    pub fn code(&mut self, source: &str, filename: impl AsRef<Utf8Path>) -> Extraction {
        let filename = filename.as_ref();

        if self.options.marker_check && !has_style_marker(source) {
            debug!(%filename, "no tagged templates, skipping");
            return Extraction::NoEmbeddedStyles;
        }

        let metadata = match self.compiler.compile(source, filename) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!(%filename, "compiler reported no style metadata");
                return Extraction::NoEmbeddedStyles;
            }
            Err(error) => {
                debug!(%filename, %error, "style compilation failed");
                return Extraction::CompileFailed(error);
            }
        };

        let mut rules: Vec<&Rule> = metadata.rules.values().collect();
        if self.options.rule_order == RuleOrder::Source {
            rules.sort_by_key(|rule| rule.start());
        }

        let css = synthesize_css(rules);
        let rule_count = metadata.rules.len();
        let replacement_count = metadata.replacements.len();
        debug!(%filename, rule_count, replacement_count, "extracted styles");

        self.replacements
            .insert(filename.to_owned(), metadata.replacements);

        Extraction::Extracted(ExtractedStyles {
            css,
            rule_count,
            replacement_count,
        })
    }

    /// Maps the positions in `result` back onto the original source.
    ///
    /// Returns false, leaving `result` untouched, when nothing was extracted
    /// for `filename` in this session. Correcting the same result twice shifts
    /// it twice.
    pub fn result(&self, result: &mut LintResult, filename: impl AsRef<Utf8Path>) -> bool {
        self.correct_warnings(&mut result.warnings, filename)
    }

    /// Corrects the columns of any warnings type.
    ///
    /// Only the column of warnings on a replacement's start line changes.
    pub fn correct_warnings<W: LintWarning>(
        &self,
        warnings: &mut [W],
        filename: impl AsRef<Utf8Path>,
    ) -> bool {
        let Some(replacements) = self.replacements.get(filename.as_ref()) else {
            return false;
        };

        for warning in warnings.iter_mut() {
            let column = replacements.correct_column(warning.line(), warning.column());
            warning.set_column(column);
        }

        true
    }

    /// Returns the replacements remembered for `filename`.
    pub fn replacements(&self, filename: impl AsRef<Utf8Path>) -> Option<&Replacements> {
        self.replacements.get(filename.as_ref())
    }

    /// Forgets the replacements remembered for `filename`.
    pub fn forget(&mut self, filename: impl AsRef<Utf8Path>) -> Option<Replacements> {
        self.replacements.remove(filename.as_ref())
    }

    /// Forgets every remembered file.
    pub fn clear(&mut self) {
        self.replacements.clear();
    }
}

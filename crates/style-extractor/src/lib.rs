//! CSS-in-JS style extraction for CSS linters.
//!
//! This crate turns the style rules embedded in `css` and `styled` tagged
//! templates into a synthetic CSS buffer whose rules sit at the same lines and
//! columns as in the original file, and maps the positions a linter reports
//! for that buffer back onto the original source. It handles:
//! - Skipping files without tagged templates before compiling them
//! - Laying out the compiler's rules in a position-preserving buffer
//! - Remembering each file's placeholder replacements for one lint session
//! - Correcting warning columns that drifted because of those placeholders
//!
//! # Example
//!
//! ```
//! use camino::Utf8Path;
//! use source_map::Position;
//! use style_extractor::{
//!     CompileError, LintResult, Rule, StyleMetadata, StyleProcessor, Warning,
//! };
//!
//! let compiler = |_source: &str, _filename: &Utf8Path| {
//!     let mut metadata = StyleMetadata::default();
//!     metadata.rules.insert(
//!         "title_t1".to_string(),
//!         Rule::new("title", "color: red;", Position::new(1, 18)),
//!     );
//!     Ok::<_, CompileError>(Some(metadata))
//! };
//!
//! let mut processor = StyleProcessor::new(compiler);
//! let extraction = processor.code("const title = css`color: red;`;", "title.js");
//! assert_eq!(extraction.css_text(), ".title {          color: red; }");
//!
//! let mut result = LintResult::new(vec![Warning::new(1, 21)]);
//! assert!(processor.result(&mut result, "title.js"));
//! assert_eq!(result.warnings[0].column, 21);
//! ```

mod compiler;
mod error;
mod lint;
mod marker;
mod metadata;
mod processor;
mod synthesize;

pub use compiler::StyleCompiler;
pub use error::CompileError;
pub use lint::{LintResult, LintWarning, Severity, Warning};
pub use marker::has_style_marker;
pub use metadata::{Rule, StyleMetadata};
pub use processor::{ExtractedStyles, Extraction, ProcessorOptions, RuleOrder, StyleProcessor};
pub use synthesize::synthesize_css;

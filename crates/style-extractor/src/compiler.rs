//! The seam between extraction and the external style compiler.

use crate::{CompileError, StyleMetadata};
use camino::Utf8Path;

/// Compiles a source file and reports the styles embedded in it.
///
/// Implementations return `Ok(None)` when the file compiled but carries no
/// style metadata, and `Err` when compilation itself failed.
pub trait StyleCompiler {
    /// Compiles `source`, which was read from `filename`.
    fn compile(
        &mut self,
        source: &str,
        filename: &Utf8Path,
    ) -> Result<Option<StyleMetadata>, CompileError>;
}

impl<F> StyleCompiler for F
where
    F: FnMut(&str, &Utf8Path) -> Result<Option<StyleMetadata>, CompileError>,
{
    fn compile(
        &mut self,
        source: &str,
        filename: &Utf8Path,
    ) -> Result<Option<StyleMetadata>, CompileError> {
        self(source, filename)
    }
}

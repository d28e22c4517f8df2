//! Cheap detection of CSS-in-JS tagged templates.

use regex::Regex;
use std::sync::OnceLock;

/// A `css` tag, a `styled(...)` call or a `styled.tag` access, directly
/// followed by the opening backtick of a template literal.
const STYLE_MARKER: &str = r"\b(?:styled(?:\([^)]+\)|\.[a-z0-9]+)|css)`";

fn style_marker() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(STYLE_MARKER).ok()).as_ref()
}

/// Returns true if the source may contain a `css` or `styled` tagged template.
///
/// This only decides whether compiling the file is worth it. It can report
/// templates that the compiler later ignores, but never misses one written in
/// the usual forms.
pub fn has_style_marker(source: &str) -> bool {
    match style_marker() {
        Some(marker) => marker.is_match(source),
        // Without the pattern, let the compiler decide.
        None => true,
    }
}

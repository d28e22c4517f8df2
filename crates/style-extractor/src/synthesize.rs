//! Synthetic CSS buffer construction.
//!
//! Each rule is written as a `.{displayName} {` header, padding, the rule's
//! CSS text and a closing ` }`. The CSS text begins at the line and column
//! where the template's content begins in the original file. Warnings about
//! the buffer then carry original coordinates, except on lines where an
//! interpolation changed the text length.

use crate::Rule;
use tracing::trace;

/// A growing CSS buffer that tracks its cursor.
///
/// Columns count UTF-16 code units, the unit the compiler and the linter
/// report positions in.
#[derive(Debug)]
struct CssBuffer {
    text: String,
    /// Number of lines, starting at 1 for the empty buffer.
    line_count: u32,
    /// Length of the last line in UTF-16 code units.
    last_line_len: u32,
}

impl CssBuffer {
    fn new() -> Self {
        Self {
            text: String::new(),
            line_count: 1,
            last_line_len: 0,
        }
    }

    fn push_str(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line_count += 1;
                self.last_line_len = 0;
            } else {
                self.last_line_len += c.len_utf16() as u32;
            }
        }
        self.text.push_str(text);
    }

    /// Appends newlines until the buffer has `line` lines.
    fn pad_to_line(&mut self, line: u32) {
        while self.line_count < line {
            self.text.push('\n');
            self.line_count += 1;
            self.last_line_len = 0;
        }
    }

    /// Appends spaces until the last line is `column` code units long.
    fn pad_to_column(&mut self, column: u32) {
        while self.last_line_len < column {
            self.text.push(' ');
            self.last_line_len += 1;
        }
    }

    fn into_string(self) -> String {
        self.text
    }
}

/// Lays out rules in a buffer that mirrors their original positions.
///
/// Rules are written in iteration order. Padding only ever appends, so a rule
/// that starts before the end of the previous one is written where the cursor
/// is and its warnings will not line up with the source.
pub fn synthesize_css<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> String {
    let mut buffer = CssBuffer::new();

    for rule in rules {
        let start = rule.start();
        trace!(
            display_name = %rule.display_name,
            line = start.line,
            column = start.column,
            "writing rule"
        );

        buffer.pad_to_line(start.line);
        buffer.push_str(&format!(".{} {{", rule.display_name));
        buffer.pad_to_column(start.column);
        buffer.push_str(&rule.css_text);
        buffer.push_str(" }");
    }

    buffer.into_string()
}

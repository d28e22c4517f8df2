//! Line index for looking up source lines by number.

/// An index of line start offsets for a piece of text.
///
/// Lines are addressed 1-indexed, matching how the linter reports them.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[i]` is the offset where line `i + 1` begins.
    line_starts: Vec<usize>,
    /// Total length of the indexed text.
    len: usize,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                // Next line starts after the newline
                line_starts.push(offset + 1);
            }
        }

        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Returns the number of lines in the source.
    ///
    /// Empty text has one (empty) line, and a trailing newline opens a new one.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the text of a 1-indexed line without its line terminator.
    ///
    /// Returns `None` if the line is out of bounds or `text` is not the text
    /// the index was built from.
    pub fn line_text<'a>(&self, text: &'a str, line: u32) -> Option<&'a str> {
        if text.len() != self.len {
            return None;
        }

        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| next - 1) // Before newline
            .unwrap_or(self.len);

        text.get(start..end)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }
}

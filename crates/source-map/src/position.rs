//! Line/column positions and the spans built from them.

/// A line and column position.
///
/// Values are kept exactly as the producer reported them. The style compiler
/// and the linter agree on their own bases, so no re-basing happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Line number.
    pub line: u32,
    /// Column number within the line.
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A span between two positions in the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Where the span starts.
    pub start: Position,
    /// Where the span ends.
    pub end: Position,
}

impl Location {
    /// Creates a new location from its endpoints.
    #[inline]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Returns true if the span starts and ends on the same line.
    #[inline]
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Returns the column distance between start and end, counting both ends.
    ///
    /// Only meaningful for single-line spans; multi-line spans may yield a
    /// negative width.
    #[inline]
    pub fn inclusive_width(&self) -> i64 {
        i64::from(self.end.column) - i64::from(self.start.column) + 1
    }
}

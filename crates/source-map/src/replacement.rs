//! Placeholder spans recorded by the style compiler and the correction that
//! undoes them.
//!
//! When the compiler evaluates a template it swaps every interpolation such
//! as `${colors.primary}` for a placeholder of a fixed length. The linter then
//! reports columns relative to the placeholder text, which drift from the
//! original source on the line where the interpolation starts. A
//! [`Replacement`] remembers the original span and the placeholder length so
//! the drift can be removed.

use crate::Location;

/// A source span that was substituted with a placeholder during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Replacement {
    /// The span of the interpolation in the original source.
    pub original: Location,
    /// Length of the placeholder that replaced it.
    pub length: u32,
}

impl Replacement {
    /// Creates a new replacement record.
    #[inline]
    pub fn new(original: Location, length: u32) -> Self {
        Self { original, length }
    }

    /// Column where the placeholder ends (exclusive) on the start line.
    #[inline]
    pub fn placeholder_end(&self) -> u32 {
        self.original.start.column.saturating_add(self.length)
    }

    /// How much wider the original span is than its placeholder.
    #[inline]
    pub fn width_delta(&self) -> i64 {
        self.original.inclusive_width() - i64::from(self.length)
    }

    /// Maps a column reported on `line` back to the original source.
    ///
    /// Columns past the placeholder are shifted by [`width_delta`], columns
    /// inside it are pinned to the interpolation, anything else (other lines,
    /// columns before or at the placeholder end) is returned unchanged.
    ///
    /// [`width_delta`]: Replacement::width_delta
    pub fn correct_column(&self, line: u32, column: u32) -> u32 {
        let start = self.original.start;
        if line != start.line {
            return column;
        }

        if column > self.placeholder_end() {
            // Always lands at or after `end.column + 2`, so it cannot underflow.
            let shifted = i64::from(column) + self.width_delta();
            u32::try_from(shifted).unwrap_or(u32::MAX)
        } else if column >= start.column && column < self.placeholder_end() {
            // Point at the end of the interpolation so the editor underlines
            // the identifier inside it.
            if self.original.is_single_line() {
                self.original.end.column.saturating_sub(1)
            } else {
                start.column
            }
        } else {
            column
        }
    }
}

/// All replacements recorded for one file, in compiler order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Replacements {
    entries: Vec<Replacement>,
}

impl Replacements {
    /// Creates an empty replacement list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of replacements.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no replacements were recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the replacements.
    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.entries.iter()
    }

    /// Maps a linter position back to the original source column.
    ///
    /// Every replacement on the same line is applied in order, each one seeing
    /// the column produced by the previous one.
    pub fn correct_column(&self, line: u32, column: u32) -> u32 {
        self.entries
            .iter()
            .fold(column, |column, replacement| {
                replacement.correct_column(line, column)
            })
    }
}

impl From<Vec<Replacement>> for Replacements {
    fn from(entries: Vec<Replacement>) -> Self {
        Self { entries }
    }
}

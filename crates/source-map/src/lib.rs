//! Position tracking and coordinate correction for styled-lint-rs.
//!
//! Style rules extracted from CSS-in-JS templates are linted in a synthetic
//! buffer. This crate provides the types that describe where each piece of
//! that buffer came from and the correction that maps linter positions back
//! onto the original source file.

mod line_index;
mod position;
mod replacement;

pub use line_index::LineIndex;
pub use position::{Location, Position};
pub use replacement::{Replacement, Replacements};

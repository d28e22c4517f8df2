//! Style compiler error types.

use thiserror::Error;

/// An error reported while compiling a file's embedded styles.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler ran and rejected the source.
    #[error("failed to compile {filename}: {message}")]
    Failed {
        /// The file that failed to compile.
        filename: String,
        /// The compiler's message.
        message: String,
    },

    /// The compiler returned metadata that could not be read.
    #[error("invalid style metadata: {0}")]
    InvalidMetadata(String),

    /// The compiler could not be started or stopped responding.
    #[error("style compiler unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CompileError::Failed {
            filename: "Button.tsx".to_string(),
            message: "Unexpected token (3:4)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "failed to compile Button.tsx: Unexpected token (3:4)"
        );
    }
}

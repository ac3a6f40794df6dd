//! Error types for expression compilation.

use thiserror::Error;

/// Errors that can occur when compiling a keyword expression.
///
/// There is a single syntactic category; the message carries the offending
/// (sub)expression. Unbalanced brackets, empty sub-expressions, stray control
/// characters in a literal, and unresolvable AND/OR framing all report as
/// [`InvalidExpression`](Self::InvalidExpression).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The expression violates the language syntax.
    #[error("invalid expression: {expression}")]
    InvalidExpression {
        /// The offending (sub)expression text.
        expression: String,
    },
}

impl CompileError {
    /// Creates an [`InvalidExpression`](Self::InvalidExpression) error.
    pub(crate) fn invalid(expression: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_text() {
        let err = CompileError::invalid("a||b");
        assert_eq!(err.to_string(), "invalid expression: a||b");
    }
}

use std::fmt;

/// An error produced while lexing, parsing, or compiling an attribute expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprError {
    pub message: String,
    /// 1-based column in the expression source where the error occurred.
    pub col: usize,
}

impl ExprError {
    pub(crate) fn new(msg: impl Into<String>, col: usize) -> Self {
        Self { message: msg.into(), col }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expression error at column {}: {}", self.col, self.message)
    }
}

impl std::error::Error for ExprError {}

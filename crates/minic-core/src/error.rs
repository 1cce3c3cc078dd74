//! Crate-level error type composing the per-stage error enums.

use thiserror::Error;

use crate::codegen::CodegenError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// Errors a single call to [`crate::compile`] can return.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// The byte offset into the source this error points at, if any —
    /// used by the CLI to render a caret marker under the offending byte.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CompileError::Lex(LexError::UnexpectedChar { offset, .. }) => Some(*offset),
            CompileError::Lex(LexError::NumberOverflow { offset, .. }) => Some(*offset),
            CompileError::Parse(ParseError::UnexpectedToken { offset, .. }) => Some(*offset),
            CompileError::Parse(ParseError::MissingSemicolon { offset }) => Some(*offset),
            CompileError::Parse(ParseError::MissingCloseParen { offset }) => Some(*offset),
            CompileError::Parse(ParseError::InvalidAssignmentTarget { offset }) => Some(*offset),
            CompileError::Parse(ParseError::UnexpectedEof) => None,
            CompileError::Codegen(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

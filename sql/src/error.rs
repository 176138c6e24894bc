use thiserror::Error;

use crate::token::Token;

/// Lexer/parser failure. Fatal to the statement, never to the connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize, line: u32, column: u32) -> Self {
        SyntaxError {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    pub fn unexpected(token: &Token) -> Self {
        SyntaxError::new(
            format!("Unexpected token: {}", token.describe()),
            token.offset,
            token.line,
            token.column,
        )
    }

    pub fn expected(what: &str, token: &Token) -> Self {
        SyntaxError::new(
            format!("Expected {}, found {}", what, token.describe()),
            token.offset,
            token.line,
            token.column,
        )
    }
}

pub type ParseResult<T> = Result<T, SyntaxError>;

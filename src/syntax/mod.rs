//! C# subset front end: tokenizer, syntax tree and parser

pub mod ast;
pub mod lexer;
mod parser;

pub use ast::*;
pub use parser::parse;

use crate::source::SourceText;
use thiserror::Error;

/// Error while turning source text into a syntax tree
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    pub(crate) fn at(source: &SourceText, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = source.line_col(offset).unwrap_or((0, 0));
        ParseError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

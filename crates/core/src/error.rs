//! Error types for the pdfparse structural parser.

use thiserror::Error;

/// Primary error type for PDF parsing operations.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Lexical error: a token could not be recognized.
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    /// Structural error: a production arrived where the open containers
    /// do not allow it.
    #[error("{msg} at position {pos}")]
    StructureError { pos: usize, msg: String },

    /// A dictionary closed with a duplicate, non-name or dangling key.
    #[error("{msg} at position {pos}: {element}")]
    DictionaryError {
        pos: usize,
        msg: String,
        element: String,
    },

    #[error("unexpected end of input at position {pos}")]
    UnexpectedEof { pos: usize },

    #[error("no PDF content found")]
    Empty,

    #[error("input of {len} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },

    #[error("nesting depth exceeds {limit} at position {pos}")]
    NestingTooDeep { pos: usize, limit: usize },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("decoded stream exceeds the limit of {limit} bytes")]
    DecodedTooLarge { limit: usize },

    #[error("emit error: {0}")]
    EmitError(String),
}

impl PdfError {
    /// Byte offset into the source where the error was detected, if any.
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::TokenError { pos, .. }
            | Self::StructureError { pos, .. }
            | Self::DictionaryError { pos, .. }
            | Self::UnexpectedEof { pos }
            | Self::NestingTooDeep { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    pub(crate) fn structure(pos: usize, msg: impl Into<String>) -> Self {
        Self::StructureError {
            pos,
            msg: msg.into(),
        }
    }

    pub(crate) fn token(pos: usize, msg: impl Into<String>) -> Self {
        Self::TokenError {
            pos,
            msg: msg.into(),
        }
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;

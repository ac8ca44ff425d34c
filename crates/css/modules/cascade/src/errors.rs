//! Errors of the style sheet pipeline.

use css_selectors::SelectorParseError;
use css_syntax::SyntaxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CssError {
    /// A malformed style sheet; it contributes nothing.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        message: String,
    },
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorParseError),
    #[error("cannot resolve {reference:?} against {base}")]
    InvalidUrl { base: String, reference: String },
    #[error("cannot load {url}: {message}")]
    Load { url: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<SyntaxError> for CssError {
    fn from(error: SyntaxError) -> Self {
        Self::Syntax {
            line: error.line,
            column: error.column,
            message: error.message,
        }
    }
}

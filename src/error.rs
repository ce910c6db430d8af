use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to parse schema AST {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unsupported type: {kind}")]
    UnsupportedType { kind: String },

    #[error("Generated output for {path} was rejected by the formatter: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Raised by a [`Formatter`](crate::format::Formatter) when the generated text
/// does not parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

pub mod ast;
pub mod converter;
pub mod error;
pub mod format;
pub mod imports;
pub mod naming;
pub mod types;

use std::path::Path;

pub use ast::SchemaFile;
pub use converter::{ConvertOptions, FlowConverter};
pub use error::{ConversionError, FormatError, Result};
pub use format::{BasicFormatter, Formatter, Syntax};
pub use naming::NameCase;

/// Decode a JSON-encoded schema AST. `origin` only labels errors.
pub fn load_schema(json: &str, origin: &Path) -> Result<SchemaFile> {
    let parse_error = |message: String| ConversionError::Parse {
        path: origin.to_path_buf(),
        message,
    };
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| parse_error(e.to_string()))?;
    ast::decode(value).map_err(|e| parse_error(e.to_string()))
}

/// Read and decode a JSON-encoded schema AST from disk.
pub fn load_schema_file(path: &Path) -> Result<SchemaFile> {
    let json = std::fs::read_to_string(path)?;
    load_schema(&json, path)
}

/// Convert one schema file to Flow declarations.
pub fn convert_file(
    file: &SchemaFile,
    options: ConvertOptions,
    transform: &dyn Fn(&str) -> String,
    formatter: &dyn Formatter,
) -> Result<String> {
    FlowConverter::new(file, transform, options).convert(formatter)
}

/// Convert a JSON-encoded schema AST with default options, names kept as
/// written and the built-in formatter.
pub fn convert_schema(json: &str) -> Result<String> {
    let file = load_schema(json, Path::new("<input>"))?;
    convert_file(
        &file,
        ConvertOptions::default(),
        &|name: &str| NameCase::Preserve.apply(name),
        &BasicFormatter,
    )
}

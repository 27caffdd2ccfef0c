// ABOUTME: Error types for the folio carousel tooling
// ABOUTME: Provides structured error handling for each stage of the page pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("HTML parse error at byte {position}: {message}")]
    ParseError { position: usize, message: String },

    #[error("Invalid selector: {0}")]
    SelectorError(String),

    #[error("Invalid section rule on line {line}: {message}")]
    RuleError { line: usize, message: String },

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("No pages found matching pattern: {0}")]
    NoPagesFoundError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<anyhow::Error> for FolioError {
    fn from(err: anyhow::Error) -> Self {
        FolioError::UnknownError(err.to_string())
    }
}

impl From<quick_xml::Error> for FolioError {
    fn from(err: quick_xml::Error) -> Self {
        FolioError::ParseError {
            position: 0,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;

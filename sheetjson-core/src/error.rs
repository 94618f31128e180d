//! Error type shared by both translation directions

use crate::reader::FileType;
use thiserror::Error;

/// Errors that abort a translation pass
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Failed to write spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unsupported alignment '{0}' (expected left, center or right)")]
    UnsupportedAlignment(String),

    #[error("Unsupported image type '{0}' (expected png or jpeg)")]
    UnsupportedImageType(String),

    #[error("Invalid color '{0}' (expected RRGGBB or AARRGGBB hex)")]
    InvalidColor(String),

    #[error("Invalid cell range '{0}'")]
    InvalidRange(String),

    #[error("Invalid configuration file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for parameter '{key}'")]
    InvalidParameter { key: String, value: String },

    #[error("Failed to load image from '{url}': {reason}")]
    ImageLoad { url: String, reason: String },

    #[error("{0} output is not supported")]
    UnsupportedOutput(FileType),

    #[error("Sink called out of order: {0}")]
    SinkState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

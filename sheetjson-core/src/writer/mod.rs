//! Spreadsheet sinks for the JSON -> spreadsheet direction

use crate::error::{Error, Result};
use crate::style::Style;
use std::fmt;
use std::str::FromStr;

pub mod images;
mod xlsx_writer;

pub use xlsx_writer::XlsxSink;

/// A typed column value handed to a sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue<'a> {
    Null,
    String(&'a str),
    /// Exact decimal as it appeared in the document
    Number(&'a serde_json::Number),
    Boolean(bool),
    /// Formula text, passed through without evaluation
    Formula(&'a str),
}

/// Picture formats a sink can embed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
}

impl FromStr for ImageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "png" => Ok(ImageType::Png),
            "jpeg" => Ok(ImageType::Jpeg),
            other => Err(Error::UnsupportedImageType(other.to_string())),
        }
    }
}

impl ImageType {
    /// Whether `bytes` start with this format's file signature
    pub fn matches(self, bytes: &[u8]) -> bool {
        match self {
            ImageType::Png => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
            ImageType::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageType::Png => f.write_str("png"),
            ImageType::Jpeg => f.write_str("jpeg"),
        }
    }
}

/// An image to place on the current sheet once its rows are written
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    /// Anchor range, e.g. `B2:D8`; the image is placed at its top-left cell
    pub reference: String,
    pub url: String,
    pub image_type: ImageType,
    pub scale: f64,
}

/// Receives the write calls of one workbook
///
/// Call order per sheet: `start_sheet`, then for every row `add_row`
/// followed by its columns (each optionally followed by `merge_columns`),
/// then any `add_image` / `set_print_area`, then `end_sheet`. Images are
/// buffered and placed at `end_sheet`.
pub trait SheetSink {
    fn start_sheet(
        &mut self,
        name: &str,
        style: Option<&Style>,
        selected: bool,
        active: bool,
    ) -> Result<()>;

    fn add_row(&mut self) -> Result<()>;

    /// Append a column to the current row; `name` is the JSON key it came from
    fn add_column(&mut self, name: &str, value: ColumnValue<'_>, style: Option<&Style>)
    -> Result<()>;

    /// Merge the column just written with the following `count - 1` columns
    fn merge_columns(&mut self, count: u16) -> Result<()>;

    fn set_print_area(&mut self, reference: &str) -> Result<()>;

    fn add_image(&mut self, image: ImageRequest) -> Result<()>;

    fn end_sheet(&mut self) -> Result<()>;
}

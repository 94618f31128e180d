//! Spreadsheet event sources for the spreadsheet -> JSON direction

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub mod calamine_source;

pub use calamine_source::CalamineSource;

/// Receives the ordered cell events of one workbook
///
/// A source emits, per sheet: `start_sheet`, then for every row in ascending
/// index order `start_row`, one `cell` per present cell, `end_row`; finally
/// `end_sheet`. Each callback completes before the source moves on.
pub trait SheetHandler {
    fn start_sheet(&mut self, name: &str) -> Result<()>;
    /// `row` is the zero-based row index in the sheet
    fn start_row(&mut self, row: u32) -> Result<()>;
    /// `address` is an A1-style reference, `value` the formatted cell text
    fn cell(&mut self, address: &str, value: &str) -> Result<()>;
    fn end_row(&mut self, row: u32) -> Result<()>;
    fn end_sheet(&mut self) -> Result<()>;
}

/// Pushes workbook events into a [`SheetHandler`]
pub trait EventSource {
    fn read(&mut self, handler: &mut dyn SheetHandler) -> Result<()>;
}

/// Supported spreadsheet container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Xlsx,
    Xlsb,
}

impl FileType {
    /// Detect the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<FileType> {
        path.as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("xlsx") || s.eq_ignore_ascii_case("xlsm") {
            Ok(FileType::Xlsx)
        } else if s.eq_ignore_ascii_case("xlsb") {
            Ok(FileType::Xlsb)
        } else {
            Err(Error::InvalidParameter {
                key: "file type".to_string(),
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Xlsx => f.write_str("xlsx"),
            FileType::Xlsb => f.write_str("xlsb"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path("report.xlsx"), Some(FileType::Xlsx));
        assert_eq!(FileType::from_path("Macro.XLSM"), Some(FileType::Xlsx));
        assert_eq!(FileType::from_path("dir/data.xlsb"), Some(FileType::Xlsb));
        assert_eq!(FileType::from_path("data.ods"), None);
        assert_eq!(FileType::from_path("noext"), None);
    }
}

//! sheetjson-core: streaming spreadsheet <-> JSON translation
//!
//! The spreadsheet -> JSON direction replays workbook cells through a
//! [`ContentsHandler`], which splits each sheet into header and content rows,
//! names columns and optionally detects scalar types. The JSON -> spreadsheet
//! direction walks a `{"sheets": [...]}` document and drives a [`SheetSink`],
//! cascading cell styles and deferring images to the end of each sheet.

pub mod autodetect;
pub mod cell_ref;
pub mod config;
pub mod error;
pub mod json_to_sheet;
pub mod json_writer;
pub mod reader;
pub mod sheet_to_json;
pub mod style;
pub mod writer;

use serde_json::ser::Formatter;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

pub use config::{ConversionParameters, ReadOptions, WriteOptions};
pub use error::{Error, Result};
pub use json_writer::JsonWriter;
pub use reader::{CalamineSource, EventSource, FileType, SheetHandler};
pub use sheet_to_json::ContentsHandler;
pub use style::{Alignment, Style};
pub use writer::{ColumnValue, ImageRequest, ImageType, SheetSink, XlsxSink};

/// Converts xlsx/xlsb workbooks into `{"sheets": [...]}` JSON
#[derive(Debug, Clone, Default)]
pub struct ExcelToJsonConverter {
    parameters: ConversionParameters,
    options: ReadOptions,
}

impl ExcelToJsonConverter {
    pub fn new(parameters: ConversionParameters, options: ReadOptions) -> Self {
        Self {
            parameters,
            options,
        }
    }

    pub fn parameters(&self) -> &ConversionParameters {
        &self.parameters
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    /// Convert a workbook read from `input` and write the JSON to `output`
    pub fn convert<R, W>(&self, input: R, output: W, file_type: FileType) -> Result<()>
    where
        R: Read + Seek,
        W: Write,
    {
        log::info!(
            "Converting {} workbook to JSON ({} parameters, autodetect types: {}, pretty: {})",
            file_type,
            self.parameters.len(),
            self.options.autodetect_types,
            self.options.pretty_printing
        );

        let mut source = CalamineSource::new(input, file_type)?;
        if self.options.pretty_printing {
            self.write_document(&mut source, JsonWriter::pretty(output))
        } else {
            self.write_document(&mut source, JsonWriter::new(output))
        }
    }

    /// Convert a workbook file, detecting its type from the extension
    pub fn convert_file<P: AsRef<Path>, W: Write>(&self, path: P, output: W) -> Result<()> {
        let path = path.as_ref();
        let file_type = FileType::from_path(path).ok_or_else(|| Error::InvalidParameter {
            key: "file type".to_string(),
            value: path.display().to_string(),
        })?;
        let file = File::open(path)?;
        self.convert(BufReader::new(file), output, file_type)
    }

    /// Drive any event source through a [`ContentsHandler`]
    pub fn write_document<E, W, F>(&self, source: &mut E, mut json: JsonWriter<W, F>) -> Result<()>
    where
        E: EventSource + ?Sized,
        W: Write,
        F: Formatter,
    {
        json.begin_object()?;
        json.begin_array_field("sheets")?;
        {
            let mut handler =
                ContentsHandler::new(&mut json, &self.parameters, self.options.autodetect_types);
            source.read(&mut handler)?;
        }
        json.end()?;
        json.end()?;
        json.into_inner()?;
        Ok(())
    }
}

/// Converts `{"sheets": [...]}` JSON into xlsx workbooks
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonToExcelConverter {
    options: WriteOptions,
}

impl JsonToExcelConverter {
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    /// Convert the JSON read from `input` and write the workbook to `output`
    ///
    /// Nothing is written to `output` unless the whole document translates.
    pub fn convert<R, W>(&self, input: R, output: W, file_type: FileType) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        if file_type != FileType::Xlsx {
            return Err(Error::UnsupportedOutput(file_type));
        }
        log::info!(
            "Converting JSON to {} workbook (streaming: {}, auto size columns: {})",
            file_type,
            self.options.streaming,
            self.options.auto_size_columns
        );

        let mut sink = XlsxSink::new(output, self.options);
        let sheets = json_to_sheet::translate(input, &mut sink)?;
        sink.finish()?;

        log::info!("Wrote {} sheets", sheets);
        Ok(())
    }
}

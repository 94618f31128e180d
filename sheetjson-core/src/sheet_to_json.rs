//! Spreadsheet events -> JSON document
//!
//! [`ContentsHandler`] turns the flat cell events of a workbook into
//!
//! ```json
//! { "sheets": [ { "name": "...",
//!                 "header": { "rows": [ { "A": "..." } ] },
//!                 "content": { "rows": [ { "<column>": <value> } ] } } ] }
//! ```
//!
//! in a single forward pass. The leading `headerRows` rows of a sheet go to
//! the header block and are keyed by column reference; every later row goes
//! to the content block and is keyed by the renamed or header-derived
//! column name.

use crate::autodetect::{self, Scalar};
use crate::cell_ref::column_reference;
use crate::config::ConversionParameters;
use crate::error::Result;
use crate::json_writer::JsonWriter;
use crate::reader::SheetHandler;
use serde_json::ser::Formatter;
use std::collections::HashMap;
use std::io::Write;

/// Which block the rows of a sheet currently land in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Header,
    Content,
}

/// Per-sheet translation state, rebuilt at every sheet start
#[derive(Debug)]
struct SheetState {
    name: String,
    header_rows: i64,
    auto_columns: bool,
    partition: Partition,
    header_opened: bool,
    last_row: i64,
    /// Header texts seen per column reference, in row order
    header_columns: HashMap<String, Vec<String>>,
}

impl SheetState {
    fn new(name: &str, parameters: &ConversionParameters) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            header_rows: parameters.header_rows(name)?,
            auto_columns: parameters.auto_columns(name),
            partition: Partition::Header,
            header_opened: false,
            last_row: -1,
            header_columns: HashMap::new(),
        })
    }

    fn is_header_row(&self, row: i64) -> bool {
        self.header_rows > 0 && row < self.header_rows
    }

    /// JSON key for a cell of the given column
    fn column_name(&self, column: &str, parameters: &ConversionParameters) -> String {
        if self.partition == Partition::Header {
            return column.to_string();
        }
        if self.auto_columns {
            if let Some(texts) = self.header_columns.get(column).filter(|t| !t.is_empty()) {
                return texts.join(" - ");
            }
        }
        parameters
            .column_name(&self.name, column)
            .unwrap_or(column)
            .to_string()
    }
}

/// Writes one JSON sheet object per workbook sheet
pub struct ContentsHandler<'a, W: Write, F: Formatter> {
    json: &'a mut JsonWriter<W, F>,
    parameters: &'a ConversionParameters,
    autodetect_types: bool,
    sheet: Option<SheetState>,
}

impl<'a, W: Write, F: Formatter> ContentsHandler<'a, W, F> {
    /// The writer must be positioned inside the `sheets` array
    pub fn new(
        json: &'a mut JsonWriter<W, F>,
        parameters: &'a ConversionParameters,
        autodetect_types: bool,
    ) -> Self {
        Self {
            json,
            parameters,
            autodetect_types,
            sheet: None,
        }
    }

    fn open_header(json: &mut JsonWriter<W, F>, sheet: &mut SheetState) -> Result<()> {
        if !sheet.header_opened {
            json.begin_object_field("header")?;
            json.begin_array_field("rows")?;
            sheet.header_opened = true;
        }
        Ok(())
    }

    fn empty_rows(json: &mut JsonWriter<W, F>, from: i64, to: i64) -> Result<()> {
        for _ in from..to {
            json.begin_object()?;
            json.end()?;
        }
        Ok(())
    }

    fn open_content(json: &mut JsonWriter<W, F>, sheet: &mut SheetState) -> Result<()> {
        if sheet.header_opened {
            json.end()?; // rows
            json.end()?; // header
        }
        json.begin_object_field("content")?;
        json.begin_array_field("rows")?;
        sheet.partition = Partition::Content;
        Ok(())
    }

    fn write_value(&mut self, key: &str, value: &str) -> Result<()> {
        let scalar = if self.autodetect_types {
            autodetect::detect(value)
        } else {
            autodetect::text(value)
        };
        match scalar {
            Scalar::Integer(i) => self.json.field(key, &i),
            Scalar::Float(f) => self.json.field(key, &f),
            Scalar::Boolean(b) => self.json.field(key, &b),
            Scalar::Text(s) => self.json.field(key, s),
        }
    }
}

impl<W: Write, F: Formatter> SheetHandler for ContentsHandler<'_, W, F> {
    fn start_sheet(&mut self, name: &str) -> Result<()> {
        log::debug!("Sheet '{}' started", name);
        self.sheet = Some(SheetState::new(name, self.parameters)?);
        self.json.begin_object()?;
        self.json.field("name", name)
    }

    fn start_row(&mut self, row: u32) -> Result<()> {
        let Some(sheet) = self.sheet.as_mut() else {
            return Ok(());
        };
        let row = i64::from(row);
        let mut next = sheet.last_row + 1;

        if sheet.partition == Partition::Header {
            // Skipped rows below headerRows still belong to the header
            let header_end = row.min(sheet.header_rows.max(0));
            if next < header_end || sheet.is_header_row(row) {
                Self::open_header(self.json, sheet)?;
                Self::empty_rows(self.json, next, header_end)?;
                next = next.max(header_end);
            }
            if !sheet.is_header_row(row) {
                Self::open_content(self.json, sheet)?;
            }
        }

        // Keep absolute positions when the source skips rows
        Self::empty_rows(self.json, next, row)?;

        self.json.begin_object()?;
        sheet.last_row = sheet.last_row.max(row);
        Ok(())
    }

    fn cell(&mut self, address: &str, value: &str) -> Result<()> {
        let Some(sheet) = self.sheet.as_mut() else {
            return Ok(());
        };
        let Some(column) = column_reference(address) else {
            log::debug!("Skipping cell '{}' without a column reference", address);
            return Ok(());
        };

        if sheet.partition == Partition::Header {
            sheet
                .header_columns
                .entry(column.to_string())
                .or_default()
                .push(value.to_string());
        }

        let key = sheet.column_name(column, self.parameters);
        self.write_value(&key, value)
    }

    fn end_row(&mut self, _row: u32) -> Result<()> {
        if self.sheet.is_none() {
            return Ok(());
        }
        self.json.end()
    }

    fn end_sheet(&mut self) -> Result<()> {
        let Some(mut sheet) = self.sheet.take() else {
            return Ok(());
        };

        // Empty and header-only sheets still get a content block
        if sheet.partition == Partition::Header {
            Self::open_content(self.json, &mut sheet)?;
        }
        self.json.end()?; // rows
        self.json.end()?; // content
        self.json.end()?; // sheet

        log::debug!("Sheet '{}' finished after row {}", sheet.name, sheet.last_row);
        Ok(())
    }
}

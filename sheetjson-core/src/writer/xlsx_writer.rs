//! Sink writing `.xlsx` workbooks with rust_xlsxwriter

use super::{ColumnValue, ImageRequest, SheetSink, images};
use crate::cell_ref::parse_cell_range;
use crate::config::WriteOptions;
use crate::error::{Error, Result};
use crate::style::{Alignment, Style};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Image, Workbook, Worksheet};
use std::collections::{HashMap, VecDeque};
use std::io::Write;

const ROW_LOG_INTERVAL: u32 = 10_000;

/// Points added to the largest font height of a row
const ROW_HEIGHT_PADDING: f64 = 6.0;

/// Tallest row Excel accepts, in points
const MAX_ROW_HEIGHT: f64 = 409.0;

/// Owned copy of a written cell, replayed into the anchor after a merge
#[derive(Debug, Clone)]
enum WrittenValue {
    Blank,
    String(String),
    Number(f64),
    Boolean(bool),
    Formula(String),
}

#[derive(Debug)]
struct LastCell {
    col: u16,
    value: WrittenValue,
    style: Option<Style>,
    /// Last column of the pending merge anchored at `col`
    merge_to: Option<u16>,
}

/// Write position and deferred work of the sheet being written
#[derive(Debug)]
struct SheetCursor {
    index: usize,
    name: String,
    row: Option<u32>,
    next_col: u16,
    max_font_height: u16,
    last_cell: Option<LastCell>,
    auto_sized: bool,
    images: VecDeque<ImageRequest>,
}

impl SheetCursor {
    fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            row: None,
            next_col: 0,
            max_font_height: 0,
            last_cell: None,
            auto_sized: false,
            images: VecDeque::new(),
        }
    }

    fn current_row(&self) -> Result<u32> {
        self.row
            .ok_or(Error::SinkState("column written before any row"))
    }

    fn rows_written(&self) -> u32 {
        self.row.map_or(0, |row| row + 1)
    }
}

/// [`SheetSink`] producing an xlsx workbook
///
/// Formats are interned by [`Style`] value and shared by every sheet of
/// the workbook. Nothing reaches the output until [`XlsxSink::finish`].
pub struct XlsxSink<W: Write> {
    output: W,
    workbook: Workbook,
    options: WriteOptions,
    formats: HashMap<Style, Format>,
    sheet_count: usize,
    sheet: Option<SheetCursor>,
}

impl<W: Write> XlsxSink<W> {
    pub fn new(output: W, options: WriteOptions) -> Self {
        Self {
            output,
            workbook: Workbook::new(),
            options,
            formats: HashMap::new(),
            sheet_count: 0,
            sheet: None,
        }
    }

    /// Number of distinct formats created so far
    pub fn format_count(&self) -> usize {
        self.formats.len()
    }

    /// Serialize the workbook into the output and hand the output back
    pub fn finish(mut self) -> Result<W> {
        if self.sheet.is_some() {
            return Err(Error::SinkState("workbook finished while a sheet is open"));
        }
        let bytes = self.workbook.save_to_buffer()?;
        self.output.write_all(&bytes)?;
        self.output.flush()?;
        log::debug!(
            "Wrote workbook with {} sheets ({} bytes)",
            self.sheet_count,
            bytes.len()
        );
        Ok(self.output)
    }
}

impl<W: Write> SheetSink for XlsxSink<W> {
    fn start_sheet(
        &mut self,
        name: &str,
        style: Option<&Style>,
        selected: bool,
        active: bool,
    ) -> Result<()> {
        if self.sheet.is_some() {
            return Err(Error::SinkState("sheet started before the previous one ended"));
        }

        let worksheet = if self.options.streaming {
            self.workbook.add_worksheet_with_constant_memory()
        } else {
            self.workbook.add_worksheet()
        };
        if !name.is_empty() {
            worksheet.set_name(name)?;
        }
        if let Some(color) = style.and_then(|s| s.color.as_deref()) {
            worksheet.set_tab_color(parse_color(color)?);
        }
        if selected {
            worksheet.set_selected(true);
        }
        if active {
            worksheet.set_active(true);
        }

        log::debug!("Started sheet {} '{}'", self.sheet_count, name);
        self.sheet = Some(SheetCursor::new(self.sheet_count, name));
        self.sheet_count += 1;
        Ok(())
    }

    fn add_row(&mut self) -> Result<()> {
        let Self {
            workbook,
            options,
            formats,
            sheet,
            ..
        } = self;
        let cursor = sheet
            .as_mut()
            .ok_or(Error::SinkState("row added before any sheet"))?;
        let worksheet = workbook.worksheet_from_index(cursor.index)?;

        apply_merge(worksheet, formats, cursor)?;
        finish_row(worksheet, cursor)?;

        cursor.row = Some(cursor.rows_written());
        cursor.next_col = 0;
        cursor.max_font_height = 0;
        cursor.last_cell = None;

        let rows = cursor.rows_written();
        if rows % ROW_LOG_INTERVAL == 0 {
            log::info!("Wrote {} rows to sheet '{}'", rows, cursor.name);
        }

        let threshold = options.auto_size_columns;
        if threshold > 0 && !cursor.auto_sized && i64::from(rows) > i64::from(threshold) {
            log::info!("Autofitting columns of sheet '{}' after {} rows", cursor.name, threshold);
            worksheet.autofit();
            cursor.auto_sized = true;
        }
        Ok(())
    }

    fn add_column(
        &mut self,
        name: &str,
        value: ColumnValue<'_>,
        style: Option<&Style>,
    ) -> Result<()> {
        let Self {
            workbook,
            formats,
            sheet,
            ..
        } = self;
        let cursor = sheet
            .as_mut()
            .ok_or(Error::SinkState("column written before any sheet"))?;
        let row = cursor.current_row()?;
        let col = cursor.next_col;
        cursor.next_col = col.saturating_add(1);

        let value = match value {
            ColumnValue::Null => WrittenValue::Blank,
            ColumnValue::String(s) => WrittenValue::String(s.to_string()),
            ColumnValue::Number(n) => match n.as_f64() {
                Some(f) => WrittenValue::Number(f),
                None => {
                    log::warn!("Column '{}': {} is out of range, written as text", name, n);
                    WrittenValue::String(n.to_string())
                }
            },
            ColumnValue::Boolean(b) => WrittenValue::Boolean(b),
            ColumnValue::Formula(f) => WrittenValue::Formula(f.to_string()),
        };

        let worksheet = workbook.worksheet_from_index(cursor.index)?;
        apply_merge(worksheet, formats, cursor)?;
        if let Some(style) = style {
            if let Some(height) = style.font_height {
                cursor.max_font_height = cursor.max_font_height.max(height);
            }
            if let Some(width) = style.width {
                worksheet.set_column_width(col, width)?;
            }
        }

        let format = format_for(formats, style)?;
        write_value(worksheet, row, col, &value, format)?;

        cursor.last_cell = Some(LastCell {
            col,
            value,
            style: style.cloned(),
            merge_to: None,
        });
        Ok(())
    }

    fn merge_columns(&mut self, count: u16) -> Result<()> {
        if count < 2 {
            return Ok(());
        }
        let cursor = self
            .sheet
            .as_mut()
            .ok_or(Error::SinkState("merge requested before any sheet"))?;
        cursor.current_row()?;
        let last = cursor
            .last_cell
            .as_mut()
            .ok_or(Error::SinkState("merge requested before any column"))?;

        // Nested wrappers merge from the same anchor; the widest one wins
        let last_col = last.col.saturating_add(count - 1);
        let last_col = last.merge_to.map_or(last_col, |pending| pending.max(last_col));
        last.merge_to = Some(last_col);

        cursor.next_col = last_col.saturating_add(1);
        Ok(())
    }

    fn set_print_area(&mut self, reference: &str) -> Result<()> {
        let cursor = self
            .sheet
            .as_ref()
            .ok_or(Error::SinkState("print area set before any sheet"))?;
        let (first_row, first_col, last_row, last_col) = parse_range(reference)?;
        self.workbook
            .worksheet_from_index(cursor.index)?
            .set_print_area(first_row, first_col, last_row, last_col)?;
        Ok(())
    }

    fn add_image(&mut self, image: ImageRequest) -> Result<()> {
        let cursor = self
            .sheet
            .as_mut()
            .ok_or(Error::SinkState("image added before any sheet"))?;
        cursor.images.push_back(image);
        Ok(())
    }

    fn end_sheet(&mut self) -> Result<()> {
        let mut cursor = self
            .sheet
            .take()
            .ok_or(Error::SinkState("sheet ended before it was started"))?;
        let worksheet = self.workbook.worksheet_from_index(cursor.index)?;

        apply_merge(worksheet, &mut self.formats, &mut cursor)?;
        finish_row(worksheet, &cursor)?;

        if self.options.auto_size_columns != 0 && !cursor.auto_sized {
            log::info!("Autofitting columns of sheet '{}'", cursor.name);
            worksheet.autofit();
        }

        while let Some(image) = cursor.images.pop_front() {
            place_image(worksheet, &image)?;
        }

        log::debug!(
            "Finished sheet '{}' with {} rows",
            cursor.name,
            cursor.rows_written()
        );
        Ok(())
    }
}

/// Apply the pending height of the row being left
fn finish_row(worksheet: &mut Worksheet, cursor: &SheetCursor) -> Result<()> {
    if let Some(row) = cursor.row {
        if cursor.max_font_height > 0 {
            let height = f64::from(cursor.max_font_height) + ROW_HEIGHT_PADDING;
            worksheet.set_row_height(row, height.min(MAX_ROW_HEIGHT))?;
        }
    }
    Ok(())
}

/// Write the pending merge of the last cell, if any
///
/// `merge_range` blanks the anchor, so the written value goes back in.
fn apply_merge(
    worksheet: &mut Worksheet,
    formats: &mut HashMap<Style, Format>,
    cursor: &mut SheetCursor,
) -> Result<()> {
    let Some(row) = cursor.row else {
        return Ok(());
    };
    let Some(last) = cursor.last_cell.as_mut() else {
        return Ok(());
    };
    let Some(last_col) = last.merge_to.take() else {
        return Ok(());
    };

    let format = format_for(formats, last.style.as_ref())?;
    let default_format = Format::new();
    worksheet.merge_range(
        row,
        last.col,
        row,
        last_col,
        "",
        format.unwrap_or(&default_format),
    )?;
    write_value(worksheet, row, last.col, &last.value, format)?;
    Ok(())
}

fn format_for<'f>(
    formats: &'f mut HashMap<Style, Format>,
    style: Option<&Style>,
) -> Result<Option<&'f Format>> {
    let Some(style) = style else {
        return Ok(None);
    };
    if !formats.contains_key(style) {
        let format = build_format(style)?;
        formats.insert(style.clone(), format);
    }
    Ok(formats.get(style))
}

fn build_format(style: &Style) -> Result<Format> {
    let mut format = Format::new();

    if let Some(alignment) = style.alignment {
        format = format.set_align(match alignment {
            Alignment::Left => FormatAlign::Left,
            Alignment::Center => FormatAlign::Center,
            Alignment::Right => FormatAlign::Right,
        });
    }
    if let Some(height) = style.font_height {
        format = format.set_font_size(height);
    }
    if style.font_weight_bold == Some(true) {
        format = format.set_bold();
    }
    if let Some(color) = &style.color {
        format = format.set_font_color(parse_color(color)?);
    }
    if let Some(fill) = &style.fill_color {
        format = format
            .set_background_color(parse_color(fill)?)
            .set_pattern(FormatPattern::Solid);
    }
    Ok(format)
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &WrittenValue,
    format: Option<&Format>,
) -> Result<()> {
    match (value, format) {
        (WrittenValue::Blank, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (WrittenValue::Blank, None) => {}
        (WrittenValue::String(s), Some(format)) => {
            worksheet.write_string_with_format(row, col, s.as_str(), format)?;
        }
        (WrittenValue::String(s), None) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        (WrittenValue::Number(n), Some(format)) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        (WrittenValue::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (WrittenValue::Boolean(b), Some(format)) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
        (WrittenValue::Boolean(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (WrittenValue::Formula(f), Some(format)) => {
            worksheet.write_formula_with_format(row, col, f.as_str(), format)?;
        }
        (WrittenValue::Formula(f), None) => {
            worksheet.write_formula(row, col, f.as_str())?;
        }
    }
    Ok(())
}

fn place_image(worksheet: &mut Worksheet, image: &ImageRequest) -> Result<()> {
    let (row, col, _, _) = parse_range(&image.reference)?;
    let bytes = images::load_image(&image.url)?;
    if !image.image_type.matches(&bytes) {
        return Err(Error::ImageLoad {
            url: image.url.clone(),
            reason: format!("data is not a {} image", image.image_type),
        });
    }

    let picture = Image::new_from_buffer(&bytes)?
        .set_scale_width(image.scale)
        .set_scale_height(image.scale);
    worksheet.insert_image(row, col, &picture)?;

    log::debug!(
        "Placed {} image '{}' at {}",
        image.image_type,
        image.url,
        image.reference
    );
    Ok(())
}

fn parse_range(reference: &str) -> Result<(u32, u16, u32, u16)> {
    let invalid = || Error::InvalidRange(reference.to_string());
    let (first_row, first_col, last_row, last_col) =
        parse_cell_range(reference).ok_or_else(invalid)?;
    Ok((
        first_row,
        u16::try_from(first_col).map_err(|_| invalid())?,
        last_row,
        u16::try_from(last_col).map_err(|_| invalid())?,
    ))
}

/// Parse `RRGGBB` or `AARRGGBB` hex, with an optional leading `#`
fn parse_color(color: &str) -> Result<Color> {
    let hex = color.trim().trim_start_matches('#');
    let valid = matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(Error::InvalidColor(color.to_string()));
    }
    // Excel ignores the alpha channel of cell colors
    let rgb = &hex[hex.len() - 6..];
    u32::from_str_radix(rgb, 16)
        .map(Color::RGB)
        .map_err(|_| Error::InvalidColor(color.to_string()))
}

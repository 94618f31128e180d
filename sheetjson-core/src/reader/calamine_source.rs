//! Workbook event source backed by calamine

use super::{EventSource, FileType, SheetHandler};
use crate::cell_ref::cell_address;
use crate::error::Result;
use calamine::{Data, Reader, SheetType, Sheets, Xlsb, Xlsx};
use chrono::Timelike;
use std::io::{Read, Seek};

/// Emits the cells of every worksheet of an xlsx/xlsb workbook
pub struct CalamineSource<RS: Read + Seek> {
    workbook: Sheets<RS>,
}

impl<RS: Read + Seek> CalamineSource<RS> {
    pub fn new(reader: RS, file_type: FileType) -> Result<Self> {
        let workbook = match file_type {
            FileType::Xlsx => Sheets::Xlsx(Xlsx::new(reader).map_err(calamine::Error::from)?),
            FileType::Xlsb => Sheets::Xlsb(Xlsb::new(reader).map_err(calamine::Error::from)?),
        };
        Ok(Self { workbook })
    }

    /// Names of the worksheets in workbook order (chart sheets excluded)
    pub fn worksheet_names(&self) -> Vec<String> {
        self.workbook
            .sheets_metadata()
            .iter()
            .filter(|sheet| matches!(sheet.typ, SheetType::WorkSheet))
            .map(|sheet| sheet.name.clone())
            .collect()
    }
}

impl<RS: Read + Seek> EventSource for CalamineSource<RS> {
    fn read(&mut self, handler: &mut dyn SheetHandler) -> Result<()> {
        for name in self.worksheet_names() {
            let range = self.workbook.worksheet_range(&name)?;

            handler.start_sheet(&name)?;

            if let Some((first_row, first_col)) = range.start() {
                for (row_offset, row) in range.rows().enumerate() {
                    // Calamine has no notion of a stored-but-empty row
                    if row.iter().all(|data| matches!(data, Data::Empty)) {
                        continue;
                    }

                    let row_index = first_row + row_offset as u32;
                    handler.start_row(row_index)?;

                    for (col_offset, data) in row.iter().enumerate() {
                        if let Some(value) = formatted_value(data) {
                            let address = cell_address(row_index, first_col + col_offset as u32);
                            handler.cell(&address, &value)?;
                        }
                    }

                    handler.end_row(row_index)?;
                }
            }

            handler.end_sheet()?;
        }
        Ok(())
    }
}

/// Render a cell the way a spreadsheet displays it with the General format
pub fn formatted_value(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_number(*f)),
        Data::String(s) => Some(s.clone()),
        Data::Bool(true) => Some("TRUE".to_string()),
        Data::Bool(false) => Some("FALSE".to_string()),
        Data::DateTime(dt) => {
            if dt.is_datetime() {
                if let Some(datetime) = dt.as_datetime() {
                    let pattern = if datetime.num_seconds_from_midnight() == 0 {
                        "%Y-%m-%d"
                    } else {
                        "%Y-%m-%d %H:%M:%S"
                    };
                    return Some(datetime.format(pattern).to_string());
                }
            }
            Some(format_number(dt.as_f64()))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(e.to_string()),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

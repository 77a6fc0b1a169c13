//! Spreadsheet extraction (xlsx / xls)
//!
//! Every sheet keeps its native rows; a flattened, row-major text view is
//! appended to the line sequence so the extractor sees sheets like any
//! other text.

use crate::config::SheetMode;
use crate::error::QaError;
use crate::models::{CellValue, DocumentFormat, ExtractedContent, SheetTable, TextStatus};
use crate::Result;
use calamine::{Data, Reader, Xls, Xlsx};
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

/// A sheet as read from the workbook, before flattening
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

pub fn extract(bytes: &[u8], format: DocumentFormat, mode: SheetMode) -> Result<ExtractedContent> {
    let cursor = Cursor::new(bytes.to_vec());

    let sheets = match format {
        DocumentFormat::Xlsx => {
            let workbook: Xlsx<_> = open_workbook(cursor)?;
            read_sheets::<_, Cursor<Vec<u8>>>(workbook, mode)?
        }
        DocumentFormat::Xls => {
            let workbook: Xls<_> = open_workbook(cursor)?;
            read_sheets::<_, Cursor<Vec<u8>>>(workbook, mode)?
        }
        DocumentFormat::Pdf => {
            return Err(QaError::UnsupportedFormat(
                "PDF passed to the spreadsheet reader".to_string(),
            ))
        }
    };

    Ok(flatten_sheets(sheets))
}

fn open_workbook<R, RS>(cursor: RS) -> Result<R>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    R::new(cursor).map_err(|e| QaError::CorruptDocument(format!("failed to open workbook: {}", e)))
}

fn read_sheets<R, RS>(mut workbook: R, mode: SheetMode) -> Result<Vec<RawSheet>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let mut names = workbook.sheet_names();
    if mode == SheetMode::First {
        names.truncate(1);
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            QaError::CorruptDocument(format!("failed to read sheet '{}': {}", name, e))
        })?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();

        sheets.push(RawSheet { name, rows });
    }

    Ok(sheets)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

/// Append a `Sheet: <name>` header and one line per non-empty row for each sheet
pub fn flatten_sheets(sheets: Vec<RawSheet>) -> ExtractedContent {
    let mut lines = Vec::new();
    let mut tables = Vec::with_capacity(sheets.len());
    let mut anomalies = Vec::new();
    let mut cells_seen = 0usize;

    for sheet in sheets {
        let start = lines.len();
        lines.push(format!("Sheet: {}", sheet.name));

        let mut sheet_cells = 0usize;
        for row in &sheet.rows {
            let cells: Vec<String> = row
                .iter()
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.to_string())
                .collect();
            if cells.is_empty() {
                continue;
            }
            sheet_cells += cells.len();
            lines.push(cells.join(" "));
        }

        if sheet_cells == 0 {
            anomalies.push(format!("sheet '{}': no cell values", sheet.name));
        }
        cells_seen += sheet_cells;

        tables.push(SheetTable {
            name: sheet.name,
            rows: sheet.rows,
            lines: start..lines.len(),
        });
    }

    let status = if cells_seen == 0 {
        TextStatus::NoTextExtracted
    } else {
        TextStatus::Extracted
    };

    ExtractedContent {
        lines,
        sheets: Some(tables),
        status,
        anomalies,
    }
}

/// Build an xlsx workbook with one worksheet per `(name, rows)`
#[cfg(test)]
pub(crate) fn build_test_xlsx(sheets: &[(&str, Vec<Vec<CellValue>>)]) -> Vec<u8> {
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("valid sheet name");
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    CellValue::Text(s) => {
                        worksheet.write_string(r, c, s.as_str()).expect("string cell");
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(r, c, *n).expect("number cell");
                    }
                    CellValue::Empty => {}
                }
            }
        }
    }
    workbook.save_to_buffer().expect("workbook saves")
}

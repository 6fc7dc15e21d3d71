//! Excel (XLS / XLSX) parser
//!
//! Reads the first worksheet. The first row with any content is the header.

use calamine::{Data, Range, Reader, Xls, Xlsx};
use std::io::Cursor;
use tracing::debug;

use super::infer::{build_table, RawCell};
use super::{ExcelType, ParseOptions, ParsedTable, TabularParser};
use crate::error::{JobError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelParser;

impl TabularParser for ExcelParser {
    fn name(&self) -> &'static str {
        "excel"
    }

    fn parse(&self, data: &[u8], options: &ParseOptions) -> Result<ParsedTable> {
        let range = match options.excel_type {
            ExcelType::Xls => first_sheet::<Xls<_>>(data)?,
            ExcelType::Xlsx => first_sheet::<Xlsx<_>>(data)?,
        };

        let mut rows = range
            .rows()
            .skip_while(|row| row.iter().all(|cell| matches!(cell, Data::Empty)));

        let headers: Vec<String> = match rows.next() {
            Some(row) => row.iter().map(|cell| cell.to_string()).collect(),
            None => return Err(JobError::parse("worksheet is empty")),
        };

        let cells: Vec<Vec<RawCell>> = rows
            .map(|row| row.iter().map(raw_cell).collect())
            .collect();

        debug!(
            excel_type = ?options.excel_type,
            columns = headers.len(),
            rows = cells.len(),
            "Decoded worksheet"
        );

        build_table(&headers, cells, options.strict_type_guess)
    }
}

fn first_sheet<'a, R>(data: &'a [u8]) -> Result<Range<Data>>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    let mut workbook =
        R::new(Cursor::new(data)).map_err(|e| JobError::parse(format!("invalid workbook: {}", e)))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| JobError::parse("workbook has no worksheets"))?
        .map_err(|e| JobError::parse(format!("unreadable worksheet: {}", e)))
}

/// Map a worksheet cell onto the inference input
fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Int(i) => RawCell::Int(*i),
        Data::Float(f) => RawCell::Float(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::String(s) => RawCell::text(s.as_str()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => RawCell::DateTime(naive),
            None => RawCell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::text(s.as_str()),
    }
}

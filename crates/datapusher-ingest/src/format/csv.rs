//! Delimited text (CSV / TSV) parser

use tracing::debug;

use super::infer::{build_table, RawCell};
use super::{ParseOptions, ParsedTable, TabularParser};
use crate::error::{JobError, Result};

/// Delimited text parser; the delimiter comes from [`ParseOptions`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser;

impl TabularParser for CsvParser {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn parse(&self, data: &[u8], options: &ParseOptions) -> Result<ParsedTable> {
        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut rows = reader.byte_records();

        let headers: Vec<String> = match rows.next() {
            Some(record) => record?
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned())
                .collect(),
            None => return Err(JobError::parse("resource is empty")),
        };

        let mut cells = Vec::new();
        for record in rows {
            let record = record?;
            cells.push(
                record
                    .iter()
                    .map(|cell| RawCell::text(String::from_utf8_lossy(cell)))
                    .collect::<Vec<_>>(),
            );
        }

        debug!(columns = headers.len(), rows = cells.len(), "Decoded delimited text");

        build_table(&headers, cells, options.strict_type_guess)
    }
}

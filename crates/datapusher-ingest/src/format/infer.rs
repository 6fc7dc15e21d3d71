//! Column type inference
//!
//! Candidate types are tried narrowest first. A column keeps every candidate
//! that has accepted all of its non-empty cells so far; its type is the
//! narrowest survivor. `String` accepts everything, so there always is one.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;
use std::sync::Arc;

use super::{ParsedField, ParsedTable};
use crate::error::{JobError, Result};
use crate::record::{format_timestamp, Record, Value};

/// Rows looked at when type guessing is not strict
pub const SAMPLE_ROWS: usize = 100;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// A cell as delivered by a decoder, before typing
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Text cell; blank text counts as empty
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    fn to_text(&self) -> Value {
        match self {
            RawCell::Empty => Value::Null,
            RawCell::Text(s) => Value::Text(s.clone()),
            RawCell::Int(i) => Value::Text(i.to_string()),
            RawCell::Float(f) => Value::Text(f.to_string()),
            RawCell::Bool(b) => Value::Text(b.to_string()),
            RawCell::DateTime(dt) => Value::Text(format_timestamp(dt)),
        }
    }
}

/// Column types a parser can report, narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Decimal,
    Float,
    DateTime,
    Boolean,
    String,
}

const CANDIDATES: [ColumnType; 6] = [
    ColumnType::Integer,
    ColumnType::Decimal,
    ColumnType::Float,
    ColumnType::DateTime,
    ColumnType::Boolean,
    ColumnType::String,
];

impl ColumnType {
    /// Name reported in parser metadata
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "Integer",
            ColumnType::Decimal => "Decimal",
            ColumnType::Float => "Float",
            ColumnType::DateTime => "DateTime",
            ColumnType::Boolean => "Boolean",
            ColumnType::String => "String",
        }
    }

    /// Convert a non-empty cell, or `None` if it does not fit this type
    pub fn convert(self, cell: &RawCell) -> Option<Value> {
        match (self, cell) {
            (_, RawCell::Empty) => Some(Value::Null),
            (ColumnType::String, cell) => Some(cell.to_text()),

            (ColumnType::Integer, RawCell::Int(i)) => Some(Value::Integer(*i)),
            (ColumnType::Integer, RawCell::Float(f)) => whole_float(*f).map(Value::Integer),
            (ColumnType::Integer, RawCell::Text(s)) => s.trim().parse().ok().map(Value::Integer),

            (ColumnType::Decimal, RawCell::Int(i)) => Some(Value::Decimal(BigDecimal::from(*i))),
            (ColumnType::Decimal, RawCell::Text(s)) => parse_decimal(s).map(Value::Decimal),

            (ColumnType::Float, RawCell::Int(i)) => Some(Value::Float(*i as f64)),
            (ColumnType::Float, RawCell::Float(f)) => f.is_finite().then_some(Value::Float(*f)),
            (ColumnType::Float, RawCell::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),

            (ColumnType::DateTime, RawCell::DateTime(dt)) => Some(Value::DateTime(*dt)),
            (ColumnType::DateTime, RawCell::Text(s)) => parse_datetime(s).map(Value::DateTime),

            (ColumnType::Boolean, RawCell::Bool(b)) => Some(Value::Boolean(*b)),

            _ => None,
        }
    }

    fn accepts(self, cell: &RawCell) -> bool {
        self.convert(cell).is_some()
    }
}

fn whole_float(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay strictly inside the range
    if f.fract() == 0.0 && f.abs() < 9.0e18 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_decimal(s: &str) -> Option<BigDecimal> {
    let s = s.trim();
    // Plain positional notation only: exponents go to Float, digit separators to text
    if s.contains(['e', 'E', '_']) {
        return None;
    }
    BigDecimal::from_str(s).ok()
}

/// Parse the date/time spellings accepted in text cells
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Guess a type per column
///
/// With `strict` every row votes; otherwise only the first [`SAMPLE_ROWS`].
pub fn guess_types(rows: &[Vec<RawCell>], width: usize, strict: bool) -> Vec<ColumnType> {
    let sample = if strict {
        rows.len()
    } else {
        rows.len().min(SAMPLE_ROWS)
    };

    let mut alive = vec![[true; CANDIDATES.len()]; width];

    for row in &rows[..sample] {
        for (cell, column) in row.iter().zip(alive.iter_mut()) {
            if cell.is_empty() {
                continue;
            }
            for (candidate, still_alive) in CANDIDATES.iter().zip(column.iter_mut()) {
                if *still_alive && !candidate.accepts(cell) {
                    *still_alive = false;
                }
            }
        }
    }

    alive
        .iter()
        .map(|column| {
            CANDIDATES
                .iter()
                .zip(column.iter())
                .find(|(_, alive)| **alive)
                .map(|(candidate, _)| *candidate)
                .unwrap_or(ColumnType::String)
        })
        .collect()
}

/// Column ids from a header row: trimmed, BOM removed, blanks named
/// `column_N`, duplicates suffixed `_2`, `_3`, ...
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());

    for (i, header) in raw.iter().enumerate() {
        let trimmed = header.trim_start_matches('\u{feff}').trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", i + 1)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        seen.push(candidate);
    }

    seen
}

/// Type every cell and assemble the parsed table
///
/// Cells that do not fit their column's type (only possible when guessing
/// was not strict) are kept as text.
pub fn build_table(headers: &[String], rows: Vec<Vec<RawCell>>, strict: bool) -> Result<ParsedTable> {
    if headers.is_empty() {
        return Err(JobError::parse("no header row found"));
    }

    let ids = normalize_headers(headers);
    let width = ids.len();
    let types = guess_types(&rows, width, strict);
    let columns: Arc<[String]> = ids.iter().cloned().collect();

    let records = rows
        .into_iter()
        .map(|row| {
            let values = row
                .iter()
                .take(width)
                .zip(types.iter())
                .map(|(cell, ty)| ty.convert(cell).unwrap_or_else(|| cell.to_text()))
                .collect();
            Record::new(columns.clone(), values)
        })
        .collect();

    let fields = ids
        .into_iter()
        .zip(types.iter())
        .map(|(id, ty)| ParsedField::new(id, ty.name()))
        .collect();

    Ok(ParsedTable { fields, records })
}

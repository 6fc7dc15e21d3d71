//! Tabular format dispatch
//!
//! Picks a parser from the server-reported content type and the resource's
//! declared format. Parsers are plain implementations of [`TabularParser`],
//! so another decoder can be added without touching the pipeline.

use serde::Serialize;

use crate::error::{JobError, Result};
use crate::record::Record;

pub mod csv;
pub mod excel;
pub mod infer;

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// One parsed column as reported by a parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedField {
    pub id: String,
    /// Parser-native type name ("Integer", "DateTime", ...)
    pub type_name: String,
}

impl ParsedField {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
        }
    }
}

/// Parser output: column metadata plus rows in file order
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub fields: Vec<ParsedField>,
    pub records: Vec<Record>,
}

/// Excel container flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelType {
    /// Legacy binary workbook (.xls)
    Xls,
    /// Office Open XML workbook (.xlsx)
    Xlsx,
}

/// Arguments handed to a parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Only type a column when every cell fits
    pub strict_type_guess: bool,
    pub excel_type: ExcelType,
    pub delimiter: u8,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_type_guess: true,
            excel_type: ExcelType::Xls,
            delimiter: b',',
        }
    }
}

/// Parser capability
pub trait TabularParser: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Decode `data` into typed rows and column metadata
    fn parse(&self, data: &[u8], options: &ParseOptions) -> Result<ParsedTable>;
}

/// Which parser handles a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Excel,
    Csv,
}

static EXCEL_PARSER: ExcelParser = ExcelParser;
static CSV_PARSER: CsvParser = CsvParser;

impl ParserKind {
    pub fn parser(self) -> &'static dyn TabularParser {
        match self {
            ParserKind::Excel => &EXCEL_PARSER,
            ParserKind::Csv => &CSV_PARSER,
        }
    }
}

/// Format families, in matching order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    ExcelBinary,
    ExcelXml,
    Csv,
    Tsv,
}

const FAMILIES: [FormatFamily; 4] = [
    FormatFamily::ExcelBinary,
    FormatFamily::ExcelXml,
    FormatFamily::Csv,
    FormatFamily::Tsv,
];

impl FormatFamily {
    /// Content types and format names belonging to this family
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            FormatFamily::ExcelBinary => &[
                "xls",
                "application/ms-excel",
                "application/xls",
                "application/vnd.ms-excel",
            ],
            FormatFamily::ExcelXml => &[
                "xlsx",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ],
            FormatFamily::Csv => &["csv", "text/csv", "text/comma-separated-values"],
            FormatFamily::Tsv => &["tsv", "text/tsv", "text/tab-separated-values"],
        }
    }

    fn matches(self, content_type: &str, format: &str) -> bool {
        let aliases = self.aliases();
        aliases.contains(&content_type) || aliases.contains(&format)
    }

    /// Parser and invocation arguments for this family
    pub fn parser_choice(self) -> ParserChoice {
        let defaults = ParseOptions::default();
        match self {
            FormatFamily::ExcelBinary => ParserChoice {
                kind: ParserKind::Excel,
                options: defaults,
            },
            FormatFamily::ExcelXml => ParserChoice {
                kind: ParserKind::Excel,
                options: ParseOptions {
                    excel_type: ExcelType::Xlsx,
                    ..defaults
                },
            },
            FormatFamily::Csv => ParserChoice {
                kind: ParserKind::Csv,
                options: defaults,
            },
            FormatFamily::Tsv => ParserChoice {
                kind: ParserKind::Csv,
                options: ParseOptions {
                    delimiter: b'\t',
                    ..defaults
                },
            },
        }
    }
}

/// A parser together with the arguments to call it with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserChoice {
    pub kind: ParserKind,
    pub options: ParseOptions,
}

impl ParserChoice {
    pub fn parse(&self, data: &[u8]) -> Result<ParsedTable> {
        self.kind.parser().parse(data, &self.options)
    }
}

/// Strip parameters from a Content-Type header value
pub fn mime_type(content_type: &str) -> String {
    match content_type.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase(),
    }
}

/// Pick a parser for a resource
///
/// `content_type` is the bare MIME type; `format` is the declared resource
/// format and is compared case-insensitively.
pub fn get_parser(format: &str, content_type: &str) -> Result<ParserChoice> {
    let lowered = format.trim().to_lowercase();

    FAMILIES
        .iter()
        .find(|family| family.matches(content_type, &lowered))
        .map(|family| family.parser_choice())
        .ok_or_else(|| JobError::unsupported_format(content_type, format))
}

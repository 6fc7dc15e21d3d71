//! Parsed rows and their datastore wire encoding
//!
//! Timestamps go over the wire as ISO-8601 strings and decimals as their
//! exact base-10 text, so no value is ever rounded through a binary float.

use bigdecimal::BigDecimal;
use chrono::{NaiveDateTime, Timelike};
use datapusher_common::Field;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{JobError, Result};

/// A single typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::DateTime(dt) => serializer.serialize_str(&format_timestamp(dt)),
        }
    }
}

/// ISO-8601 without offset; microseconds only when present
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// One row, keyed by the column ids it was parsed under
///
/// All records of a table share the same column list, so key order always
/// matches field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// Build a record; short rows are padded with nulls and long rows cut to
    /// the column count.
    pub fn new(columns: Arc<[String]>, mut values: Vec<Value>) -> Self {
        values.resize(columns.len(), Value::Null);
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Body of a `datastore_create` call
#[derive(Debug, Serialize)]
pub struct DatastoreCreateRequest<'a> {
    pub resource_id: &'a str,
    pub fields: &'a [Field],
    pub records: &'a [Record],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<&'a str>,
}

impl DatastoreCreateRequest<'_> {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| JobError::parse(format!("could not encode records: {}", e)))
    }
}

//! Catalog and datastore data model
//!
//! These types mirror the JSON objects exchanged with a CKAN catalog and its
//! datastore extension.

use serde::{Deserialize, Serialize};

/// Sentinel written to `webstore_url` once a resource has been pushed.
pub const WEBSTORE_ACTIVE: &str = "active";

/// A catalog resource (one file tracked by a dataset).
///
/// Only the attributes the pipeline reads or writes are typed; everything else
/// the catalog returns is kept in `extra` so the full object can be posted back
/// on `resource_update` without losing fields.
///
/// # Examples
///
/// ```rust
/// use datapusher_common::types::Resource;
///
/// let json = r#"{"id": "abc", "url": "http://x/y.csv", "format": "CSV", "size": 12}"#;
/// let resource: Resource = serde_json::from_str(json).unwrap();
/// assert_eq!(resource.format, "CSV");
/// assert_eq!(resource.extra["size"], 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier (also the datastore table name)
    pub id: String,

    /// Source URL the data is downloaded from
    #[serde(default)]
    pub url: String,

    /// Declared format (e.g. "CSV", "xlsx"), free text
    #[serde(default)]
    pub format: String,

    /// Display name, used to derive a datastore alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Owning dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webstore_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webstore_last_updated: Option<String>,

    /// Any other attributes, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Resource {
    /// Minimal resource, mostly useful for tests and fixtures
    pub fn new(id: impl Into<String>, url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            format: format.into(),
            name: None,
            package_id: None,
            webstore_url: None,
            webstore_last_updated: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the resource as synchronized at `timestamp` (ISO-8601)
    pub fn mark_active(&mut self, timestamp: String) {
        self.webstore_url = Some(WEBSTORE_ACTIVE.to_string());
        self.webstore_last_updated = Some(timestamp);
    }
}

/// Field types the datastore understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Text,
    Numeric,
    Float,
    Timestamp,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Text => "text",
            TargetType::Numeric => "numeric",
            TargetType::Float => "float",
            TargetType::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A datastore column definition.
///
/// `type` serializes as `null` when absent; the datastore then picks its
/// default type for the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: Option<TargetType>,
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: Option<TargetType>) -> Self {
        Self {
            id: id.into(),
            field_type,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field_type {
            Some(t) => write!(f, "{}:{}", self.id, t),
            None => write!(f, "{}:auto", self.id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_roundtrip_keeps_unknown_attributes() {
        let raw = json!({
            "id": "res-1",
            "url": "http://example.com/data.csv",
            "format": "CSV",
            "name": "Sales 2020",
            "package_id": "pkg-9",
            "mimetype": "text/csv",
            "position": 0
        });

        let resource: Resource = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(resource.name.as_deref(), Some("Sales 2020"));
        assert_eq!(resource.extra.len(), 2);

        let back = serde_json::to_value(&resource).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_mark_active() {
        let mut resource = Resource::new("r", "http://x", "csv");
        resource.mark_active("2021-03-04T05:06:07".to_string());

        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["webstore_url"], "active");
        assert_eq!(value["webstore_last_updated"], "2021-03-04T05:06:07");
    }

    #[test]
    fn test_field_serialization() {
        let typed = Field::new("price", Some(TargetType::Numeric));
        assert_eq!(
            serde_json::to_value(&typed).unwrap(),
            json!({"id": "price", "type": "numeric"})
        );

        let untyped = Field::new("flag", None);
        assert_eq!(
            serde_json::to_value(&untyped).unwrap(),
            json!({"id": "flag", "type": null})
        );
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::new("at", Some(TargetType::Timestamp)).to_string(), "at:timestamp");
        assert_eq!(Field::new("x", None).to_string(), "x:auto");
    }
}

//! CKAN action API envelopes

use serde::{Deserialize, Serialize};

/// Envelope wrapping every CKAN action response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Body of `resource_show`
#[derive(Debug, Clone, Serialize)]
pub struct ResourceShowRequest<'a> {
    pub id: &'a str,
}

/// Body of `datastore_delete`
#[derive(Debug, Clone, Serialize)]
pub struct DatastoreDeleteRequest<'a> {
    pub resource_id: &'a str,
}

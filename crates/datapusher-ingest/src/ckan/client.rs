//! HTTP client for the CKAN catalog and its datastore
//!
//! Every call is a JSON POST. All calls but `resource_show` carry the API key
//! in the `Authorization` header.

use chrono::Utc;
use datapusher_common::{Field, Resource};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, instrument};

use super::endpoints::{self, DATASTORE_CREATE, DATASTORE_DELETE, RESOURCE_SHOW, RESOURCE_UPDATE};
use super::response::{check_response, ResponseCheck};
use super::types::{ActionResponse, DatastoreDeleteRequest, ResourceShowRequest};
use crate::error::{JobError, Result};
use crate::record::{format_timestamp, DatastoreCreateRequest, Record};

/// Origin label for catalog calls
pub const CATALOG: &str = "CKAN";

/// Origin label for datastore writes
pub const DATASTORE: &str = "CKAN DataStore";

/// Accepted by `datastore_delete`: a missing table is not an error
pub const DELETE_GOOD_STATUS: &[u16] = &[200, 201, 404];

const DELETE_FAILED: &str = "Deleting existing datastore failed.";

/// Client bound to one catalog and one API key
#[derive(Debug, Clone)]
pub struct CkanClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CkanClient {
    pub fn new(client: Client, ckan_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: endpoints::normalize_base_url(ckan_url),
            api_key: api_key.into(),
        }
    }

    /// Normalized catalog address
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(
        &self,
        url: &str,
        body: String,
        authorized: bool,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if authorized {
            request = request.header(AUTHORIZATION, &self.api_key);
        }

        request.send().await
    }

    /// Fetch a resource's metadata
    #[instrument(skip(self))]
    pub async fn resource_show(&self, resource_id: &str) -> Result<Resource> {
        let url = endpoints::action_url(&self.base_url, RESOURCE_SHOW);
        let body = encode(&ResourceShowRequest { id: resource_id })?;

        let response = self
            .post(&url, body, false)
            .await
            .map_err(|e| JobError::transport(format!("{} request failed at: {}: {}", CATALOG, url, e)))?;

        let text = check_response(response, &url, &ResponseCheck::new(CATALOG)).await?;

        let envelope: ActionResponse<Resource> = serde_json::from_str(&text).map_err(|e| {
            JobError::bad_response(format!("{} returned an unreadable resource at: {}: {}", CATALOG, url, e))
        })?;

        match envelope.result {
            Some(resource) => Ok(resource),
            None if !envelope.success => Err(JobError::bad_response(format!(
                "{} reported failure at: {}: {}",
                CATALOG,
                url,
                envelope.error.unwrap_or_default()
            ))),
            None => Err(JobError::bad_response(format!("{} returned no resource at: {}", CATALOG, url))),
        }
    }

    /// Drop the datastore table of a resource, if there is one
    ///
    /// Transport failures are reported without the underlying error text.
    #[instrument(skip(self))]
    pub async fn datastore_delete(&self, resource_id: &str) -> Result<()> {
        let url = endpoints::action_url(&self.base_url, DATASTORE_DELETE);
        let body = encode(&DatastoreDeleteRequest { resource_id })?;

        let response = self.post(&url, body, true).await.map_err(|e| {
            debug!(error = %e, "datastore_delete transport failure");
            JobError::transport(DELETE_FAILED)
        })?;

        let check = ResponseCheck::new(CATALOG)
            .good_status(DELETE_GOOD_STATUS)
            .ignore_no_success();

        match check_response(response, &url, &check).await {
            Ok(_) => Ok(()),
            Err(JobError::Transport(detail)) => {
                debug!(error = %detail, "datastore_delete response could not be read");
                Err(JobError::transport(DELETE_FAILED))
            },
            Err(e) => Err(e),
        }
    }

    /// Create the datastore table (first call) or append records to it
    #[instrument(skip_all, fields(resource_id = %resource.id, records = records.len()))]
    pub async fn datastore_create(
        &self,
        resource: &Resource,
        fields: &[Field],
        records: &[Record],
    ) -> Result<()> {
        let url = endpoints::action_url(&self.base_url, DATASTORE_CREATE);
        let alias = datastore_alias(resource);

        let body = DatastoreCreateRequest {
            resource_id: &resource.id,
            fields,
            records,
            aliases: alias.as_deref(),
        }
        .encode()?;

        let response = self
            .post(&url, body, true)
            .await
            .map_err(|e| JobError::transport(format!("{} request failed at: {}: {}", DATASTORE, url, e)))?;

        check_response(response, &url, &ResponseCheck::new(DATASTORE)).await?;

        Ok(())
    }

    /// Mark the resource as pushed and post it back
    #[instrument(skip_all, fields(resource_id = %resource.id))]
    pub async fn resource_update(&self, resource: &mut Resource) -> Result<()> {
        resource.mark_active(format_timestamp(&Utc::now().naive_utc()));

        let url = endpoints::action_url(&self.base_url, RESOURCE_UPDATE);
        let body = encode(&*resource)?;

        let response = self
            .post(&url, body, true)
            .await
            .map_err(|e| JobError::transport(format!("{} request failed at: {}: {}", CATALOG, url, e)))?;

        check_response(response, &url, &ResponseCheck::new(CATALOG)).await?;

        Ok(())
    }
}

/// Datastore alias for a resource: the slug of its name, unless that slug is
/// the resource id itself
pub fn datastore_alias(resource: &Resource) -> Option<String> {
    let name = resource.name.as_deref().filter(|n| !n.trim().is_empty())?;
    let alias = slug::slugify(name);

    (!alias.is_empty() && alias != resource.id).then_some(alias)
}

fn encode<T: serde::Serialize + ?Sized>(body: &T) -> Result<String> {
    serde_json::to_string(body).map_err(|e| JobError::parse(format!("could not encode request: {}", e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_from_name() {
        let resource = Resource::new("1234-abcd", "http://x", "csv").with_name("My Sales Data 2020");
        assert_eq!(datastore_alias(&resource).as_deref(), Some("my-sales-data-2020"));
    }

    #[test]
    fn test_no_alias_when_slug_is_the_id() {
        let resource = Resource::new("sales-data", "http://x", "csv").with_name("Sales Data");
        assert_eq!(datastore_alias(&resource), None);
    }

    #[test]
    fn test_no_alias_without_name() {
        assert_eq!(datastore_alias(&Resource::new("r", "http://x", "csv")), None);
        assert_eq!(
            datastore_alias(&Resource::new("r", "http://x", "csv").with_name("  ")),
            None
        );
    }

    #[test]
    fn test_client_normalizes_base_url() {
        let client = CkanClient::new(Client::new(), "ckan.example.com/", "key");
        assert_eq!(client.base_url(), "http://ckan.example.com");
    }
}

//! Resource download with size and time limits

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::PushConfig;
use crate::error::{JobError, Result};
use crate::format::mime_type;

/// Downloaded resource body
#[derive(Debug, Clone, Default)]
pub struct FetchedResource {
    pub data: Vec<u8>,
    /// Bare MIME type reported by the server, empty when absent
    pub content_type: String,
}

/// Build the HTTP client used for resource downloads
pub fn download_client(config: &PushConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.download_timeout())
        .read_timeout(config.download_timeout())
        .build()
        .map_err(|e| JobError::config(format!("could not build download client: {}", e)))
}

/// Download `url`, enforcing the configured size ceiling both on the declared
/// `Content-Length` and on the bytes actually received
#[instrument(skip(client, config))]
pub async fn fetch_resource(client: &Client, url: &str, config: &PushConfig) -> Result<FetchedResource> {
    let timeout_secs = config.download_timeout_secs;
    let max = config.max_content_length;

    let response = tokio::time::timeout(config.download_timeout(), client.get(url).send())
        .await
        .map_err(|_| JobError::Timeout(timeout_secs))?
        .map_err(|e| request_error(e, url, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        return Err(JobError::bad_response(format!(
            "Invalid HTTP response: HTTP Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    if let Some(size) = response.content_length() {
        if size > max {
            return Err(JobError::TooLarge { size, max });
        }
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(mime_type)
        .unwrap_or_default();

    let mut data = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| request_error(e, url, timeout_secs))?;
        append_within_limit(&mut data, &chunk, max)?;
    }

    debug!(bytes = data.len(), content_type = %content_type, "Downloaded resource");

    Ok(FetchedResource { data, content_type })
}

/// Append `chunk` to `buf` unless the result would exceed `max` bytes
pub fn append_within_limit(buf: &mut Vec<u8>, chunk: &[u8], max: u64) -> Result<()> {
    let size = (buf.len() + chunk.len()) as u64;
    if size > max {
        return Err(JobError::TooLarge { size, max });
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

fn request_error(err: reqwest::Error, url: &str, timeout_secs: u64) -> JobError {
    if err.is_timeout() {
        JobError::Timeout(timeout_secs)
    } else {
        JobError::transport(format!("Could not fetch {}: {}", url, err))
    }
}

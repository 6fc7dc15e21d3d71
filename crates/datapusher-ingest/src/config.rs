//! Pipeline configuration
//!
//! Limits applied to every push (DATAPUSHER_* environment variables).

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::{JobError, Result};

// ============================================================================
// Pipeline Constants
// ============================================================================

/// Connect/read timeout for the resource download, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Largest resource we agree to download (10 MiB).
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 10_485_760;

/// Records sent per `datastore_create` call.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

/// User agent sent to catalogs and resource hosts.
pub const DEFAULT_USER_AGENT: &str = concat!("datapusher/", env!("CARGO_PKG_VERSION"));

/// Push pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
    /// Connect/read timeout for the resource download
    pub download_timeout_secs: u64,
    /// Download ceiling in bytes
    pub max_content_length: u64,
    /// Records per upload chunk
    pub chunk_size: usize,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PushConfig {
    /// Load configuration from a `.env` file (if any) and the environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            download_timeout_secs: env_or("DATAPUSHER_DOWNLOAD_TIMEOUT_SECS", DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            max_content_length: env_or("DATAPUSHER_MAX_CONTENT_LENGTH", DEFAULT_MAX_CONTENT_LENGTH),
            chunk_size: env_or("DATAPUSHER_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            user_agent: std::env::var("DATAPUSHER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.download_timeout_secs == 0 {
            return Err(JobError::config("download timeout must be greater than 0"));
        }

        if self.max_content_length == 0 {
            return Err(JobError::config("max content length must be greater than 0"));
        }

        if self.chunk_size == 0 {
            return Err(JobError::config("chunk size must be greater than 0"));
        }

        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn chunk_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.chunk_size)
            .ok_or_else(|| JobError::config("chunk size must be greater than 0"))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = PushConfig::default();
        assert_eq!(config.download_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_content_length, 10_485_760);
        assert_eq!(config.chunk_size().unwrap().get(), 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("DATAPUSHER_CHUNK_SIZE", "100");
        std::env::set_var("DATAPUSHER_DOWNLOAD_TIMEOUT_SECS", "5");

        let config = PushConfig::from_env().unwrap();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.download_timeout_secs, 5);
        assert_eq!(config.max_content_length, DEFAULT_MAX_CONTENT_LENGTH);

        std::env::remove_var("DATAPUSHER_CHUNK_SIZE");
        std::env::remove_var("DATAPUSHER_DOWNLOAD_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_chunk_size() {
        std::env::set_var("DATAPUSHER_CHUNK_SIZE", "0");
        let err = PushConfig::from_env().unwrap_err();
        assert!(matches!(err, JobError::Config(_)));
        std::env::remove_var("DATAPUSHER_CHUNK_SIZE");
    }

    #[test]
    fn test_validate() {
        let config = PushConfig {
            max_content_length: 0,
            ..PushConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Datapusher ingest library
//!
//! Moves a tabular catalog resource (CSV, TSV, XLS, XLSX) into the CKAN
//! datastore: download it, infer a typed schema, replace the datastore table
//! in fixed-size chunks and mark the resource as active.
//!
//! # Example
//!
//! ```no_run
//! use datapusher_ingest::{DataPusher, PushConfig, TracingTaskLog};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pusher = DataPusher::new(PushConfig::from_env()?)?;
//!     let input = json!({
//!         "metadata": {"resource_id": "abc", "ckan_url": "http://localhost:5000"},
//!         "api_key": "secret"
//!     });
//!
//!     pusher
//!         .push_to_datastore("task-1", &input, false, &TracingTaskLog::new("task-1"))
//!         .await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod chunk;
pub mod ckan;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod jobs;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod task;

pub use config::PushConfig;
pub use error::{JobError, Result};
pub use jobs::{PushJob, PushStats};
pub use pipeline::{DataPusher, PipelineRun, PipelineState, PushOutcome};
pub use task::{MemoryTaskLog, TaskInput, TaskLog, TracingTaskLog};

//! Push job payload and run statistics
//!
//! `PushJob` is what a scheduler enqueues; `PushStats` is what a completed
//! push reports back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::{DataPusher, PushOutcome};
use crate::task::TaskLog;

/// One push request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushJob {
    /// Identifier used to tag log lines
    pub task_id: String,
    /// Raw task payload (`{"metadata": {...}, "api_key": ...}`)
    pub input: Value,
    /// Stop after schema detection, without writing records
    pub dry_run: bool,
    /// Timestamp when job was created
    pub created_at: DateTime<Utc>,
}

impl PushJob {
    /// Create a job with a fresh task id
    pub fn new(input: Value) -> Self {
        Self::with_task_id(Uuid::new_v4().to_string(), input)
    }

    pub fn with_task_id(task_id: impl Into<String>, input: Value) -> Self {
        Self {
            task_id: task_id.into(),
            input,
            dry_run: false,
            created_at: Utc::now(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute the job on `pusher`
    pub async fn run(&self, pusher: &DataPusher, log: &dyn TaskLog) -> Result<PushOutcome> {
        pusher
            .push_to_datastore(&self.task_id, &self.input, self.dry_run, log)
            .await
    }
}

/// Statistics collected during a push
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PushStats {
    /// Records sent to the datastore
    pub records_pushed: u64,
    /// `datastore_create` calls made
    pub chunks_sent: u64,
    /// Size of the downloaded resource
    pub bytes_downloaded: u64,
    /// Duration in seconds
    pub duration_secs: f64,
    /// Start time
    pub started_at: Option<DateTime<Utc>>,
    /// End time
    pub completed_at: Option<DateTime<Utc>>,
}

impl PushStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark stats as completed
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
        if let (Some(start), Some(end)) = (self.started_at, self.completed_at) {
            self.duration_secs = (end - start).num_milliseconds() as f64 / 1000.0;
        }
    }

    /// Count one sent chunk of `records` records
    pub fn add_chunk(&mut self, records: usize) {
        self.chunks_sent += 1;
        self.records_pushed += records as u64;
    }

    pub fn add_bytes(&mut self, bytes: usize) {
        self.bytes_downloaded += bytes as u64;
    }

    /// Calculate records per second
    pub fn records_per_second(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.records_pushed as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

//! Task input and the per-task log sink

use datapusher_common::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::error::{JobError, Result};

/// Validated push request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub resource_id: String,
    pub ckan_url: String,
    pub api_key: String,
}

impl TaskInput {
    pub fn new(
        resource_id: impl Into<String>,
        ckan_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            ckan_url: ckan_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Validate a raw task payload of the form
    /// `{"metadata": {"resource_id", "ckan_url"}, "api_key"}`
    pub fn from_value(input: &Value) -> Result<Self> {
        let metadata = input
            .get("metadata")
            .filter(|m| m.is_object())
            .ok_or_else(|| JobError::invalid_input("Metadata missing"))?;

        let resource_id =
            resource_id_of(metadata).ok_or_else(|| JobError::invalid_input("No id provided."))?;

        let ckan_url = non_empty_str(metadata, "ckan_url")
            .ok_or_else(|| JobError::invalid_input("No ckan_url provided."))?;

        let api_key = non_empty_str(input, "api_key")
            .ok_or_else(|| JobError::invalid_input("No CKAN API key provided"))?;

        Ok(Self::new(resource_id, ckan_url, api_key))
    }

    /// Raw task payload for this input
    pub fn to_value(&self) -> Value {
        json!({
            "metadata": {
                "resource_id": self.resource_id,
                "ckan_url": self.ckan_url,
            },
            "api_key": self.api_key,
        })
    }
}

/// A non-empty string id, or a non-zero numeric one in its decimal form
fn resource_id_of(metadata: &Value) -> Option<String> {
    match metadata.get("resource_id")? {
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Number(_) => None,
        _ => non_empty_str(metadata, "resource_id").map(str::to_string),
    }
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Destination for the human-readable progress of one task
pub trait TaskLog: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards task log lines to `tracing`, tagged with the task id
#[derive(Debug, Clone)]
pub struct TracingTaskLog {
    task_id: String,
}

impl TracingTaskLog {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

impl TaskLog for TracingTaskLog {
    fn log(&self, level: LogLevel, message: &str) {
        let task_id = self.task_id.as_str();
        match level {
            LogLevel::Trace => trace!(task_id, "{}", message),
            LogLevel::Debug => debug!(task_id, "{}", message),
            LogLevel::Info => info!(task_id, "{}", message),
            LogLevel::Warn => warn!(task_id, "{}", message),
            LogLevel::Error => error!(task_id, "{}", message),
        }
    }
}

/// One collected log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Keeps task log lines in memory
#[derive(Debug, Default)]
pub struct MemoryTaskLog {
    lines: Mutex<Vec<LogLine>>,
}

impl MemoryTaskLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Messages only, in order
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|line| line.message).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.message.contains(needle))
    }
}

impl TaskLog for MemoryTaskLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(LogLine {
                level,
                message: message.to_string(),
            });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn message(input: Value) -> String {
        TaskInput::from_value(&input).unwrap_err().message()
    }

    #[test]
    fn test_valid_input() {
        let input = json!({
            "metadata": {"resource_id": "abc", "ckan_url": "http://ckan"},
            "api_key": "secret"
        });

        let task = TaskInput::from_value(&input).unwrap();
        assert_eq!(task, TaskInput::new("abc", "http://ckan", "secret"));
        assert_eq!(task.to_value(), input);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(message(json!({"api_key": "k"})), "Metadata missing");
        assert_eq!(message(json!({"metadata": "nope", "api_key": "k"})), "Metadata missing");
        assert_eq!(
            message(json!({"metadata": {"ckan_url": "http://ckan"}, "api_key": "k"})),
            "No id provided."
        );
        assert_eq!(
            message(json!({"metadata": {"resource_id": "abc"}, "api_key": "k"})),
            "No ckan_url provided."
        );
        assert_eq!(
            message(json!({"metadata": {"resource_id": "abc", "ckan_url": "http://ckan"}})),
            "No CKAN API key provided"
        );
        assert_eq!(
            message(json!({
                "metadata": {"resource_id": "abc", "ckan_url": "http://ckan"},
                "api_key": ""
            })),
            "No CKAN API key provided"
        );
    }

    #[test]
    fn test_numeric_resource_id() {
        let task = TaskInput::from_value(&json!({
            "metadata": {"resource_id": 4521, "ckan_url": "http://ckan"},
            "api_key": "secret"
        }))
        .unwrap();
        assert_eq!(task.resource_id, "4521");

        assert_eq!(
            message(json!({
                "metadata": {"resource_id": 0, "ckan_url": "http://ckan"},
                "api_key": "k"
            })),
            "No id provided."
        );
        assert_eq!(
            message(json!({
                "metadata": {"resource_id": true, "ckan_url": "http://ckan"},
                "api_key": "k"
            })),
            "No id provided."
        );
    }

    #[test]
    fn test_memory_log_collects_in_order() {
        let log = MemoryTaskLog::new();
        log.info("first");
        log.error("second");

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, LogLevel::Info);
        assert_eq!(lines[1].level, LogLevel::Error);
        assert_eq!(log.messages(), ["first", "second"]);
        assert!(log.contains("sec"));
    }
}

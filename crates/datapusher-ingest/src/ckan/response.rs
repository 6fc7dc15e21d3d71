//! CKAN response validation
//!
//! Each action accepts its own set of status codes. Anything else is fatal,
//! except that a tolerant check lets a non-success JSON body through (a
//! delete of something that is already gone).

use serde_json::{Map, Value};

use crate::error::{JobError, Result};

/// Status codes accepted when an action does not say otherwise
pub const DEFAULT_GOOD_STATUS: &[u16] = &[200, 201];

/// Raw response text is cut to this many characters in error messages
pub const MAX_RAW_BODY_CHARS: usize = 200;

/// Rendered JSON bodies are cut to this many characters in error messages
pub const MAX_JSON_BODY_CHARS: usize = 1000;

/// How a response from one action should be judged
#[derive(Debug, Clone, Copy)]
pub struct ResponseCheck<'a> {
    /// Short origin label used in messages ("CKAN", "CKAN DataStore")
    pub who: &'a str,
    pub good_status: &'a [u16],
    pub ignore_no_success: bool,
}

impl<'a> ResponseCheck<'a> {
    pub fn new(who: &'a str) -> Self {
        Self {
            who,
            good_status: DEFAULT_GOOD_STATUS,
            ignore_no_success: false,
        }
    }

    pub fn good_status(mut self, codes: &'a [u16]) -> Self {
        self.good_status = codes;
        self
    }

    pub fn ignore_no_success(mut self) -> Self {
        self.ignore_no_success = true;
        self
    }
}

/// Judge a response from its parts
///
/// `status` is `None` when the transport produced no status code at all.
pub fn check_status(
    status: Option<u16>,
    reason: &str,
    body: &str,
    url: &str,
    check: &ResponseCheck<'_>,
) -> Result<()> {
    let Some(code) = status.filter(|c| *c != 0) else {
        return Err(JobError::bad_response(format!(
            "{} bad response with no status code at: {}",
            check.who, url
        )));
    };

    if check.good_status.contains(&code) {
        return Ok(());
    }

    let rendered = match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            // only a JSON object can be an envelope reporting non-success
            let unsuccessful = json
                .as_object()
                .is_some_and(|envelope| !reports_success(envelope));
            if check.ignore_no_success && unsuccessful {
                return Ok(());
            }
            let pretty = serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string());
            truncate_chars(&pretty, MAX_JSON_BODY_CHARS)
        },
        Err(_) => truncate_chars(body, MAX_RAW_BODY_CHARS),
    };

    Err(JobError::bad_response(format!(
        "{} bad response. Status code: {} {}. At: {}. Response: {}",
        check.who, code, reason, url, rendered
    )))
}

/// Read the body of `response` and judge it; returns the body text on success
pub async fn check_response(
    response: reqwest::Response,
    url: &str,
    check: &ResponseCheck<'_>,
) -> Result<String> {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("");

    let body = response.text().await.map_err(|e| {
        JobError::transport(format!(
            "{} response body could not be read at: {}: {}",
            check.who, url, e
        ))
    })?;

    check_status(Some(status.as_u16()), reason, &body, url, check)?;

    Ok(body)
}

/// Whether a CKAN envelope's `success` member is truthy
fn reports_success(envelope: &Map<String, Value>) -> bool {
    match envelope.get("success") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const URL: &str = "http://ckan.example.com/api/3/action/datastore_create";

    fn delete_check() -> ResponseCheck<'static> {
        ResponseCheck::new("CKAN")
            .good_status(&[200, 201, 404])
            .ignore_no_success()
    }

    #[test]
    fn test_good_status_passes() {
        let check = ResponseCheck::new("CKAN");
        assert!(check_status(Some(200), "OK", "not even json", URL, &check).is_ok());
        assert!(check_status(Some(201), "Created", "", URL, &check).is_ok());
    }

    #[test]
    fn test_missing_status_is_fatal() {
        let err = check_status(None, "", "", URL, &ResponseCheck::new("CKAN")).unwrap_err();
        assert_eq!(
            err.message(),
            format!("CKAN bad response with no status code at: {}", URL)
        );
    }

    #[test]
    fn test_delete_404_passes_regardless_of_body() {
        for body in ["", "<html>gone</html>", r#"{"success": true}"#, r#"{"success": false}"#] {
            assert!(check_status(Some(404), "Not Found", body, URL, &delete_check()).is_ok());
        }
    }

    #[test]
    fn test_tolerant_check_accepts_non_success_body() {
        let body = r#"{"success": false, "error": {"message": "Not found: Resource"}}"#;
        assert!(check_status(Some(409), "Conflict", body, URL, &delete_check()).is_ok());
    }

    #[test]
    fn test_tolerant_check_still_rejects_success_body() {
        let body = r#"{"success": true}"#;
        let err = check_status(Some(500), "Internal Server Error", body, URL, &delete_check())
            .unwrap_err();
        assert!(err.message().contains("Status code: 500"));
    }

    #[test]
    fn test_tolerant_check_rejects_unparsable_body() {
        let err = check_status(Some(500), "Internal Server Error", "oops", URL, &delete_check())
            .unwrap_err();
        assert!(err.message().ends_with("Response: oops"));
    }

    #[test]
    fn test_json_failure_message() {
        let body = r#"{"success": false, "error": {"message": "boom"}}"#;
        let err = check_status(
            Some(500),
            "Internal Server Error",
            body,
            URL,
            &ResponseCheck::new("CKAN DataStore"),
        )
        .unwrap_err();

        let message = err.message();
        assert!(matches!(err, JobError::BadResponse(_)));
        assert!(message.starts_with("CKAN DataStore bad response. Status code: 500 Internal Server Error."));
        assert!(message.contains(URL));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_raw_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = check_status(Some(502), "Bad Gateway", &body, URL, &ResponseCheck::new("CKAN"))
            .unwrap_err();

        let message = err.message();
        let snippet = message.rsplit("Response: ").next().unwrap();
        assert_eq!(snippet.len(), MAX_RAW_BODY_CHARS);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn test_tolerant_check_rejects_non_envelope_json() {
        for body in ["null", r#""Internal Server Error""#, "[1, 2]", "42"] {
            let err = check_status(Some(500), "Internal Server Error", body, URL, &delete_check())
                .unwrap_err();
            assert!(matches!(err, JobError::BadResponse(_)));
            assert!(err.message().contains("Status code: 500"), "body {} was tolerated", body);
        }
    }

    #[test]
    fn test_tolerant_check_accepts_envelope_without_success() {
        let body = r#"{"error": {"message": "Not found"}}"#;
        assert!(check_status(Some(409), "Conflict", body, URL, &delete_check()).is_ok());
    }

    fn envelope(json: Value) -> Map<String, Value> {
        json.as_object().cloned().unwrap()
    }

    #[test]
    fn test_success_truthiness() {
        assert!(reports_success(&envelope(serde_json::json!({"success": true}))));
        assert!(reports_success(&envelope(serde_json::json!({"success": 1}))));
        assert!(!reports_success(&envelope(serde_json::json!({"success": 0}))));
        assert!(!reports_success(&envelope(serde_json::json!({"success": null}))));
        assert!(!reports_success(&envelope(serde_json::json!({}))));
        assert!(!reports_success(&envelope(serde_json::json!({"success": []}))));
    }
}

//! Tests for the CKAN catalog client against a mock server

use datapusher_common::{Field, Resource, TargetType};
use datapusher_ingest::ckan::CkanClient;
use datapusher_ingest::record::{Record, Value};
use datapusher_ingest::JobError;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> CkanClient {
    CkanClient::new(Client::new(), &server.uri(), "secret")
}

#[tokio::test]
async fn test_resource_show_decodes_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_show"))
        .and(body_json(json!({"id": "res-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {
                "id": "res-1",
                "url": "http://files.example.com/a.xlsx",
                "format": "XLSX",
                "name": "Budget",
                "mimetype": "application/octet-stream"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = client(&server).resource_show("res-1").await.unwrap();

    assert_eq!(resource.id, "res-1");
    assert_eq!(resource.format, "XLSX");
    assert_eq!(resource.name.as_deref(), Some("Budget"));
    assert_eq!(resource.extra["mimetype"], "application/octet-stream");
}

#[tokio::test]
async fn test_resource_show_without_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let err = client(&server).resource_show("res-1").await.unwrap_err();
    assert!(matches!(err, JobError::BadResponse(_)));
}

#[tokio::test]
async fn test_resource_show_reports_envelope_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"__type": "Not Found Error", "message": "Resource was not found."}
        })))
        .mount(&server)
        .await;

    let err = client(&server).resource_show("res-1").await.unwrap_err();
    assert!(matches!(err, JobError::BadResponse(_)));
    assert!(err.message().contains("CKAN reported failure at:"));
    assert!(err.message().contains("Resource was not found."));
}

#[tokio::test]
async fn test_delete_accepts_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/action/datastore_delete"))
        .and(header("Authorization", "secret"))
        .and(body_json(json!({"resource_id": "res-1"})))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).datastore_delete("res-1").await.unwrap();
}

#[tokio::test]
async fn test_delete_tolerates_unsuccessful_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/action/datastore_delete"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "error": {"message": "table is locked"}
        })))
        .mount(&server)
        .await;

    client(&server).datastore_delete("res-1").await.unwrap();
}

#[tokio::test]
async fn test_delete_server_error_with_success_body_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/action/datastore_delete"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let err = client(&server).datastore_delete("res-1").await.unwrap_err();
    assert!(err.message().starts_with("CKAN bad response. Status code: 500"));
}

#[tokio::test]
async fn test_delete_transport_failure_hides_detail() {
    // Nothing listens on port 1
    let client = CkanClient::new(Client::new(), "http://127.0.0.1:1", "secret");

    let err = client.datastore_delete("res-1").await.unwrap_err();
    assert!(matches!(err, JobError::Transport(_)));
    assert_eq!(err.message(), "Deleting existing datastore failed.");
}

#[tokio::test]
async fn test_create_request_body() {
    let server = MockServer::start().await;

    let columns: Arc<[String]> = vec!["id".to_string(), "label".to_string()].into();
    let records = vec![
        Record::new(columns.clone(), vec![Value::Integer(1), Value::Text("a".into())]),
        Record::new(columns, vec![Value::Integer(2)]),
    ];
    let fields = vec![
        Field::new("id", Some(TargetType::Numeric)),
        Field::new("label", Some(TargetType::Text)),
    ];
    let resource = Resource::new("res-1", "http://x/a.csv", "CSV").with_name("Label Counts");

    Mock::given(method("POST"))
        .and(path("/api/3/action/datastore_create"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "resource_id": "res-1",
            "fields": [
                {"id": "id", "type": "numeric"},
                {"id": "label", "type": "text"}
            ],
            "records": [
                {"id": 1, "label": "a"},
                {"id": 2, "label": null}
            ],
            "aliases": "label-counts"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .datastore_create(&resource, &fields, &records)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_resource_update_marks_active() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/action/resource_update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut resource = Resource::new("res-1", "http://x/a.csv", "CSV");
    client(&server).resource_update(&mut resource).await.unwrap();

    assert_eq!(resource.webstore_url.as_deref(), Some("active"));
    assert!(resource.webstore_last_updated.is_some());
}

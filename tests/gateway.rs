//! End-to-end tests for the gateway façade over a mock Fabric backend

use fabric_gateway::api::{
    CallerToken, GatewayResult, HttpExecutor, ItemUpdate, JobExecutionResult, MonitoringConfig, RequestDefaults,
};
use fabric_gateway::auth::EntraIdentityClient;
use fabric_gateway::config::AuthConfig;
use fabric_gateway::gateway::{Gateway, GatewayState};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn gateway(server: &MockServer, auth: AuthConfig) -> Gateway {
    let defaults = RequestDefaults {
        api_base_url: format!("{}/v1", server.uri()),
        ..RequestDefaults::default()
    };
    let executor = HttpExecutor::new(defaults, MonitoringConfig::default()).unwrap();
    let metrics = executor.metrics().clone();
    // Identity calls would hit the mock server too, so unexpected acquisitions fail loudly
    let identity = Arc::new(EntraIdentityClient::with_authority_host(&server.uri()).unwrap());
    let state = Arc::new(GatewayState::new(auth, identity));

    Gateway::new(state, Arc::new(executor)).with_metrics(metrics)
}

fn token() -> CallerToken {
    CallerToken::Explicit("caller-token".to_string())
}

#[tokio::test]
async fn test_list_items_with_type_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/workspaces/ws-1/items"))
        .and(query_param("type", "Notebook"))
        .and(header("authorization", "Bearer caller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default());
    let result = gateway.list_items(&token(), Some("ws-1"), Some("Notebook")).await;

    assert_eq!(result, GatewayResult::success(json!([{"id": "1"}])));
}

#[tokio::test]
async fn test_list_items_without_filter_omits_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/workspaces/ws-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default());
    let result = gateway.list_items(&token(), Some("ws-1"), None).await;
    assert!(result.is_success());

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn test_update_item_sends_partial_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/workspaces/ws-1/items/item-9"))
        .and(body_json(json!({"displayName": "X"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "item-9", "displayName": "X"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default());
    let updates = ItemUpdate {
        display_name: Some("X".to_string()),
        description: None,
    };
    let result = gateway.update_item(&token(), Some("ws-1"), "item-9", &updates).await;

    assert!(result.is_success());
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({"displayName": "X"}));
}

#[tokio::test]
async fn test_execute_job_returns_job_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workspaces/ws-1/items/nb1/jobs/instances"))
        .and(body_json(json!({"parameters": {"p": 1}})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "job-1",
            "status": "NotStarted",
            "createdDateTime": "2024-05-01T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default());
    let result = gateway
        .execute_job(&token(), Some("ws-1"), "nb1", Some(json!({"p": 1})))
        .await
        .decode::<JobExecutionResult>();

    assert_eq!(
        result,
        GatewayResult::success(JobExecutionResult {
            id: "job-1".to_string(),
            status: "NotStarted".to_string(),
            created_date_time: "2024-05-01T10:00:00Z".to_string(),
            completed_date_time: None,
            error: None,
        })
    );
}

#[tokio::test]
async fn test_get_job_status_and_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/workspaces/ws-1/items/jobs/instances/job-1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default());
    let result = gateway.get_job_status(&token(), Some("ws-1"), "job-1").await;

    assert_eq!(result, GatewayResult::error("HTTP 404: not found"));
}

#[tokio::test]
async fn test_simulation_makes_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default().with_default_scope_id("ws-default"));
    let env = CallerToken::UseEnvironmentAuth;
    let rename = ItemUpdate {
        display_name: Some("Renamed".to_string()),
        description: None,
    };

    let results = vec![
        gateway.list_items(&env, None, Some("Notebook")).await,
        gateway.get_item(&env, None, "item-1").await,
        gateway.create_item(&env, None, "Lakehouse", "lh", Some("sales")).await,
        gateway.delete_item(&env, None, "item-1").await,
        gateway.execute_job(&env, None, "nb1", None).await,
        gateway.update_item(&env, None, "item-1", &rename).await,
    ];

    for result in &results {
        let data = result.data().unwrap();
        assert!(data["message"].as_str().unwrap().starts_with("Simulation:"));
    }
    assert_eq!(results[0].data().unwrap()["params"], json!({"itemType": "Notebook"}));
    assert_eq!(
        results[2].data().unwrap()["params"],
        json!({"itemType": "Lakehouse", "displayName": "lh", "description": "sales"})
    );
    assert_eq!(results[4].data().unwrap()["params"], json!({"itemId": "nb1"}));
    assert_eq!(
        results[5].data().unwrap()["params"],
        json!({"itemId": "item-1", "updates": {"displayName": "Renamed"}})
    );
    assert_eq!(results[5].data().unwrap()["message"], "Simulation: update-item completed");

    assert_eq!(gateway.metrics().unwrap().total_requests(), 0);
}

#[tokio::test]
async fn test_default_workspace_used_when_none_given() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/workspaces/ws-default/items/item-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, AuthConfig::default().with_default_scope_id("ws-default"));
    let result = gateway.delete_item(&token(), None, "item-1").await;

    assert_eq!(result, GatewayResult::success(serde_json::Value::Null));
    assert_eq!(gateway.metrics().unwrap().total_requests(), 1);
}

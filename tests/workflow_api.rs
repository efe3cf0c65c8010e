//! Integration tests for the HTTP API surface: workflow/script/execution
//! lifecycle driven through the router exactly as an external client would.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use flowctl::db::connection::DatabaseConnection;

async fn test_db() -> DatabaseConnection {
    let conn = DatabaseConnection::new("sqlite::memory:").await.expect("connect");
    conn.run_migrations().await.expect("migrate");
    conn
}

async fn call(router: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn create_script(router: &axum::Router, name: &str) -> String {
    let (status, body) = call(
        router,
        "POST",
        "/scripts/create",
        Some(json!({
            "name": name,
            "language": "python",
            "file_path": format!("/scripts/{name}.py"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body:?}");
    body["data"]["script_id"].as_str().unwrap().to_string()
}

fn workflow_payload(script_name: &str) -> Value {
    json!({
        "name": "etl-pipeline",
        "description": "extract then load",
        "priority": 5,
        "nodes": [
            {"name": "extract", "type": "task", "script_name": script_name, "params": {}},
            {"name": "load", "type": "task", "script_name": script_name, "params": {}},
        ],
        "edges": [
            {"from_node": "extract", "to_node": "load", "condition_type": "success"},
        ],
        "triggers": [],
    })
}

#[tokio::test]
async fn create_workflow_rejects_unknown_script_reference() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);

    let (status, body) = call(&router, "POST", "/workflows/create", Some(workflow_payload("nope"))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body:?}");
}

#[tokio::test]
async fn create_list_get_workflow_round_trip() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);
    create_script(&router, "transform").await;

    let (status, created) = call(&router, "POST", "/workflows/create", Some(workflow_payload("transform"))).await;
    assert_eq!(status, StatusCode::CREATED, "{created:?}");
    let workflow_id = created["data"]["workflow_id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["nodes"], 2);
    assert_eq!(created["data"]["edges"], 1);

    let (status, list) = call(&router, "GET", "/workflows/list", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let (status, fetched) = call(&router, "GET", &format!("/workflows/{workflow_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["name"], "etl-pipeline");
}

#[tokio::test]
async fn get_workflow_missing_returns_404() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);

    let (status, _) = call(&router, "GET", "/workflows/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trigger_workflow_seeds_pending_tasks_and_cancel_clears_them() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);
    create_script(&router, "step").await;

    let (_, created) = call(&router, "POST", "/workflows/create", Some(workflow_payload("step"))).await;
    let workflow_id = created["data"]["workflow_id"].as_str().unwrap().to_string();

    let (status, triggered) = call(&router, "POST", &format!("/executions/create/{workflow_id}"), None).await;
    assert_eq!(status, StatusCode::CREATED, "{triggered:?}");
    assert_eq!(triggered["data"]["pending_nodes"], 2);
    let execution_id = triggered["data"]["execution_id"].as_str().unwrap().to_string();

    let (status, cancelled) = call(&router, "POST", &format!("/executions/cancel/{execution_id}"), None).await;
    assert_eq!(status, StatusCode::OK, "{cancelled:?}");
    let results = cancelled["data"]["results"].as_object().unwrap();
    assert_eq!(results.len(), 2, "{results:?}");
    assert!(results.values().all(|v| v["status"] == "cancelled"));

    let (status, fetched) = call(&router, "GET", &format!("/executions/{execution_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["status"], "cancelled");
}

#[tokio::test]
async fn delete_workflow_with_active_execution_is_rejected() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);
    create_script(&router, "step").await;

    let (_, created) = call(&router, "POST", "/workflows/create", Some(workflow_payload("step"))).await;
    let workflow_id = created["data"]["workflow_id"].as_str().unwrap().to_string();
    call(&router, "POST", &format!("/executions/create/{workflow_id}"), None).await;

    let (status, _) = call(&router, "DELETE", &format!("/workflows/delete/{workflow_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_script_referenced_by_a_node_is_rejected() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);
    let script_id = create_script(&router, "referenced").await;
    call(&router, "POST", "/workflows/create", Some(workflow_payload("referenced"))).await;

    let (status, _) = call(&router, "POST", &format!("/scripts/delete/{script_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn health_endpoints_report_ok() {
    let db = test_db().await;
    let router = flowctl::api::routes::create_test_router(db);

    let (status, body) = call(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = call(&router, "GET", "/api/v1/system/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

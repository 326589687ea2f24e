//! End-to-end tests for registration and request forwarding.

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_register_assigns_sequential_ids_and_lists_workers() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;
    let a = common::start_healthy_worker("{}").await;
    let b = common::start_healthy_worker("{}").await;

    assert_eq!(common::register(gateway, a.addr).await, 1);
    assert_eq!(common::register(gateway, b.addr).await, 2);

    let workers: Vec<Value> = common::client()
        .get(format!("http://{}/workers", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(workers.len(), 2);
    assert_eq!(workers[0]["id"], 1);
    assert_eq!(workers[0]["port"], a.addr.port());
    assert_eq!(workers[0]["isActive"], true);
    assert_eq!(workers[0]["requestsCounter"], 0);
}

#[tokio::test]
async fn test_register_with_supplied_id_is_idempotent() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;
    let worker = common::start_healthy_worker("{}").await;
    let client = common::client();

    for _ in 0..2 {
        let res = client
            .post(format!("http://{}/register", gateway))
            .json(&json!({ "id": 7, "host": "127.0.0.1", "port": worker.addr.port() }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["id"], 7);
    }

    let workers: Vec<Value> = client
        .get(format!("http://{}/workers", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(workers.len(), 1);
}

#[tokio::test]
async fn test_invalid_registration_is_rejected() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;

    let res = common::client()
        .post(format!("http://{}/register", gateway))
        .json(&json!({ "host": "127.0.0.1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hello_is_forwarded_with_correlation_id() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;
    let worker = common::start_healthy_worker("{\"message\":\"hello from worker\"}").await;
    common::register(gateway, worker.addr).await;

    let res = common::client()
        .get(format!("http://{}/hello", gateway))
        .header("x-correlation-id", "corr-42")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-correlation-id"], "corr-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "hello from worker");

    let seen = worker.requests_to("/hello");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].header("x-correlation-id"), Some("corr-42"));
}

#[tokio::test]
async fn test_correlation_id_is_generated_when_missing() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;

    let res = common::client()
        .get(format!("http://{}/health", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let id = res.headers()["x-correlation-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_business_routes_map_to_worker_paths() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;
    let worker = common::start_healthy_worker("{}").await;
    common::register(gateway, worker.addr).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/balance", gateway))
        .json(&json!({ "userId": "u1", "balance": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("http://{}/balance/u1", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("http://{}/check/u1", gateway))
        .json(&json!({ "amount": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("http://{}/check/u2/cash/c9", gateway))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let posted = worker.requests_to("/api/balance/");
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].method, "POST");
    let body: Value = serde_json::from_str(&posted[0].body).unwrap();
    assert_eq!(body["userId"], "u1");

    assert_eq!(worker.requests_to("/api/balance/u1").len(), 1);
    assert_eq!(worker.requests_to("/api/check/u1").len(), 1);
    assert_eq!(worker.requests_to("/api/check/u2/cash/c9").len(), 1);
}

#[tokio::test]
async fn test_no_worker_yields_service_unavailable() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;

    let res = common::client()
        .get(format!("http://{}/balance/u1", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["errorMessage"],
        "No balance received for userId [u1] from active workers."
    );
}

#[tokio::test]
async fn test_application_error_is_passed_through_without_retry() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;
    let worker = common::start_worker(|_| (409, "{\"error\":\"check already cashed\"}".into())).await;
    common::register(gateway, worker.addr).await;

    let res = common::client()
        .post(format!("http://{}/check/u2/cash/c1", gateway))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "check already cashed");
    assert_eq!(worker.requests_to("/api/check/u2/cash/c1").len(), 1);
}

#[tokio::test]
async fn test_unreachable_worker_exhausts_retries() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;

    // Reserve a port, then close it so every connection is refused.
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    common::register(gateway, port).await;

    let res = common::client()
        .get(format!("http://{}/hello", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unregister_notifies_worker_and_frees_id() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;
    let a = common::start_healthy_worker("{}").await;
    let b = common::start_healthy_worker("{}").await;
    let client = common::client();

    assert_eq!(common::register(gateway, a.addr).await, 1);

    let res = client
        .post(format!("http://{}/unregister", gateway))
        .json(&json!({ "id": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let notified = a.requests_to("/system/unregister");
    assert_eq!(notified.len(), 1);
    let body: Value = serde_json::from_str(&notified[0].body).unwrap();
    assert_eq!(body["id"], 1);

    let res = client
        .get(format!("http://{}/hello", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The freed id is handed to the next worker.
    assert_eq!(common::register(gateway, b.addr).await, 1);
}

#[tokio::test]
async fn test_unregister_unknown_id_is_a_no_op() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;

    let res = common::client()
        .post(format!("http://{}/unregister", gateway))
        .json(&json!({ "id": 99 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (gateway, _shutdown) = common::start_gateway(common::test_config()).await;

    let res = common::client()
        .get(format!("http://{}/does/not/exist", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Not found");
}

#[tokio::test]
async fn test_shutdown_unregisters_every_worker() {
    let (gateway, shutdown) = common::start_gateway(common::test_config()).await;
    let a = common::start_healthy_worker("{}").await;
    let b = common::start_healthy_worker("{}").await;
    common::register(gateway, a.addr).await;
    common::register(gateway, b.addr).await;

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    assert_eq!(a.requests_to("/system/unregister").len(), 1);
    assert_eq!(b.requests_to("/system/unregister").len(), 1);
}

#[tokio::test]
async fn test_shutdown_notifies_workers_while_requests_are_in_flight() {
    let mut config = common::test_config();
    config.dispatch.get_timeout_ms = 10_000;
    let (gateway, shutdown) = common::start_gateway(config).await;

    let worker = common::start_worker_with_delay(
        |_| (200, "{}".into()),
        |req| {
            if req.path == "/hello" {
                std::time::Duration::from_secs(5)
            } else {
                std::time::Duration::ZERO
            }
        },
    )
    .await;
    common::register(gateway, worker.addr).await;

    let pending = tokio::spawn(async move {
        common::client()
            .get(format!("http://{}/hello", gateway))
            .send()
            .await
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(worker.requests_to("/hello").len(), 1);

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    assert_eq!(worker.requests_to("/system/unregister").len(), 1);
    assert!(!pending.is_finished(), "the slow request is still draining");
    pending.abort();
}

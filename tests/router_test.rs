//! End-to-end tests: real listener, real worker pool, HTTP client.

use std::time::{Duration, Instant};

use offload_router::api;
use offload_router::routing::{
    ControllerResult, HttpMethod, ModuleCatalog, RequestContext, RouteEntry,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

const UNIT: Duration = Duration::from_millis(200);

async fn slow(_: RequestContext) -> ControllerResult {
    std::thread::sleep(UNIT);
    Ok(json!("done"))
}

async fn explode(_: RequestContext) -> ControllerResult {
    panic!("controller bug")
}

fn test_catalog() -> ModuleCatalog {
    api::catalog().with_group("jobs", || {
        vec![
            RouteEntry::new(HttpMethod::Get, "/slow", slow),
            RouteEntry::new(HttpMethod::Get, "/panic", explode),
            RouteEntry::new(HttpMethod::Get, "/number", |_| async { Ok(json!(42)) }),
        ]
    })
}

#[tokio::test]
async fn test_hello_group_end_to_end() {
    let server = common::start_server(api::catalog(), &["hello"], 2).await;
    let client = common::client();

    let res = client.get(server.url("/hello/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "hello from controller");

    let res = client.get(server.url("/hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "hello from controller");

    let res = client.get(server.url("/hello/world")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "hello world");

    let res = client.get(server.url("/hello/world/")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "hello world");

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_route_is_404_without_dispatch() {
    let server = common::start_server(api::catalog(), &["hello"], 1).await;
    let client = common::client();

    let res = client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"message":"no such route: GET./missing"}"#
    );

    // Registered path, unregistered method.
    let res = client.delete(server.url("/hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "no such route: DELETE./hello"}));

    // Groups without a directory in the API folder are not served.
    let res = client.get(server.url("/echo")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(server.pool.submitted(), 0);
    server.stop().await;
}

#[tokio::test]
async fn test_query_string_reaches_controller() {
    let server = common::start_server(api::catalog(), &["echo"], 1).await;
    let client = common::client();

    let ctx: Value = client
        .get(server.url("/echo?a=1&b=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ctx["query"], json!({"a": "1", "b": "2"}));
    assert_eq!(ctx["params"], json!({}));
    assert_eq!(ctx["body"], Value::Null);

    let ctx: Value = client
        .get(server.url("/echo"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ctx["query"], json!({}));

    server.stop().await;
}

#[tokio::test]
async fn test_post_body_handling() {
    let server = common::start_server(api::catalog(), &["echo"], 1).await;
    let client = common::client();

    let ctx: Value = client
        .post(server.url("/echo"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ctx["body"], Value::Null);

    let ctx: Value = client
        .post(server.url("/echo"))
        .body(r#"{"x":1}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ctx["body"], json!({"x": 1}));

    let res = client
        .post(server.url("/echo"))
        .body("not-json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: Value = res.json().await.unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("invalid JSON body"));

    // Malformed bodies never reach a worker.
    assert_eq!(server.pool.submitted(), 2);
    server.stop().await;
}

#[tokio::test]
async fn test_controller_error_is_500_with_message() {
    let server = common::start_server(api::catalog(), &["echo"], 1).await;
    let client = common::client();

    let res = client.put(server.url("/echo/body")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "request has no body"}));

    let res = client
        .put(server.url("/echo/body"))
        .json(&json!({"k": "v"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"received": {"k": "v"}}));

    server.stop().await;
}

#[tokio::test]
async fn test_headers_and_request_id_reach_controller() {
    let server = common::start_server(api::catalog(), &["echo"], 1).await;
    let client = common::client();

    let res = client
        .get(server.url("/echo"))
        .header("x-tag", "a")
        .header("x-tag", "b")
        .header("x-single", "only")
        .send()
        .await
        .unwrap();
    let request_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let ctx: Value = res.json().await.unwrap();

    assert_eq!(ctx["headers"]["x-tag"], json!(["a", "b"]));
    assert_eq!(ctx["headers"]["x-single"], json!("only"));
    assert_eq!(ctx["extraContext"]["requestId"], json!(request_id));

    server.stop().await;
}

#[tokio::test]
async fn test_non_string_results_are_json() {
    let server = common::start_server(test_catalog(), &["jobs"], 1).await;

    let res = common::client().get(server.url("/jobs/number")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "42");

    server.stop().await;
}

#[tokio::test]
async fn test_panicking_controller_does_not_take_down_server() {
    let server = common::start_server(test_catalog(), &["jobs"], 1).await;
    let client = common::client();

    let res = client.get(server.url("/jobs/panic")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "controller panicked: controller bug"}));

    let res = client.get(server.url("/jobs/number")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests_are_bounded_by_pool_size() {
    let server = common::start_server(test_catalog(), &["jobs"], 2).await;
    let client = common::client();

    let start = Instant::now();
    let requests: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            let url = server.url("/jobs/slow");
            tokio::spawn(async move { client.get(url).send().await.unwrap().text().await.unwrap() })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), "done");
    }

    // ceil(4 / 2) = 2 units of work, never fewer.
    let elapsed = start.elapsed();
    assert!(elapsed >= UNIT * 2, "finished too fast: {:?}", elapsed);
    assert!(elapsed < UNIT * 4, "requests ran serially: {:?}", elapsed);

    server.stop().await;
}

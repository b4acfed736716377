//! End-to-end relay tests against a local greeting endpoint
//!
//! Each test starts an axum server on a random port that behaves like the
//! greeting service: `GET /api/greeting?from=<name>[&delay=<ms>]` answers
//! `{"content": "Hello, <name>!", "from": "<name>"}`.

use axum::{
    Json, Router,
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use relaybox::config::Config;
use relaybox::messaging::Task;
use relaybox::worker::{
    self, DispatchMode, HttpClient, QueryEncoding, RecordingDiagnostics, ResponseShape,
    WorkerHandle,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, sleep};

#[derive(Clone)]
struct MockGreeting {
    status: StatusCode,
    queries: Arc<Mutex<Vec<String>>>,
}

#[derive(Deserialize)]
struct GreetingParams {
    from: Option<String>,
    delay: Option<String>,
}

async fn greeting(
    State(state): State<MockGreeting>,
    RawQuery(raw): RawQuery,
    Query(params): Query<GreetingParams>,
) -> Response {
    state.queries.lock().unwrap().push(raw.unwrap_or_default());

    if let Some(delay) = params.delay.filter(|d| !d.is_empty()) {
        let millis = delay.parse::<u64>().unwrap_or(150);
        sleep(Duration::from_millis(millis)).await;
    }

    if state.status != StatusCode::OK {
        return (state.status, "name service unavailable").into_response();
    }

    let from = params.from.unwrap_or_else(|| "World".to_string());
    Json(json!({ "content": format!("Hello, {}!", from), "from": from })).into_response()
}

/// Start the mock endpoint; returns its base URL and the recorded query strings
async fn start_mock_server(status: StatusCode) -> (String, Arc<Mutex<Vec<String>>>) {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let state = MockGreeting {
        status,
        queries: queries.clone(),
    };

    let app = Router::new()
        .route("/api/greeting", get(greeting))
        .with_state(state);

    // Bind to random available port
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", bound_addr), queries)
}

fn config_for(base_url: &str, shape: ResponseShape) -> Config {
    let mut config = Config::default();
    config.endpoint.base_url = base_url.to_string();
    config.worker.response_shape = shape;
    config
}

fn start_worker(config: &Config) -> (WorkerHandle, Arc<RecordingDiagnostics>) {
    let client = HttpClient::new(&config.http_config()).expect("Failed to build HTTP client");
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let handle = worker::spawn(config.worker_config(), Arc::new(client), diagnostics.clone());
    (handle, diagnostics)
}

/// Send `tasks`, close the channel and collect every posted result
async fn relay_all(handle: WorkerHandle, tasks: Vec<Task>) -> Vec<Value> {
    let WorkerHandle {
        tasks: sender,
        mut results,
        join,
        ..
    } = handle;

    for task in tasks {
        sender.send(task).await.unwrap();
    }
    drop(sender);
    join.await.unwrap();

    let mut posted = Vec::new();
    while let Some(result) = results.recv().await {
        posted.push(result);
    }
    posted
}

#[tokio::test]
async fn test_full_object_relay() {
    let (base_url, queries) = start_mock_server(StatusCode::OK).await;
    let (handle, diagnostics) = start_worker(&config_for(&base_url, ResponseShape::Full));

    let posted = relay_all(handle, vec![Task::new("Alice")]).await;

    assert_eq!(posted, vec![json!({ "content": "Hello, Alice!", "from": "Alice" })]);
    assert_eq!(*queries.lock().unwrap(), vec!["from=Alice".to_string()]);
    assert!(diagnostics.lines().is_empty());
}

#[tokio::test]
async fn test_projected_content_relay() {
    let (base_url, _) = start_mock_server(StatusCode::OK).await;
    let (handle, _) = start_worker(&config_for(&base_url, ResponseShape::Content));

    let posted = relay_all(handle, vec![Task::new("Alice")]).await;

    assert_eq!(posted, vec![json!("Hello, Alice!")]);
}

#[tokio::test]
async fn test_delay_flag_reaches_endpoint() {
    let (base_url, queries) = start_mock_server(StatusCode::OK).await;
    let mut config = config_for(&base_url, ResponseShape::Content);
    config.worker.dispatch = DispatchMode::Serialized;
    let (handle, _) = start_worker(&config);

    let posted = relay_all(handle, vec![Task::new("Bob").delayed(), Task::new("Bob")]).await;

    assert_eq!(posted, vec![json!("Hello, Bob!"), json!("Hello, Bob!")]);
    assert_eq!(
        *queries.lock().unwrap(),
        vec!["from=Bob&delay=150".to_string(), "from=Bob".to_string()]
    );
}

#[tokio::test]
async fn test_unavailable_endpoint_posts_nothing() {
    let (base_url, _) = start_mock_server(StatusCode::SERVICE_UNAVAILABLE).await;
    let (handle, diagnostics) = start_worker(&config_for(&base_url, ResponseShape::Content));

    let posted = relay_all(handle, vec![Task::new("Bob").delayed()]).await;

    assert!(posted.is_empty());
    assert_eq!(diagnostics.lines(), vec!["Request failed. Returned status of 503"]);
}

#[tokio::test]
async fn test_created_status_is_not_success() {
    let (base_url, _) = start_mock_server(StatusCode::CREATED).await;
    let (handle, diagnostics) = start_worker(&config_for(&base_url, ResponseShape::Full));

    let posted = relay_all(handle, vec![Task::new("Carol")]).await;

    assert!(posted.is_empty());
    assert_eq!(diagnostics.lines(), vec!["Request failed. Returned status of 201"]);
}

#[tokio::test]
async fn test_replies_arrive_in_completion_order() {
    let (base_url, _) = start_mock_server(StatusCode::OK).await;
    let (handle, _) = start_worker(&config_for(&base_url, ResponseShape::Content));

    let posted = relay_all(handle, vec![Task::new("Slow").delayed(), Task::new("Fast")]).await;

    assert_eq!(posted, vec![json!("Hello, Fast!"), json!("Hello, Slow!")]);
}

#[tokio::test]
async fn test_raw_query_is_not_escaped() {
    let (base_url, queries) = start_mock_server(StatusCode::OK).await;
    let (handle, _) = start_worker(&config_for(&base_url, ResponseShape::Content));

    let posted = relay_all(handle, vec![Task::new("Tom&Jerry")]).await;

    // The ampersand splits the value into a second parameter
    assert_eq!(posted, vec![json!("Hello, Tom!")]);
    assert_eq!(*queries.lock().unwrap(), vec!["from=Tom&Jerry".to_string()]);
}

#[tokio::test]
async fn test_percent_encoding_preserves_value() {
    let (base_url, _) = start_mock_server(StatusCode::OK).await;
    let mut config = config_for(&base_url, ResponseShape::Content);
    config.worker.query_encoding = QueryEncoding::Percent;
    let (handle, _) = start_worker(&config);

    let posted = relay_all(handle, vec![Task::new("Tom&Jerry")]).await;

    assert_eq!(posted, vec![json!("Hello, Tom&Jerry!")]);
}

#[tokio::test]
async fn test_connection_refused_is_reported() {
    // Nothing listens on port 1
    let (handle, diagnostics) =
        start_worker(&config_for("http://127.0.0.1:1", ResponseShape::Full));

    let posted = relay_all(handle, vec![Task::new("Alice")]).await;

    assert!(posted.is_empty());
    let lines = diagnostics.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Request failed: Connection failed"));
}

#[tokio::test]
async fn test_request_timeout_is_reported() {
    let (base_url, _) = start_mock_server(StatusCode::OK).await;
    let mut config = config_for(&base_url, ResponseShape::Full);
    config.http.request_timeout_ms = Some(20);
    let (handle, diagnostics) = start_worker(&config);

    let posted = relay_all(handle, vec![Task::new("Alice").delayed()]).await;

    assert!(posted.is_empty());
    assert_eq!(diagnostics.lines(), vec!["Request failed: Request timed out"]);
}

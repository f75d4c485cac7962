//! Code execution proxy against a stub sandbox.

mod common;

use axum::http::{Method, StatusCode};
use axum::{routing::post, Json, Router};
use common::{build_test_app, call, test_config};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serve a minimal Piston-compatible `/execute` and count the calls it receives.
async fn stub_sandbox() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new().route(
        "/execute",
        post(move |Json(body): Json<Value>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if body["language"] == "brainfreeze" {
                    return (StatusCode::BAD_REQUEST, Json(json!({"message": "unknown language"})));
                }
                let source = body["files"][0]["content"].as_str().unwrap_or_default();
                let stdout = if source == "print(1+1)" { "2\n" } else { "" };
                (
                    StatusCode::OK,
                    Json(json!({
                        "language": body["language"],
                        "run": {"stdout": stdout, "stderr": "", "output": stdout, "code": 0, "signal": null}
                    })),
                )
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), calls)
}

#[tokio::test]
async fn runs_python_in_the_sandbox() {
    let (url, calls) = stub_sandbox().await;
    let (app, _state) = build_test_app(opencollab::config::Config { sandbox_api_url: url, ..test_config() });

    let body = json!({"language": "python", "code": "print(1+1)"});
    let (status, body) = call(&app, Method::POST, "/api/code/execute", Some(body), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stdout"], "2\n");
    assert_eq!(body["exitCode"], 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn oversized_sources_never_reach_the_sandbox() {
    let (url, calls) = stub_sandbox().await;
    let (app, _state) = build_test_app(opencollab::config::Config { sandbox_api_url: url, ..test_config() });

    let source = "x".repeat(150 * 1024);
    let body = json!({"language": "python", "code": source});
    let (status, body) = call(&app, Method::POST, "/api/code/execute", Some(body), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Code too large (max 100KB)");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_fields_and_upstream_errors() {
    let (url, _calls) = stub_sandbox().await;
    let (app, _state) = build_test_app(opencollab::config::Config { sandbox_api_url: url, ..test_config() });

    let (status, body) = call(&app, Method::POST, "/api/code/execute", Some(json!({"language": "python"})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Language and code are required");

    let body = json!({"language": "brainfreeze", "source": "+"});
    let (status, body) = call(&app, Method::POST, "/api/code/execute", Some(body), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Code execution failed");
    assert!(body["details"].as_str().unwrap().contains("unknown language"));
}

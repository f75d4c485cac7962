#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::OnceLock;
use tower::ServiceExt;

use opencollab::auth::password::hash_password;
use opencollab::build_app;
use opencollab::config::Config;
use opencollab::state::AppState;

pub const ADMIN_EMAIL: &str = "interviewer@example.com";
pub const ADMIN_PASSWORD: &str = "Interview123!";

fn admin_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(ADMIN_PASSWORD).expect("hashing should succeed"))
}

/// A configuration with interviewer credentials and no external services.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: Some("integration-test-secret".to_string()),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password_hash: Some(admin_hash().to_string()),
        sandbox_api_url: "http://127.0.0.1:9".to_string(),
        ..Config::default()
    }
}

/// Build the application router plus the state behind it.
pub fn build_test_app(config: Config) -> (Router, AppState) {
    let state = AppState::new(config).expect("state should build");
    (build_app(state.clone()), state)
}

/// Access token for the configured interviewer.
pub fn interviewer_token(state: &AppState) -> String {
    state.tokens.issue_access_token(ADMIN_EMAIL).expect("token should sign").0
}

pub fn request(method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("router is infallible")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.expect("body should read").to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Send a request and return status and JSON body.
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
    let response = send(app, request(method, uri, body, token)).await;
    let status = response.status();
    (status, body_json(response).await)
}

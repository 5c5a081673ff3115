#![allow(dead_code)]
use std::{collections::HashMap, sync::Arc};

use accounts_backend::{
    config::Config,
    routes::build_router,
    state::{AppState, Stores},
    utils::ManualClock,
};
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_PASSWORD: &str = "password1";

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("SESSION_SECRET", "test-session-secret"),
        ("CACHE_TTL_SECONDS", "60"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|value| value.to_string())).expect("test config")
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let state = AppState::with_clock(test_config(), Stores::in_memory(), clock.clone());
        Self {
            router: build_router(state),
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    pub async fn sign_up(&self, email: &str) -> StatusCode {
        let (status, _, _) = self
            .send(json_request(
                "POST",
                "/auth/sign-up",
                json!({
                    "firstName": "Oleksii",
                    "lastName": "Filatov",
                    "email": email,
                    "password": TEST_PASSWORD,
                }),
            ))
            .await;
        status
    }

    /// Returns the access token and the refresh token cookie value.
    pub async fn sign_in(&self, email: &str) -> (String, String) {
        let (status, headers, body) = self
            .send(json_request(
                "POST",
                "/auth/sign-in",
                json!({ "email": email, "password": TEST_PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "sign-in failed: {}", body);
        let token = body["token"].as_str().expect("token").to_string();
        let refresh = extract_set_cookie_value(&headers, "refresh-token").expect("refresh cookie");
        (token, refresh)
    }

    pub async fn register_and_sign_in(&self, email: &str) -> String {
        assert_eq!(self.sign_up(email).await, StatusCode::CREATED);
        self.sign_in(email).await.0
    }

    /// Logs in via the cookie flow and returns the `session=...` pair.
    pub async fn log_in(&self, email: &str) -> String {
        let (status, headers, _) = self
            .send(json_request(
                "POST",
                "/auth/log-in",
                json!({ "email": email, "password": TEST_PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let value = extract_set_cookie_value(&headers, "session").expect("session cookie");
        format!("session={}", value)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn bearer_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request")
}

pub fn cookie_request(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("build request")
}

pub fn extract_set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let value = value.to_str().ok()?;
            let token = value.strip_prefix(&prefix)?.split(';').next()?.trim();
            if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            }
        })
}

pub fn set_cookie_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(str::to_string)
}

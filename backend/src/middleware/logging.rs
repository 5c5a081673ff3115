use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::{header::CONTENT_LENGTH, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use super::request_id::RequestId;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 1024;

/// Logs every 4xx/5xx response together with its body so failed requests can
/// be correlated by request id. Bodies up to 64 KiB are buffered and passed
/// through; larger or unsized bodies are passed through untouched.
pub async fn log_error_responses(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req.extensions().get::<RequestId>().map(|id| id.0.clone());
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    let (mut parts, body) = response.into_parts();
    let log = |body: &str| {
        log_error_status(status, &method, &path, request_id.as_deref(), latency_ms, body)
    };

    match body.size_hint().upper() {
        Some(len) if len <= MAX_BUFFERED_BODY_BYTES as u64 => {}
        upper => {
            log(&match upper {
                Some(len) => format!("<{} bytes not buffered>", len),
                None => "<unsized body not buffered>".to_string(),
            });
            return Response::from_parts(parts, body);
        }
    }

    let body = match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => {
            let end = bytes.len().min(MAX_LOGGED_BODY_BYTES);
            log(&String::from_utf8_lossy(&bytes[..end]));
            Body::from(bytes)
        }
        Err(err) => {
            parts.headers.remove(CONTENT_LENGTH);
            log(&format!("<unreadable body: {}>", err));
            Body::empty()
        }
    };

    Response::from_parts(parts, body)
}

fn log_error_status(
    status: StatusCode,
    method: &Method,
    path: &str,
    request_id: Option<&str>,
    latency_ms: u64,
    body: &str,
) {
    if status.is_server_error() {
        tracing::error!(
            status = status.as_u16(),
            %method,
            path = %path,
            request_id = request_id.unwrap_or("-"),
            latency_ms,
            body = %body,
            "Request completed with error status"
        );
    } else {
        tracing::warn!(
            status = status.as_u16(),
            %method,
            path = %path,
            request_id = request_id.unwrap_or("-"),
            latency_ms,
            body = %body,
            "Request completed with error status"
        );
    }
}

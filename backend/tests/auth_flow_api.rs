use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

mod support;

use support::{
    bearer_request, cookie_request, json_request, set_cookie_header, TestApp, TEST_PASSWORD,
};

#[tokio::test]
async fn sign_up_sign_in_and_manage_accounts() {
    let app = TestApp::new();

    assert_eq!(app.sign_up("a@x.com").await, StatusCode::CREATED);

    let (status, headers, body) = app
        .send(json_request(
            "POST",
            "/auth/sign-in",
            json!({ "email": "a@x.com", "password": TEST_PASSWORD }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().expect("token").to_string();
    assert!(!token.is_empty());
    let cookie = set_cookie_header(&headers, "refresh-token").expect("refresh cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/auth"));

    let (status, _, body) = app
        .send(bearer_request("GET", "/account", &token, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _, created) = app
        .send(bearer_request(
            "POST",
            "/account",
            &token,
            Some(json!({ "balance": 100, "currency": "UAH" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["balance"], 100);
    assert_eq!(created["currency"], "UAH");
    assert_eq!(created["user_id"], 1);

    let (status, _, body) = app
        .send(bearer_request("GET", "/account", &token, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let accounts = body.as_array().expect("list");
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["balance"], 100);
}

#[tokio::test]
async fn duplicate_sign_up_is_a_conflict() {
    let app = TestApp::new();
    assert_eq!(app.sign_up("dup@x.com").await, StatusCode::CREATED);
    assert_eq!(app.sign_up("dup@x.com").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn sign_up_rejects_invalid_payloads() {
    let app = TestApp::new();

    let (status, _, body) = app
        .send(json_request(
            "POST",
            "/auth/sign-up",
            json!({
                "firstName": "O",
                "lastName": "Filatov",
                "email": "not-an-email",
                "password": "short",
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _, body) = app
        .send(json_request("POST", "/auth/sign-up", json!({ "email": "a@x.com" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn sign_in_with_unknown_credentials_is_not_found() {
    let app = TestApp::new();
    assert_eq!(app.sign_up("known@x.com").await, StatusCode::CREATED);

    for (email, password) in [("missing@x.com", TEST_PASSWORD), ("known@x.com", "password2")] {
        let (status, headers, _) = app
            .send(json_request(
                "POST",
                "/auth/sign-in",
                json!({ "email": email, "password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(set_cookie_header(&headers, "refresh-token").is_none());
    }
}

#[tokio::test]
async fn access_token_expires_with_the_clock() {
    let app = TestApp::new();
    let token = app.register_and_sign_in("clock@x.com").await;

    app.clock.advance(Duration::minutes(14));
    let (status, _, _) = app
        .send(bearer_request("GET", "/account", &token, None))
        .await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::minutes(1));
    let (status, _, body) = app
        .send(bearer_request("GET", "/account", &token, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["error"],
        "token: access token expired; session: invalid id"
    );
}

#[tokio::test]
async fn refresh_rotates_the_refresh_token() {
    let app = TestApp::new();
    assert_eq!(app.sign_up("rotate@x.com").await, StatusCode::CREATED);
    let (_, refresh) = app.sign_in("rotate@x.com").await;

    let (status, headers, body) = app
        .send(cookie_request(
            "GET",
            "/auth/refresh",
            &format!("refresh-token={}", refresh),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let new_token = body["token"].as_str().expect("token").to_string();
    let new_refresh =
        support::extract_set_cookie_value(&headers, "refresh-token").expect("new refresh cookie");
    assert_ne!(new_refresh, refresh);
    assert_eq!(new_refresh.len(), 64);

    let (status, _, _) = app
        .send(bearer_request("GET", "/account", &new_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The consumed token cannot be replayed.
    let (status, _, _) = app
        .send(cookie_request(
            "GET",
            "/auth/refresh",
            &format!("refresh-token={}", refresh),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_failure_statuses() {
    let app = TestApp::new();

    let (status, _, _) = app
        .send(cookie_request("GET", "/auth/refresh", "other=1"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .send(cookie_request("GET", "/auth/refresh", "refresh-token=unknown"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.sign_up("expiry@x.com").await, StatusCode::CREATED);
    let (_, refresh) = app.sign_in("expiry@x.com").await;
    app.clock.advance(Duration::days(30));
    let (status, _, body) = app
        .send(cookie_request(
            "GET",
            "/auth/refresh",
            &format!("refresh-token={}", refresh),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "refresh token expired");
}

#[tokio::test]
async fn concurrent_refreshes_have_a_single_winner() {
    let app = TestApp::new();
    assert_eq!(app.sign_up("race@x.com").await, StatusCode::CREATED);
    let (_, refresh) = app.sign_in("race@x.com").await;
    let cookie = format!("refresh-token={}", refresh);

    let (first, second) = tokio::join!(
        app.send(cookie_request("GET", "/auth/refresh", &cookie)),
        app.send(cookie_request("GET", "/auth/refresh", &cookie)),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::NOT_FOUND]);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, headers, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    assert!(headers.contains_key("x-request-id"));
}

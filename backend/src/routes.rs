use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, handlers, middleware as app_middleware, state::AppState};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/sign-up", post(handlers::auth::sign_up))
        .route("/auth/sign-in", post(handlers::auth::sign_in))
        .route("/auth/refresh", get(handlers::auth::refresh))
        .route("/auth/log-in", post(handlers::auth::log_in))
        .route("/auth/log-out", get(handlers::auth::log_out));

    let account_routes = Router::new()
        .route(
            "/account",
            post(handlers::account::create_account)
                .put(handlers::account::create_account)
                .get(handlers::account::list_accounts),
        )
        .route(
            "/account/{id}",
            get(handlers::account::get_account)
                .post(handlers::account::update_account)
                .put(handlers::account::update_account)
                .delete(handlers::account::delete_account),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::authorize,
        ));

    let timeout = Duration::from_secs(state.config.request_timeout_seconds);
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum_middleware::from_fn(
                    app_middleware::log_error_responses,
                ))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                )),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(24 * 60 * 60));

    if config.cors_allow_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Cookies only travel cross-origin to an explicit allow-list.
    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

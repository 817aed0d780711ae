use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::AppState;

pub mod handlers;
pub mod vms;

/// Raw bearer token of the current request, stored by [`bearer_auth`].
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Build the full HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    let authorized = Router::new()
        .route("/", get(handlers::home))
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/reject", post(handlers::reject))
        .route("/rejected", get(handlers::list_rejected))
        .route("/vms", get(vms::list_vms).post(vms::create_vm))
        .route("/vms/:id", get(vms::get_vm))
        .route("/tasks", get(vms::list_tasks))
        .route("/deployments", get(vms::list_deployments))
        .route("/deployments/:id", get(vms::get_deployment))
        .route_layer(middleware::from_fn_with_state(state.clone(), bearer_auth));

    Router::new()
        // Health and login (no auth)
        .route("/healthz", get(|| async { "ok" }))
        .route("/login", post(handlers::login))
        .merge(authorized)
        .fallback(fallback_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Extract the raw token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Middleware: verifies the bearer token and stores the caller's identity
/// (and the raw token) as request extensions.
async fn bearer_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers()) else {
        tracing::warn!(path = %req.uri().path(), "missing bearer token");
        return Err(AppError::MissingToken);
    };

    let identity = state.tokens.verify(&token).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), error = %e, "bearer authentication failed");
        e
    })?;

    tracing::debug!(user_id = %identity.user_id, "authenticated request");
    req.extensions_mut().insert(identity);
    req.extensions_mut().insert(BearerToken(token));
    Ok(next.run(req).await)
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    // Responses carry bearer tokens and identity data.
    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.remove("server");

    resp
}

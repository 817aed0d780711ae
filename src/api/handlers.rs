use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::BearerToken;
use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::user::{User, UserInput};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Serialize)]
pub struct RejectedTokensResponse {
    pub tokens: Vec<String>,
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /login — check credentials and issue a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .users
        .validate_credentials(&payload.name, &payload.password)?;
    let token = state.tokens.issue(&user)?;

    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(Json(LoginResponse {
        token,
        expires_in: state.tokens.ttl_secs(),
    }))
}

/// GET / — greet the authenticated caller
pub async fn home(Extension(identity): Extension<Identity>) -> Json<Value> {
    Json(json!({ "message": format!("Hello {}", identity.name) }))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserInput>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.users.create(payload)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.users.list())
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get(&id)?))
}

/// PUT /users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UserInput>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.update(&id, payload)?))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.users.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /reject — revoke the caller's own token
pub async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<Value>, AppError> {
    state.tokens.revoke(&token)?;
    tracing::info!(user_id = %identity.user_id, "caller rejected own token");
    Ok(Json(json!({ "message": "Token rejected" })))
}

/// GET /rejected — list revoked token ids
pub async fn list_rejected(State(state): State<Arc<AppState>>) -> Json<RejectedTokensResponse> {
    Json(RejectedTokensResponse {
        tokens: state.tokens.list_revoked(),
    })
}

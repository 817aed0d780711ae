use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::provisioning::ProvisionError;
use crate::store::users::UserError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no token provided")]
    MissingToken,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "token_missing",
                self.to_string(),
            ),
            AppError::Auth(AuthError::SigningError(e)) => {
                tracing::error!("token signing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Auth(e) => {
                let code = match e {
                    AuthError::MalformedToken => "token_malformed",
                    AuthError::SignatureInvalid => "token_invalid",
                    AuthError::Expired => "token_expired",
                    AuthError::Revoked => "token_revoked",
                    AuthError::SigningError(_) => "internal_server_error",
                };
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication_error",
                    code,
                    e.to_string(),
                )
            }
            AppError::User(e) => match e {
                UserError::UserNotFound => (
                    StatusCode::NOT_FOUND,
                    "not_found_error",
                    "user_not_found",
                    e.to_string(),
                ),
                UserError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "authentication_error",
                    "invalid_credentials",
                    e.to_string(),
                ),
                UserError::InvalidUser(_) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_request_error",
                    "invalid_user",
                    e.to_string(),
                ),
            },
            AppError::Provision(e) => match e {
                ProvisionError::InvalidSpec(_) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_request_error",
                    "invalid_spec",
                    e.to_string(),
                ),
                ProvisionError::Unavailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable_error",
                    "provisioning_unavailable",
                    e.to_string(),
                ),
            },
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "not_found",
                self.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

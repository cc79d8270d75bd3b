use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

/// API error taxonomy. Every failure a handler can produce maps onto one
/// of these variants, and every variant renders the same JSON envelope:
/// `{"success": false, "error": {"code", "message", "details?"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// Deliberately identical for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("User with this email already exists")]
    UserExists,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{message}")]
    Server {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Wrap an unexpected collaborator failure. `message` is the stable,
    /// client-facing context; the source only leaves the process outside
    /// production.
    pub fn server(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Server {
            message: message.into(),
            source: source.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::UserExists => "USER_EXISTS",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Server { .. } => "SERVER_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::UserExists => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn expose_details() -> bool {
    std::env::var("APP_ENV").map(|v| v != "production").unwrap_or(true)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Validation(msg) => debug!(message = %msg, "validation error"),
            Self::InvalidCredentials => warn!("invalid credentials"),
            Self::Unauthorized(msg) => warn!(message = %msg, "unauthorized"),
            Self::UserExists => warn!("duplicate signup"),
            Self::MethodNotAllowed => debug!("method not allowed"),
            Self::Server { message, source } => error!(error = %source, "{message}"),
        }

        let mut err = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Self::Server { source, .. } = &self {
            if expose_details() {
                err["details"] = json!(source.to_string());
            }
        }

        (self.status(), Json(json!({ "success": false, "error": err }))).into_response()
    }
}

/// Fallback handler wired onto every method router.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_renders_envelope() {
        let (status, body) = body_json(ApiError::validation("Invalid email format")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Invalid email format");
    }

    #[tokio::test]
    async fn invalid_credentials_message_is_fixed() {
        let (status, body) = body_json(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn user_exists_is_conflict() {
        let (status, body) = body_json(ApiError::UserExists).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "USER_EXISTS");
        assert_eq!(body["error"]["message"], "User with this email already exists");
    }

    #[tokio::test]
    async fn server_error_keeps_context_and_details() {
        let (status, body) = body_json(ApiError::server(
            "Login failed",
            anyhow::anyhow!("pool timed out"),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "SERVER_ERROR");
        assert_eq!(body["error"]["message"], "Login failed");
        // details carry the source outside production
        assert_eq!(body["error"]["details"], "pool timed out");
    }

    #[tokio::test]
    async fn method_not_allowed_envelope() {
        let (status, body) = body_json(ApiError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
        assert_eq!(body["error"]["message"], "Method not allowed");
    }
}

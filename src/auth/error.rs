// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ApiError, CourseError};

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token kind does not match its use (e.g. refresh token as bearer)
    WrongTokenKind,
    /// Reset token was already used or the password changed since
    StaleResetToken,
    /// Unknown email or wrong password
    InvalidCredentials,
    /// Too many login attempts from this client
    RateLimited { retry_after_secs: u64 },
    /// Insufficient permissions
    InsufficientPermissions,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    message: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::WrongTokenKind => "wrong_token_kind",
            AuthError::StaleResetToken => "stale_reset_token",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::RateLimited { .. } => "rate_limited",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::WrongTokenKind
            | AuthError::StaleResetToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::WrongTokenKind => write!(f, "Token cannot be used for this operation"),
            AuthError::StaleResetToken => write!(f, "Reset token is no longer valid"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::RateLimited { .. } => {
                write!(f, "Too many login attempts, please try again later")
            }
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::InternalError(detail) => {
                tracing::error!(error = %detail, "Authentication failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(AuthErrorBody {
            message,
            error_code: self.error_code().to_string(),
        });

        if let AuthError::RateLimited { retry_after_secs } = self {
            return (status, [(RETRY_AFTER, retry_after_secs.to_string())], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(detail) => {
                tracing::error!(error = %detail, "Authentication failure");
                ApiError::internal()
            }
            other => ApiError::new(other.status_code(), other.to_string()),
        }
    }
}

impl From<AuthError> for CourseError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(detail) => CourseError::Internal(detail),
            AuthError::InsufficientPermissions => {
                CourseError::Forbidden(AuthError::InsufficientPermissions.to_string())
            }
            other => CourseError::Unauthorized(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
        assert_eq!(body["message"], "Authorization header is required");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let response = AuthError::InsufficientPermissions.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn rate_limited_returns_429_with_retry_after() {
        let response = AuthError::RateLimited {
            retry_after_secs: 30,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "30");
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = AuthError::InternalError("key store gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}

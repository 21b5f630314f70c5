// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StoreError;

/// Failure taxonomy shared by the enrollment engine, the rating aggregator,
/// the identity gate and the course registry.
#[derive(Debug, thiserror::Error)]
pub enum CourseError {
    /// Malformed, missing or out-of-range input.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Absent, soft-deleted, or owned by someone else.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or version conflict.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected record store failure.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Unexpected runtime failure outside the record store.
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type CourseResult<T> = Result<T, CourseError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<CourseError> for ApiError {
    fn from(err: CourseError) -> Self {
        match err {
            CourseError::InvalidInput(message) => Self::bad_request(message),
            CourseError::Unauthorized(message) => Self::unauthorized(message),
            CourseError::Forbidden(message) => Self::forbidden(message),
            CourseError::NotFound(message) => Self::not_found(message),
            CourseError::Conflict(message) => Self::conflict(message),
            CourseError::Storage(e) => {
                tracing::error!(error = %e, "Record store failure");
                Self::internal()
            }
            CourseError::Internal(e) => {
                tracing::error!(error = %e, "Unexpected failure");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Enrollment and lesson progress endpoints.
//!
//! All operations require authentication. Enrollments are private to their
//! owner; another user's enrollment answers 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::extract::ApiJson;
use crate::{
    auth::Auth,
    enrollment::EnrollmentEngine,
    error::ApiError,
    models::{
        EnrollRequest, EnrollmentDetail, EnrollmentList, EnrollmentProgress, UpdateProgressRequest,
    },
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentDetail),
        (status = 400, description = "Course ID missing"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled")
    )
)]
pub async fn enroll(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollmentDetail>), ApiError> {
    let enrollment = EnrollmentEngine::new(&state.db).enroll(user.user_id, request.course_id)?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// The caller's own enrollments, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/history",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Caller's enrollments", body = EnrollmentList))
)]
pub async fn enrollment_history(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentList>, ApiError> {
    Ok(Json(EnrollmentEngine::new(&state.db).history(user.user_id)?))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{enrollment_id}",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    params(("enrollment_id" = u64, Path, description = "Enrollment identifier")),
    responses(
        (status = 200, description = "Enrollment with progress metrics", body = EnrollmentProgress),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn get_enrollment(
    Auth(user): Auth,
    Path(enrollment_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentProgress>, ApiError> {
    Ok(Json(
        EnrollmentEngine::new(&state.db).get_enrollment(user.user_id, enrollment_id)?,
    ))
}

/// Mark a lesson completed (or not) for one of the caller's enrollments.
#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{enrollment_id}/progress",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    params(("enrollment_id" = u64, Path, description = "Enrollment identifier")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Updated progress", body = EnrollmentProgress),
        (status = 400, description = "Lesson ID missing"),
        (status = 404, description = "Enrollment or lesson not found"),
        (status = 409, description = "Stale expected_version")
    )
)]
pub async fn update_progress(
    Auth(user): Auth,
    Path(enrollment_id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateProgressRequest>,
) -> Result<Json<EnrollmentProgress>, ApiError> {
    let updated = EnrollmentEngine::new(&state.db).update_progress(
        user.user_id,
        enrollment_id,
        request.lesson_id,
        request.completed,
        request.expected_version,
    )?;
    Ok(Json(updated))
}

/// Enrollments of a user. Students see only their own; admins see anyone's.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/enrollments",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    params(("user_id" = u64, Path, description = "User whose enrollments to list")),
    responses(
        (status = 200, description = "User's enrollments", body = EnrollmentList),
        (status = 403, description = "Not your enrollments")
    )
)]
pub async fn list_user_enrollments(
    Auth(user): Auth,
    Path(user_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentList>, ApiError> {
    Ok(Json(
        EnrollmentEngine::new(&state.db).list_enrollments(&user, user_id)?,
    ))
}

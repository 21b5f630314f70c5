// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course catalog endpoints.
//!
//! Browsing is public. Creating courses and lessons requires the INSTRUCTOR
//! or ADMIN role; edits and deletes are limited to the owning instructor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::extract::{ApiJson, ApiQuery};
use crate::{
    auth::CourseAuthor,
    catalog::CourseRegistry,
    error::ApiError,
    models::{
        CourseDetail, CourseList, CourseListQuery, CourseResponse, CreateCourseRequest,
        CreateLessonRequest, LessonResponse, UpdateCourseRequest, UpdateLessonRequest,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    tag = "Courses",
    params(CourseListQuery),
    responses((status = 200, description = "Paged catalog", body = CourseList))
)]
pub async fn list_courses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CourseListQuery>,
) -> Result<Json<CourseList>, ApiError> {
    Ok(Json(CourseRegistry::new(&state.db).list_courses(&query)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    tag = "Courses",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Title, price or category missing or invalid"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller cannot author courses")
    )
)]
pub async fn create_course(
    CourseAuthor(author): CourseAuthor,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let course = CourseRegistry::new(&state.db).create_course(&author, request)?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    tag = "Courses",
    params(("course_id" = u64, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course with lessons and counts", body = CourseDetail),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    Path(course_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<CourseDetail>, ApiError> {
    Ok(Json(CourseRegistry::new(&state.db).get_course(course_id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("course_id" = u64, Path, description = "Course identifier")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Invalid field"),
        (status = 404, description = "Course not found or not owned by caller")
    )
)]
pub async fn update_course(
    CourseAuthor(author): CourseAuthor,
    Path(course_id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    Ok(Json(
        CourseRegistry::new(&state.db).update_course(&author, course_id, request)?,
    ))
}

/// Soft-delete a course. Enrollments and reviews are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("course_id" = u64, Path, description = "Course identifier")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found or not owned by caller")
    )
)]
pub async fn delete_course(
    CourseAuthor(author): CourseAuthor,
    Path(course_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    CourseRegistry::new(&state.db).delete_course(&author, course_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/lessons",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    params(("course_id" = u64, Path, description = "Course identifier")),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Title missing"),
        (status = 404, description = "Course not found or not owned by caller")
    )
)]
pub async fn create_lesson(
    CourseAuthor(author): CourseAuthor,
    Path(course_id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateLessonRequest>,
) -> Result<(StatusCode, Json<LessonResponse>), ApiError> {
    let lesson = CourseRegistry::new(&state.db).create_lesson(&author, course_id, request)?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{lesson_id}",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    params(("lesson_id" = u64, Path, description = "Lesson identifier")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 404, description = "Lesson not found or not owned by caller")
    )
)]
pub async fn update_lesson(
    CourseAuthor(author): CourseAuthor,
    Path(lesson_id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateLessonRequest>,
) -> Result<Json<LessonResponse>, ApiError> {
    Ok(Json(
        CourseRegistry::new(&state.db).update_lesson(&author, lesson_id, request)?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{lesson_id}",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    params(("lesson_id" = u64, Path, description = "Lesson identifier")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 404, description = "Lesson not found or not owned by caller")
    )
)]
pub async fn delete_lesson(
    CourseAuthor(author): CourseAuthor,
    Path(lesson_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    CourseRegistry::new(&state.db).delete_lesson(&author, lesson_id)?;
    Ok(StatusCode::NO_CONTENT)
}

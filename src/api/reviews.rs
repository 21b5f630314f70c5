// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course review endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::extract::{ApiJson, ApiQuery};
use crate::{
    auth::Auth,
    error::ApiError,
    models::{CourseReviews, PageQuery, ReviewRequest, ReviewResponse, UserReviews},
    rating::RatingAggregator,
    state::AppState,
};

/// Review a course the caller is enrolled in.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/reviews",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("course_id" = u64, Path, description = "Course identifier")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Rating missing or out of range"),
        (status = 403, description = "Caller is not enrolled"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Course already reviewed by caller")
    )
)]
pub async fn submit_review(
    Auth(user): Auth,
    Path(course_id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let review = RatingAggregator::new(&state.db).submit_review(
        user.user_id,
        course_id,
        request.rating,
        request.comment,
    )?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/reviews",
    tag = "Reviews",
    params(
        ("course_id" = u64, Path, description = "Course identifier"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Reviews with rating summary", body = CourseReviews),
        (status = 404, description = "Course not found")
    )
)]
pub async fn list_course_reviews(
    Path(course_id): Path<u64>,
    ApiQuery(page): ApiQuery<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<CourseReviews>, ApiError> {
    Ok(Json(
        RatingAggregator::new(&state.db).list_course_reviews(course_id, page)?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/reviews/{review_id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("review_id" = u64, Path, description = "Review identifier")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Rating missing or out of range"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn edit_review(
    Auth(user): Auth,
    Path(review_id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = RatingAggregator::new(&state.db).edit_review(
        user.user_id,
        review_id,
        request.rating,
        request.comment,
    )?;
    Ok(Json(review))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{review_id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("review_id" = u64, Path, description = "Review identifier")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    Auth(user): Auth,
    Path(review_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    RatingAggregator::new(&state.db).delete_review(user.user_id, review_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own reviews, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/user/reviews",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses((status = 200, description = "Caller's reviews", body = UserReviews))
)]
pub async fn list_user_reviews(
    Auth(user): Auth,
    ApiQuery(page): ApiQuery<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<UserReviews>, ApiError> {
    Ok(Json(
        RatingAggregator::new(&state.db).list_user_reviews(user.user_id, page)?,
    ))
}

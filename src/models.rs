// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Response types derive `Serialize` and `ToSchema`, request
//! types derive `Deserialize` and `ToSchema` (or `IntoParams` for query
//! strings) for automatic JSON handling and OpenAPI documentation.
//!
//! Request fields that are semantically required are still optional at the
//! serde level, so a missing field is reported as a 400 with a readable
//! message rather than a deserialization rejection.
//!
//! ## Model Categories
//!
//! - **Pagination**: shared `page`/`limit` handling
//! - **Accounts**: registration, login, tokens
//! - **Courses & Lessons**: catalog CRUD
//! - **Enrollments**: enrollment joins and progress reports
//! - **Reviews**: course reviews and rating summaries

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{Role, TokenPair};
use crate::enrollment::{Progress, ProgressMetrics, ProgressState};
use crate::storage::{CourseRecord, LessonRecord, UserRecord};

// =============================================================================
// Pagination
// =============================================================================

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 10, at most 100).
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    /// Cut one page out of an already ordered list.
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, Pagination) {
        let page = self.page();
        let limit = self.limit();
        let total = items.len() as u64;
        let skip = (u64::from(page) - 1).saturating_mul(u64::from(limit));

        let window = items
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect();

        let pagination = Pagination {
            page,
            limit,
            total,
            pages: total.div_ceil(u64::from(limit)),
        };
        (window, pagination)
    }
}

/// Pagination envelope returned with every paged list.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    /// `ceil(total / limit)`.
    pub pages: u64,
}

/// Generic confirmation body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Public view of a user (course instructors, enrollment owners).
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserSummary {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A user's own profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    /// `STUDENT` (default) or `INSTRUCTOR`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

// =============================================================================
// Courses & Lessons
// =============================================================================

/// Course with its instructor.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub image_url: Option<String>,
    /// Mean rating rounded to one decimal; 0 without reviews.
    pub average_rating: f64,
    pub instructor: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseResponse {
    pub fn new(course: CourseRecord, instructor: UserSummary) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            category: course.category,
            image_url: course.image_url,
            average_rating: course.average_rating,
            instructor,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Course row in the catalog listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseListItem {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub lesson_count: u64,
    pub enrollment_count: u64,
}

/// Full course page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseResponse,
    /// Ordered by `order` ascending.
    pub lessons: Vec<LessonResponse>,
    pub lesson_count: u64,
    pub enrollment_count: u64,
    pub review_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseList {
    pub courses: Vec<CourseListItem>,
    pub pagination: Pagination,
}

/// Catalog filters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    #[serde(alias = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(alias = "maxPrice")]
    pub max_price: Option<f64>,
}

impl CourseListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LessonResponse {
    pub id: u64,
    pub course_id: u64,
    pub title: String,
    pub video_url: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<LessonRecord> for LessonResponse {
    fn from(lesson: LessonRecord) -> Self {
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            title: lesson.title,
            video_url: lesson.video_url,
            order: lesson.order,
            created_at: lesson.created_at,
        }
    }
}

/// Lesson outline entry used inside enrollment joins.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LessonSummary {
    pub id: u64,
    pub title: String,
    pub order: i32,
}

impl From<&LessonRecord> for LessonSummary {
    fn from(lesson: &LessonRecord) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            order: lesson.order,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLessonRequest {
    #[serde(default)]
    pub title: String,
    #[serde(alias = "videoUrl")]
    pub video_url: Option<String>,
    /// Display position (default 1).
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    #[serde(alias = "videoUrl")]
    pub video_url: Option<String>,
    pub order: Option<i32>,
}

// =============================================================================
// Enrollments
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollRequest {
    #[serde(alias = "courseId")]
    pub course_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    #[serde(alias = "lessonId")]
    pub lesson_id: Option<u64>,
    /// `true` marks the lesson completed, `false` unmarks it.
    #[serde(default)]
    pub completed: bool,
    /// When set, the update fails with 409 unless it matches the stored version.
    #[serde(alias = "expectedVersion")]
    pub expected_version: Option<u64>,
}

/// Course as seen from an enrollment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: CourseResponse,
    /// Ordered by `order` ascending.
    pub lessons: Vec<LessonSummary>,
    pub lesson_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentDetail {
    pub id: u64,
    pub user_id: u64,
    pub course_id: u64,
    pub enrolled_at: DateTime<Utc>,
    pub progress: Progress,
    /// Optimistic concurrency token for progress updates.
    pub version: u64,
    pub course: EnrolledCourse,
}

/// Progress document plus derived metrics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressReport {
    #[serde(flatten)]
    pub progress: Progress,
    pub state: ProgressState,
    #[serde(flatten)]
    pub metrics: ProgressMetrics,
}

impl ProgressReport {
    /// `lesson_ids` are the course's lessons at the time of the report.
    pub fn new(progress: Progress, lesson_ids: &BTreeSet<u64>) -> Self {
        let metrics = progress.metrics(lesson_ids);
        Self {
            state: metrics.state(),
            metrics,
            progress,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentProgress {
    pub enrollment: EnrollmentDetail,
    pub progress: ProgressReport,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentList {
    pub enrollments: Vec<EnrollmentDetail>,
    pub total: u64,
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Integer from 1 to 5.
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct Reviewer {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: u64,
    pub course_id: u64,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Reviewer,
}

/// Course reference attached to a user's own reviews.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewedCourse {
    pub id: u64,
    pub title: String,
    pub instructor_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserReview {
    pub id: u64,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub course: ReviewedCourse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseInfo {
    pub id: u64,
    pub title: String,
    pub average_rating: f64,
    pub total_reviews: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseReviews {
    /// Newest first.
    pub reviews: Vec<ReviewResponse>,
    pub pagination: Pagination,
    pub course_info: CourseInfo,
    /// Count of reviews per star rating, keys `1` to `5`, zero-filled.
    pub rating_distribution: BTreeMap<u8, u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserReviews {
    pub reviews: Vec<UserReview>,
    pub pagination: Pagination,
}

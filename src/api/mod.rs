// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, HeaderValue},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Role, TokenPair},
    enrollment::{Progress, ProgressMetrics, ProgressState},
    models::{
        CourseDetail, CourseInfo, CourseList, CourseListItem, CourseResponse, CourseReviews,
        CreateCourseRequest, CreateLessonRequest, EnrollRequest, EnrolledCourse, EnrollmentDetail,
        EnrollmentList, EnrollmentProgress, ForgotPasswordRequest, LessonResponse, LessonSummary,
        LoginRequest, LoginResponse, MessageResponse, Pagination, ProgressReport,
        RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, ReviewRequest, ReviewResponse,
        ReviewedCourse, Reviewer, UpdateCourseRequest, UpdateLessonRequest, UpdateProgressRequest,
        UserProfile, UserReview, UserReviews, UserSummary,
    },
    state::AppState,
};

pub mod courses;
pub mod enrollments;
pub mod extract;
pub mod health;
pub mod reviews;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// CORS policy: permissive when no origins are configured.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let v1_routes = Router::new()
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/{course_id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{course_id}/lessons", post(courses::create_lesson))
        .route(
            "/courses/{course_id}/reviews",
            get(reviews::list_course_reviews).post(reviews::submit_review),
        )
        .route(
            "/lessons/{lesson_id}",
            put(courses::update_lesson).delete(courses::delete_lesson),
        )
        .route("/enrollments", post(enrollments::enroll))
        .route("/enrollments/history", get(enrollments::enrollment_history))
        .route("/enrollments/{enrollment_id}", get(enrollments::get_enrollment))
        .route(
            "/enrollments/{enrollment_id}/progress",
            put(enrollments::update_progress),
        )
        .route(
            "/users/{user_id}/enrollments",
            get(enrollments::list_user_enrollments),
        )
        .route(
            "/reviews/{review_id}",
            put(reviews::edit_review).delete(reviews::delete_review),
        )
        .route("/user/reviews", get(reviews::list_user_reviews));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/refresh-token", post(users::refresh_token))
        .route("/forgot-password", post(users::forgot_password))
        .route("/reset-password", post(users::reset_password))
        .route("/me", get(users::me))
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// Registers the bearer token scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Coursify API",
        description = "Course marketplace: catalog, enrollments, lesson progress and reviews."
    ),
    paths(
        users::register,
        users::login,
        users::refresh_token,
        users::forgot_password,
        users::reset_password,
        users::me,
        courses::list_courses,
        courses::create_course,
        courses::get_course,
        courses::update_course,
        courses::delete_course,
        courses::create_lesson,
        courses::update_lesson,
        courses::delete_lesson,
        enrollments::enroll,
        enrollments::enrollment_history,
        enrollments::get_enrollment,
        enrollments::update_progress,
        enrollments::list_user_enrollments,
        reviews::submit_review,
        reviews::list_course_reviews,
        reviews::edit_review,
        reviews::delete_review,
        reviews::list_user_reviews,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Role,
            TokenPair,
            Pagination,
            MessageResponse,
            UserSummary,
            UserProfile,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            CourseResponse,
            CourseListItem,
            CourseDetail,
            CourseList,
            CreateCourseRequest,
            UpdateCourseRequest,
            LessonResponse,
            LessonSummary,
            CreateLessonRequest,
            UpdateLessonRequest,
            EnrollRequest,
            UpdateProgressRequest,
            Progress,
            ProgressState,
            ProgressMetrics,
            ProgressReport,
            EnrolledCourse,
            EnrollmentDetail,
            EnrollmentProgress,
            EnrollmentList,
            ReviewRequest,
            Reviewer,
            ReviewResponse,
            ReviewedCourse,
            UserReview,
            CourseInfo,
            CourseReviews,
            UserReviews,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Accounts", description = "Registration, login and credential recovery"),
        (name = "Courses", description = "Course catalog"),
        (name = "Lessons", description = "Lesson management"),
        (name = "Enrollments", description = "Enrollments and lesson progress"),
        (name = "Reviews", description = "Course reviews and ratings"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

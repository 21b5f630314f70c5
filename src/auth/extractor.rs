// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser, TokenKind};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Validates the access token from the Authorization header against the
/// server's signing secret. Refresh and reset tokens are rejected.
///
/// # Example
///
/// ```rust,ignore
/// async fn history(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<EnrollmentDetail>>, ApiError> {
///     // user.user_id contains the authenticated user's ID
///     // user.role contains their role
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = state.tokens.verify(token, TokenKind::Access)?;
        Ok(Auth(AuthenticatedUser::from_claims(claims)?))
    }
}

/// Extractor that requires a role allowed to author courses
/// (instructor or admin).
pub struct CourseAuthor(pub AuthenticatedUser);

impl FromRequestParts<AppState> for CourseAuthor {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.role.can_author_courses() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(CourseAuthor(user))
    }
}

/// Peer address of the request, used as the login rate-limit key.
///
/// Falls back to `0.0.0.0` when the server was not started with connect
/// info (e.g. router tests), so those requests share one bucket.
pub struct ClientIp(pub IpAddr);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        Ok(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::http::Request;

    fn parts_with_token(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = AppState::for_tests();
        let mut parts = parts_with_token(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer_scheme() {
        let state = AppState::for_tests();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic abc")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_access_token() {
        let state = AppState::for_tests();
        let pair = state.tokens.issue_pair(12, Role::Student).unwrap();
        let mut parts = parts_with_token(Some(&pair.access_token));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, 12);
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn refresh_token_is_not_a_bearer_credential() {
        let state = AppState::for_tests();
        let pair = state.tokens.issue_pair(12, Role::Student).unwrap();
        let mut parts = parts_with_token(Some(&pair.refresh_token));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::WrongTokenKind)));
    }

    #[tokio::test]
    async fn course_author_rejects_students() {
        let state = AppState::for_tests();
        let pair = state.tokens.issue_pair(1, Role::Student).unwrap();
        let mut parts = parts_with_token(Some(&pair.access_token));

        let result = CourseAuthor::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn course_author_accepts_instructors() {
        let state = AppState::for_tests();
        let pair = state.tokens.issue_pair(2, Role::Instructor).unwrap();
        let mut parts = parts_with_token(Some(&pair.access_token));

        let result = CourseAuthor::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn client_ip_reads_connect_info() {
        let mut parts = parts_with_token(None);
        let addr: SocketAddr = "192.168.1.9:5555".parse().unwrap();
        parts.extensions.insert(ConnectInfo(addr));

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, addr.ip());
    }
}

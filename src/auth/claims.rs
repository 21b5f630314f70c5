// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use super::roles::Role;

/// Purpose of a signed token.
///
/// A token is only accepted where its kind is expected: access tokens as
/// bearer credentials, refresh tokens at `/refresh-token`, reset tokens at
/// `/reset-password`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

/// Claims carried by every token this server signs (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id, as a decimal string.
    pub sub: String,

    /// Role at the time of issuance.
    pub role: Role,

    pub kind: TokenKind,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Unique token id, doubles as the session id.
    pub jti: String,

    /// Fingerprint of the credential hash (reset tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpr: Option<String>,
}

/// Authenticated user information extracted from an access token.
///
/// This is the primary type used throughout the application to represent
/// the caller of a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Record store user id (`sub` claim)
    pub user_id: u64,

    /// User's role
    pub role: Role,

    /// Session ID (`jti` claim)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified session claims.
    pub fn from_claims(claims: SessionClaims) -> Result<Self, AuthError> {
        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| AuthError::MalformedToken)?;

        Ok(Self {
            user_id,
            role: claims.role,
            session_id: Some(claims.jti),
            expires_at: claims.exp,
        })
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> SessionClaims {
        SessionClaims {
            sub: "42".to_string(),
            role: Role::Instructor,
            kind: TokenKind::Access,
            iat: 1700000000,
            exp: 1700000900,
            jti: "sess_abc".to_string(),
            fpr: None,
        }
    }

    #[test]
    fn from_claims_extracts_user_id_and_role() {
        let user = AuthenticatedUser::from_claims(sample_claims()).unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.session_id.as_deref(), Some("sess_abc"));
        assert!(!user.is_admin());
    }

    #[test]
    fn non_numeric_subject_is_malformed() {
        let mut claims = sample_claims();
        claims.sub = "user_123".to_string();
        assert!(matches!(
            AuthenticatedUser::from_claims(claims),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn fingerprint_is_omitted_when_absent() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert!(json.get("fpr").is_none());
        assert_eq!(json["kind"], "access");
        assert_eq!(json["role"], "INSTRUCTOR");
    }
}

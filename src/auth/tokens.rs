// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and verification (HS256).
//!
//! ## Token Kinds
//!
//! | Kind      | Lifetime (default) | Accepted by            |
//! |-----------|--------------------|------------------------|
//! | `access`  | 15 minutes         | `Authorization: Bearer` |
//! | `refresh` | 7 days             | `POST /refresh-token`  |
//! | `reset`   | 15 minutes         | `POST /reset-password` |
//!
//! Reset tokens embed an HMAC fingerprint of the account's credential hash.
//! Changing the password changes the hash, so a reset token works once.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use sha2::Sha256;
use utoipa::ToSchema;

use super::claims::{SessionClaims, TokenKind};
use super::error::AuthError;
use super::roles::Role;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Lifetime of password reset tokens.
const RESET_TOKEN_TTL_SECS: i64 = 15 * 60;

type HmacSha256 = Hmac<Sha256>;

/// Access/refresh pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Signs and verifies session tokens with a shared secret.
pub struct TokenService {
    secret: Vec<u8>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret: secret.to_vec(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Issue a fresh access/refresh pair for a user.
    pub fn issue_pair(&self, user_id: u64, role: Role) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, role, TokenKind::Access, None)?,
            refresh_token: self.issue(user_id, role, TokenKind::Refresh, None)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_secs,
        })
    }

    /// Issue a password reset token bound to the current credential hash.
    pub fn issue_reset(
        &self,
        user_id: u64,
        role: Role,
        password_hash: &str,
    ) -> Result<String, AuthError> {
        let fingerprint = self.fingerprint(password_hash)?;
        self.issue(user_id, role, TokenKind::Reset, Some(fingerprint))
    }

    fn issue(
        &self,
        user_id: u64,
        role: Role,
        kind: TokenKind,
        fpr: Option<String>,
    ) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
            TokenKind::Reset => RESET_TOKEN_TTL_SECS,
        };
        let iat = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            role,
            kind,
            iat,
            exp: iat + ttl,
            jti: uuid::Uuid::new_v4().to_string(),
            fpr,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry, then check the token's kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        if token_data.claims.kind != expected {
            return Err(AuthError::WrongTokenKind);
        }
        Ok(token_data.claims)
    }

    /// Check that a reset token was minted against `password_hash`.
    pub fn fingerprint_matches(&self, claims: &SessionClaims, password_hash: &str) -> bool {
        let Some(encoded) = claims.fpr.as_deref() else {
            return false;
        };
        let Ok(expected) = Base64UrlUnpadded::decode_vec(encoded) else {
            return false;
        };
        match self.mac(password_hash) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }

    fn fingerprint(&self, password_hash: &str) -> Result<String, AuthError> {
        let tag = self.mac(password_hash)?.finalize().into_bytes();
        Ok(Base64UrlUnpadded::encode_string(&tag))
    }

    fn mac(&self, password_hash: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InternalError(format!("hmac key rejected: {e}")))?;
        mac.update(password_hash.as_bytes());
        Ok(mac)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Identity gate for the Coursify API: credential storage, session tokens
//! and role checks.
//!
//! ## Auth Flow
//!
//! 1. Client registers (`POST /register`) and logs in (`POST /login`)
//! 2. Server answers with an HS256 access token (15 min) and a refresh
//!    token (7 days)
//! 3. Client sends `Authorization: Bearer <access token>`
//! 4. The `Auth` extractor verifies signature, expiry and token kind, then
//!    exposes:
//!    - `sub` → `user_id`
//!    - `role` → `Role`
//!
//! ## Security
//!
//! - Passwords are stored as salted PBKDF2-HMAC-SHA256 hashes
//! - Login is rate-limited per client IP
//! - Refresh and reset tokens are never accepted as bearer credentials
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod password;
pub mod rate_limit;
pub mod roles;
pub mod tokens;

pub use claims::{AuthenticatedUser, SessionClaims, TokenKind};
pub use error::AuthError;
pub use extractor::{Auth, ClientIp, CourseAuthor};
pub use identity::{IdentityGate, Registration};
pub use rate_limit::LoginRateLimiter;
pub use roles::Role;
pub use tokens::{TokenPair, TokenService};

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{LoginRateLimiter, TokenService};
use crate::storage::CourseDatabase;

/// Window over which login attempts are counted.
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Shared application state, cloned into every handler.
///
/// The database handle is opened once at startup and passed here
/// explicitly; nothing else in the process holds a store connection.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<CourseDatabase>,
    pub tokens: Arc<TokenService>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    pub fn new(db: CourseDatabase, tokens: TokenService, login_attempts: NonZeroU32) -> Self {
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
            login_limiter: Arc::new(LoginRateLimiter::new(login_attempts, LOGIN_WINDOW)),
        }
    }

    /// In-memory state with a fixed secret, for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let db = CourseDatabase::in_memory().expect("in-memory database");
        let tokens = TokenService::new(b"test-secret-test-secret-test-secret", 900, 604800);
        Self::new(db, tokens, NonZeroU32::new(5).expect("non-zero"))
    }
}

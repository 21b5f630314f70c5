// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-client login throttling.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::Clock, DefaultKeyedRateLimiter, Quota, RateLimiter};

use super::error::AuthError;

/// Keyed limiter state is pruned once it tracks this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

/// Limits login attempts per client IP.
///
/// The whole budget of `attempts` is available at once and a spent attempt
/// comes back only after a full `window`, so no client ever gets more than
/// `attempts` logins inside one window.
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl LoginRateLimiter {
    /// Allow `attempts` logins per `window` for each client.
    pub fn new(attempts: NonZeroU32, window: Duration) -> Self {
        Self {
            limiter: RateLimiter::keyed(login_quota(attempts, window)),
        }
    }

    /// Record one attempt from `client`.
    ///
    /// # Errors
    /// `AuthError::RateLimited` when the client exhausted its budget.
    pub fn check(&self, client: IpAddr) -> Result<(), AuthError> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&client) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.limiter.clock().now());
                tracing::warn!(client = %client, retry_after_secs = wait.as_secs(), "Login rate limit hit");
                Err(AuthError::RateLimited {
                    retry_after_secs: wait.as_secs().max(1),
                })
            }
        }
    }
}

fn login_quota(attempts: NonZeroU32, window: Duration) -> Quota {
    Quota::with_period(window)
        .map(|quota| quota.allow_burst(attempts))
        .unwrap_or_else(|| Quota::per_second(attempts))
}

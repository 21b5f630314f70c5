// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account lifecycle: registration, login, token refresh and password reset.
//!
//! Password hashing is CPU-bound and runs on the blocking thread pool.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use super::tokens::{TokenPair, TokenService};
use super::{AuthError, Role, TokenKind};
use crate::error::{CourseError, CourseResult};
use crate::storage::{CourseDatabase, UserRecord, UserRepository};

/// Input for `IdentityGate::register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    /// Requested role; `None` means STUDENT.
    pub role: Option<Role>,
}

/// Credential checks and token issuance against the user table.
pub struct IdentityGate<'a> {
    db: &'a CourseDatabase,
    tokens: &'a TokenService,
}

impl<'a> IdentityGate<'a> {
    pub fn new(db: &'a CourseDatabase, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    /// Create an account.
    ///
    /// # Errors
    /// - `InvalidInput` for blank fields, a malformed email or a short password
    /// - `Forbidden` when ADMIN is requested
    /// - `Conflict` when the email is already registered
    pub async fn register(&self, registration: Registration) -> CourseResult<UserRecord> {
        let Registration {
            email,
            name,
            password,
            role,
        } = registration;

        if email.trim().is_empty() || name.trim().is_empty() || password.is_empty() {
            return Err(CourseError::InvalidInput("All fields are required".into()));
        }
        if !is_plausible_email(&email) {
            return Err(CourseError::InvalidInput("Email address is invalid".into()));
        }
        validate_password(&password)?;

        let role = role.unwrap_or_default();
        if !role.is_self_assignable() {
            return Err(CourseError::Forbidden(format!("Role {role} cannot be self-assigned")));
        }

        let password_hash = hash_off_thread(password).await?;
        let created = self.db.write(|txn| {
            UserRepository::new(txn).create(&email, &name, password_hash, role, Utc::now())
        })?;

        match created {
            Some(user) => {
                info!(user_id = user.id, role = %user.role, "User registered");
                Ok(user)
            }
            None => Err(CourseError::Conflict("User already exists".into())),
        }
    }

    /// Check credentials and issue an access/refresh pair.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> CourseResult<(UserRecord, TokenPair)> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(CourseError::InvalidInput("Email and password are required".into()));
        }

        let user = self
            .db
            .read(|txn| UserRepository::new(txn).find_by_email(email))?;
        let Some(user) = user else {
            info!("Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_off_thread(password.to_string(), user.password_hash.clone()).await? {
            info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = self.tokens.issue_pair(user.id, user.role)?;
        info!(user_id = user.id, "User logged in");
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new pair. The role is re-read from the
    /// user record so role changes take effect on refresh.
    pub fn refresh(&self, refresh_token: &str) -> CourseResult<TokenPair> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| CourseError::from(AuthError::MalformedToken))?;

        let user = self
            .db
            .read(|txn| UserRepository::new(txn).get(user_id))?
            .ok_or_else(|| CourseError::Unauthorized("Account no longer exists".into()))?;

        Ok(self.tokens.issue_pair(user.id, user.role)?)
    }

    /// Mint a reset token when the account exists.
    ///
    /// Delivery is out of band; the token is returned for the caller to hand
    /// off and is only written to the log at `debug` level. The HTTP layer never reveals whether it exists.
    pub fn forgot_password(&self, email: &str) -> CourseResult<Option<String>> {
        let user = self
            .db
            .read(|txn| UserRepository::new(txn).find_by_email(email))?;
        let Some(user) = user else {
            info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = self
            .tokens
            .issue_reset(user.id, user.role, &user.password_hash)?;
        info!(user_id = user.id, "Password reset token issued");
        debug!(user_id = user.id, reset_token = %token, "Password reset token for manual delivery");
        Ok(Some(token))
    }

    /// Set a new password using a reset token. Each token works once.
    pub async fn reset_password(&self, reset_token: &str, new_password: String) -> CourseResult<()> {
        validate_password(&new_password)?;

        let claims = self.tokens.verify(reset_token, TokenKind::Reset)?;
        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| CourseError::from(AuthError::MalformedToken))?;

        let password_hash = hash_off_thread(new_password).await?;

        // Fingerprint check and update share one transaction so a token
        // cannot be replayed by two concurrent requests.
        self.db.write(|txn| -> CourseResult<()> {
            let users = UserRepository::new(txn);
            let user = users
                .get(user_id)?
                .ok_or_else(|| CourseError::Unauthorized("Account no longer exists".into()))?;

            if !self.tokens.fingerprint_matches(&claims, &user.password_hash) {
                warn!(user_id, "Stale password reset token presented");
                return Err(AuthError::StaleResetToken.into());
            }

            users.set_password_hash(&user, password_hash)?;
            Ok(())
        })?;

        info!(user_id, "Password reset");
        Ok(())
    }

    /// Current profile of the caller.
    pub fn me(&self, user_id: u64) -> CourseResult<UserRecord> {
        self.db
            .read(|txn| UserRepository::new(txn).get(user_id))?
            .ok_or_else(|| CourseError::NotFound("User not found".into()))
    }

    /// Create an ADMIN account at startup unless the email already exists.
    pub async fn ensure_admin(&self, email: &str, password: String) -> CourseResult<()> {
        validate_password(&password)?;
        let password_hash = hash_off_thread(password).await?;
        let created = self.db.write(|txn| {
            UserRepository::new(txn).create(email, "Administrator", password_hash, Role::Admin, Utc::now())
        })?;

        match created {
            Some(user) => info!(user_id = user.id, "Seed admin created"),
            None => info!("Seed admin already present"),
        }
        Ok(())
    }
}

fn validate_password(password: &str) -> CourseResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CourseError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    }
}

async fn hash_off_thread(password: String) -> CourseResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| CourseError::Internal(format!("hashing task failed: {e}")))?
        .map_err(CourseError::from)
}

async fn verify_off_thread(password: String, encoded: String) -> CourseResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| CourseError::Internal(format!("verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (CourseDatabase, TokenService) {
        (
            CourseDatabase::in_memory().unwrap(),
            TokenService::new(b"test-secret-test-secret-test-secret", 900, 604800),
        )
    }

    fn registration(email: &str, role: Option<Role>) -> Registration {
        Registration {
            email: email.to_string(),
            name: "Ada".to_string(),
            password: "password123".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn register_defaults_to_student() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        let user = gate.register(registration("ada@example.com", None)).await.unwrap();
        assert_eq!(user.role, Role::Student);
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);

        let mut short = registration("a@example.com", None);
        short.password = "short".into();
        assert!(matches!(gate.register(short).await, Err(CourseError::InvalidInput(_))));

        let mut blank = registration("a@example.com", None);
        blank.name = "  ".into();
        assert!(matches!(gate.register(blank).await, Err(CourseError::InvalidInput(_))));

        assert!(matches!(
            gate.register(registration("not-an-email", None)).await,
            Err(CourseError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn admin_cannot_be_self_assigned() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        let result = gate.register(registration("root@example.com", Some(Role::Admin))).await;
        assert!(matches!(result, Err(CourseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        gate.register(registration("ada@example.com", None)).await.unwrap();
        let again = gate
            .register(registration("ADA@example.com", Some(Role::Instructor)))
            .await;
        assert!(matches!(again, Err(CourseError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        gate.register(registration("ada@example.com", None)).await.unwrap();

        let (user, pair) = gate.login("ada@example.com", "password123").await.unwrap();
        let claims = tokens.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id.to_string());

        let wrong = gate.login("ada@example.com", "password124").await;
        let unknown = gate.login("bob@example.com", "password123").await;
        match (wrong, unknown) {
            (Err(CourseError::Unauthorized(a)), Err(CourseError::Unauthorized(b))) => assert_eq!(a, b),
            other => panic!("expected two identical Unauthorized errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_issues_new_pair_only_for_refresh_tokens() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        gate.register(registration("ada@example.com", None)).await.unwrap();
        let (_, pair) = gate.login("ada@example.com", "password123").await.unwrap();

        assert!(gate.refresh(&pair.refresh_token).is_ok());
        assert!(matches!(
            gate.refresh(&pair.access_token),
            Err(CourseError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn reset_token_works_once() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        gate.register(registration("ada@example.com", None)).await.unwrap();

        assert!(gate.forgot_password("nobody@example.com").unwrap().is_none());
        let token = gate.forgot_password("ada@example.com").unwrap().unwrap();

        gate.reset_password(&token, "new-password-1".into()).await.unwrap();
        assert!(gate.login("ada@example.com", "new-password-1").await.is_ok());
        assert!(gate.login("ada@example.com", "password123").await.is_err());

        let replay = gate.reset_password(&token, "new-password-2".into()).await;
        assert!(matches!(replay, Err(CourseError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let (db, tokens) = fixture();
        let gate = IdentityGate::new(&db, &tokens);
        gate.ensure_admin("admin@example.com", "admin-password".into()).await.unwrap();
        gate.ensure_admin("admin@example.com", "admin-password".into()).await.unwrap();

        let (user, _) = gate.login("admin@example.com", "admin-password").await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}

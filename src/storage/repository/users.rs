// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.

use chrono::{DateTime, Utc};

use crate::auth::Role;

use super::super::database::{ReadScope, StoreResult, WriteScope, USERS};
use super::super::records::UserRecord;

/// Repository for user accounts.
pub struct UserRepository<'t, S> {
    scope: &'t S,
}

impl<'t, S: ReadScope> UserRepository<'t, S> {
    pub fn new(scope: &'t S) -> Self {
        Self { scope }
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        self.scope.load(USERS, user_id)
    }

    /// Find a user by email (case-insensitive).
    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        match self.scope.user_id_by_email(email)? {
            Some(user_id) => self.get(user_id),
            None => Ok(None),
        }
    }
}

impl<'t, S: WriteScope> UserRepository<'t, S> {
    /// Create a user. Returns `None` if the email is already registered.
    pub fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserRecord>> {
        if self.scope.user_id_by_email(email)?.is_some() {
            return Ok(None);
        }

        let id = self.scope.next_id("users")?;
        if !self.scope.claim_email(email, id)? {
            return Ok(None);
        }

        let user = UserRecord {
            id,
            email: email.trim().to_lowercase(),
            name: name.trim().to_string(),
            password_hash,
            role,
            created_at: now,
        };
        self.scope.store(USERS, id, &user)?;
        Ok(Some(user))
    }

    /// Replace a user's credential hash.
    pub fn set_password_hash(&self, user: &UserRecord, password_hash: String) -> StoreResult<UserRecord> {
        let updated = UserRecord {
            password_hash,
            ..user.clone()
        };
        self.scope.store(USERS, updated.id, &updated)?;
        Ok(updated)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Records persisted in the course database.
//!
//! Records are stored as JSON values keyed by their numeric id. They are
//! internal: API responses are built from them in `models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::enrollment::Progress;

use super::ownership::OwnedResource;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    pub name: String,
    /// PHC-style encoded PBKDF2 hash, never exposed via the API.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A course offered by an instructor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseRecord {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub image_url: Option<String>,
    /// Set at creation, never changed afterwards.
    pub instructor_id: u64,
    /// Mean review rating rounded to one decimal; 0 without reviews.
    #[serde(default)]
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CourseRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl OwnedResource for CourseRecord {
    fn owner_user_id(&self) -> u64 {
        self.instructor_id
    }
}

/// A lesson inside a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonRecord {
    pub id: u64,
    pub course_id: u64,
    pub title: String,
    pub video_url: Option<String>,
    /// Display position; ascending, duplicates allowed.
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

/// A user's enrollment in a course together with its progress document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub id: u64,
    pub user_id: u64,
    pub course_id: u64,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub progress: Progress,
    /// Incremented on every progress update (optimistic concurrency token).
    #[serde(default)]
    pub version: u64,
}

impl OwnedResource for EnrollmentRecord {
    fn owner_user_id(&self) -> u64 {
        self.user_id
    }
}

/// A rating left by an enrolled user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewRecord {
    pub id: u64,
    pub user_id: u64,
    pub course_id: u64,
    /// 1 to 5 inclusive.
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for ReviewRecord {
    fn owner_user_id(&self) -> u64 {
        self.user_id
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, may view any user's enrollments
/// - `Instructor` - Authors courses and lessons, otherwise a normal user
/// - `Student` - Enrolls in courses and reviews them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Enrolls, tracks progress, reviews
    Student,
    /// Owns courses and lessons
    Instructor,
    /// Platform administrator
    Admin,
}

impl Role {
    /// Whether this role may create courses and manage their lessons.
    pub fn can_author_courses(&self) -> bool {
        match self {
            Role::Instructor | Role::Admin => true,
            Role::Student => false,
        }
    }

    /// Whether this role may list another user's enrollments.
    pub fn can_view_any_enrollment(&self) -> bool {
        match self {
            Role::Admin => true,
            Role::Instructor | Role::Student => false,
        }
    }

    /// Whether a new account may pick this role at registration.
    pub fn is_self_assignable(&self) -> bool {
        match self {
            Role::Student | Role::Instructor => true,
            Role::Admin => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_uppercase().as_str() {
            "STUDENT" => Some(Role::Student),
            "INSTRUCTOR" => Some(Role::Instructor),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Default for Role {
    /// New accounts are students unless they ask otherwise.
    fn default() -> Self {
        Role::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "STUDENT"),
            Role::Instructor => write!(f, "INSTRUCTOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

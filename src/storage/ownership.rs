// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for stored records.
//!
//! A record owned by someone else is reported exactly like a missing record,
//! so callers cannot probe for the existence of other users' data.

use crate::error::CourseError;

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> u64;

    /// Whether `user_id` owns this resource.
    fn is_owned_by(&self, user_id: u64) -> bool {
        self.owner_user_id() == user_id
    }
}

/// Turn an optional lookup into an owned resource or a `NotFound` error.
pub trait OwnershipCheck<T> {
    /// Return the resource if it exists and belongs to `user_id`.
    ///
    /// # Errors
    /// Returns `CourseError::NotFound` with `what` as the message when the
    /// resource is absent or owned by another user.
    fn owned_by(self, user_id: u64, what: &str) -> Result<T, CourseError>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn owned_by(self, user_id: u64, what: &str) -> Result<T, CourseError> {
        match self {
            Some(resource) if resource.is_owned_by(user_id) => Ok(resource),
            _ => Err(CourseError::NotFound(what.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: u64,
    }

    impl OwnedResource for TestResource {
        fn owner_user_id(&self) -> u64 {
            self.owner
        }
    }

    #[test]
    fn owner_passes() {
        let resource = Some(TestResource { owner: 42 });
        assert!(resource.owned_by(42, "Thing not found").is_ok());
    }

    #[test]
    fn non_owner_looks_like_missing() {
        let resource = Some(TestResource { owner: 42 });
        let err = resource.owned_by(7, "Thing not found").err().unwrap();
        assert!(matches!(err, CourseError::NotFound(ref m) if m == "Thing not found"));
    }

    #[test]
    fn missing_resource_is_not_found() {
        let resource: Option<TestResource> = None;
        assert!(matches!(
            resource.owned_by(1, "Thing not found"),
            Err(CourseError::NotFound(_))
        ));
    }
}

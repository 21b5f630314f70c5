// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Record Store
//!
//! Durable storage for users, courses, lessons, enrollments and reviews,
//! backed by a single embedded redb database.
//!
//! ## Layout
//!
//! ```text
//! {DATA_DIR}/
//!   coursify.redb    # all tables, see `database` for the table layout
//! ```
//!
//! ## Usage
//!
//! Repositories borrow a transaction, so multi-step operations compose
//! inside one `CourseDatabase::write` call and commit (or abort) together:
//!
//! ```ignore
//! db.write(|txn| {
//!     let enrollment = EnrollmentRepository::new(txn).create(user_id, course_id, now)?;
//!     Ok::<_, StoreError>(enrollment)
//! })?;
//! ```

pub mod database;
pub mod ownership;
pub mod records;
pub mod repository;

pub use database::{CourseDatabase, ReadScope, StoreError, StoreResult, WriteScope};
pub use ownership::{OwnedResource, OwnershipCheck};
pub use records::{CourseRecord, EnrollmentRecord, LessonRecord, ReviewRecord, UserRecord};
pub use repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, NewCourse, NewLesson,
    ReviewRepository, UserRepository,
};

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the course database.
//!
//! Each repository borrows a transaction scope. Read methods work on both
//! read and write transactions; mutating methods require a write transaction,
//! so multi-step operations compose atomically inside a single commit.

pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod reviews;
pub mod users;

pub use courses::{CourseRepository, NewCourse};
pub use enrollments::EnrollmentRepository;
pub use lessons::{LessonRepository, NewLesson};
pub use reviews::ReviewRepository;
pub use users::UserRepository;

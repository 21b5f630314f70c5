// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course repository.
//!
//! Courses are never physically removed: deletion sets `deleted_at` and
//! "active" lookups filter soft-deleted rows out.

use chrono::{DateTime, Utc};

use super::super::database::{ReadScope, StoreResult, WriteScope, COURSES};
use super::super::records::CourseRecord;

/// Fields supplied when creating a course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub image_url: Option<String>,
}

/// Repository for courses.
pub struct CourseRepository<'t, S> {
    scope: &'t S,
}

impl<'t, S: ReadScope> CourseRepository<'t, S> {
    pub fn new(scope: &'t S) -> Self {
        Self { scope }
    }

    /// Get a course by ID, including soft-deleted ones.
    pub fn get(&self, course_id: u64) -> StoreResult<Option<CourseRecord>> {
        self.scope.load(COURSES, course_id)
    }

    /// Get a course by ID unless it is soft-deleted.
    pub fn get_active(&self, course_id: u64) -> StoreResult<Option<CourseRecord>> {
        Ok(self.get(course_id)?.filter(|course| !course.is_deleted()))
    }

    /// All courses that are not soft-deleted, newest first.
    pub fn list_active(&self) -> StoreResult<Vec<CourseRecord>> {
        let mut courses: Vec<CourseRecord> = self
            .scope
            .load_all(COURSES)?
            .into_iter()
            .filter(|course: &CourseRecord| !course.is_deleted())
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(courses)
    }
}

impl<'t, S: WriteScope> CourseRepository<'t, S> {
    /// Create a course owned by `instructor_id`.
    pub fn create(
        &self,
        course: NewCourse,
        instructor_id: u64,
        now: DateTime<Utc>,
    ) -> StoreResult<CourseRecord> {
        let id = self.scope.next_id("courses")?;
        let record = CourseRecord {
            id,
            title: course.title,
            description: course.description,
            price: course.price,
            category: course.category,
            image_url: course.image_url,
            instructor_id,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.scope.store(COURSES, id, &record)?;
        Ok(record)
    }

    /// Persist a modified course.
    pub fn save(&self, course: &CourseRecord) -> StoreResult<()> {
        self.scope.store(COURSES, course.id, course)
    }
}

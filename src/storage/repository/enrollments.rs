// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Enrollment repository.
//!
//! `(user_id, course_id)` is unique: `create` checks the `enrollment_keys`
//! index and inserts within the caller's write transaction, and redb never
//! runs two write transactions at once.

use chrono::{DateTime, Utc};

use crate::enrollment::Progress;

use super::super::database::{
    ReadScope, StoreResult, WriteScope, COURSE_ENROLLMENTS, ENROLLMENTS, ENROLLMENT_KEYS,
};
use super::super::records::EnrollmentRecord;

/// Repository for enrollments.
pub struct EnrollmentRepository<'t, S> {
    scope: &'t S,
}

impl<'t, S: ReadScope> EnrollmentRepository<'t, S> {
    pub fn new(scope: &'t S) -> Self {
        Self { scope }
    }

    pub fn get(&self, enrollment_id: u64) -> StoreResult<Option<EnrollmentRecord>> {
        self.scope.load(ENROLLMENTS, enrollment_id)
    }

    /// The enrollment of `user_id` in `course_id`, if any.
    pub fn find(&self, user_id: u64, course_id: u64) -> StoreResult<Option<EnrollmentRecord>> {
        match self.scope.lookup(ENROLLMENT_KEYS, (user_id, course_id))? {
            Some(enrollment_id) => self.get(enrollment_id),
            None => Ok(None),
        }
    }

    /// All enrollments of a user, most recent first.
    pub fn for_user(&self, user_id: u64) -> StoreResult<Vec<EnrollmentRecord>> {
        let mut enrollments = Vec::new();
        for enrollment_id in self.scope.children(ENROLLMENT_KEYS, user_id)? {
            if let Some(enrollment) = self.get(enrollment_id)? {
                enrollments.push(enrollment);
            }
        }
        enrollments.sort_by(|a: &EnrollmentRecord, b| {
            b.enrolled_at.cmp(&a.enrolled_at).then(b.id.cmp(&a.id))
        });
        Ok(enrollments)
    }

    pub fn count_for_course(&self, course_id: u64) -> StoreResult<u64> {
        self.scope.count_children(COURSE_ENROLLMENTS, course_id)
    }
}

impl<'t, S: WriteScope> EnrollmentRepository<'t, S> {
    /// Create an enrollment with empty progress.
    ///
    /// Returns `None` if the user is already enrolled in the course.
    pub fn create(
        &self,
        user_id: u64,
        course_id: u64,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<EnrollmentRecord>> {
        if self.scope.lookup(ENROLLMENT_KEYS, (user_id, course_id))?.is_some() {
            return Ok(None);
        }

        let id = self.scope.next_id("enrollments")?;
        let record = EnrollmentRecord {
            id,
            user_id,
            course_id,
            enrolled_at: now,
            progress: Progress::default(),
            version: 0,
        };
        self.scope.store(ENROLLMENTS, id, &record)?;
        self.scope.link(ENROLLMENT_KEYS, (user_id, course_id), id)?;
        self.scope.link(COURSE_ENROLLMENTS, (course_id, id), id)?;
        Ok(Some(record))
    }

    /// Persist a modified enrollment.
    pub fn save(&self, enrollment: &EnrollmentRecord) -> StoreResult<()> {
        self.scope.store(ENROLLMENTS, enrollment.id, enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CourseDatabase, StoreError};

    #[test]
    fn second_enrollment_for_same_pair_is_rejected() {
        let db = CourseDatabase::in_memory().unwrap();
        let first = db
            .write(|txn| EnrollmentRepository::new(txn).create(1, 10, Utc::now()))
            .unwrap();
        let second = db
            .write(|txn| EnrollmentRepository::new(txn).create(1, 10, Utc::now()))
            .unwrap();
        assert!(first.is_some());
        assert!(second.is_none());

        let count = db
            .read(|txn| EnrollmentRepository::new(txn).count_for_course(10))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn new_enrollment_has_empty_progress() {
        let db = CourseDatabase::in_memory().unwrap();
        let enrollment = db
            .write(|txn| EnrollmentRepository::new(txn).create(1, 10, Utc::now()))
            .unwrap()
            .unwrap();
        assert!(enrollment.progress.completed_lessons.is_empty());
        assert!(enrollment.progress.current_lesson.is_none());
        assert!(enrollment.progress.completed_at.is_none());
        assert_eq!(enrollment.version, 0);
    }

    #[test]
    fn for_user_is_most_recent_first() {
        let db = CourseDatabase::in_memory().unwrap();
        let earlier = Utc::now() - chrono::Duration::seconds(60);
        db.write(|txn| {
            let repo = EnrollmentRepository::new(txn);
            repo.create(1, 10, earlier)?;
            repo.create(1, 11, Utc::now())?;
            repo.create(2, 10, Utc::now())?;
            Ok::<_, StoreError>(())
        })
        .unwrap();

        let courses: Vec<u64> = db
            .read(|txn| EnrollmentRepository::new(txn).for_user(1))
            .unwrap()
            .into_iter()
            .map(|e| e.course_id)
            .collect();
        assert_eq!(courses, vec![11, 10]);

        let found = db
            .read(|txn| EnrollmentRepository::new(txn).find(2, 10))
            .unwrap();
        assert!(found.is_some());
    }
}

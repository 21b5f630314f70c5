// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Enrollment lifecycle and lesson progress tracking.
//!
//! Every mutation runs inside a single write transaction: the course and
//! lesson checks, the uniqueness check and the write are serialized against
//! concurrent requests, so two racing enrollments for the same pair produce
//! exactly one record and two racing progress updates never lose each other.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::AuthenticatedUser;
use crate::catalog::joins::enrolled_course;
use crate::error::{CourseError, CourseResult};
use crate::models::{EnrollmentDetail, EnrollmentList, EnrollmentProgress, ProgressReport};
use crate::storage::{
    CourseDatabase, CourseRepository, EnrollmentRecord, EnrollmentRepository, LessonRepository,
    OwnershipCheck, ReadScope,
};

const ENROLLMENT_NOT_FOUND: &str = "Enrollment not found";

pub struct EnrollmentEngine<'a> {
    db: &'a CourseDatabase,
}

impl<'a> EnrollmentEngine<'a> {
    pub fn new(db: &'a CourseDatabase) -> Self {
        Self { db }
    }

    /// Enroll the caller in an active course.
    pub fn enroll(&self, caller_id: u64, course_id: Option<u64>) -> CourseResult<EnrollmentDetail> {
        let course_id = course_id
            .filter(|id| *id != 0)
            .ok_or_else(|| CourseError::InvalidInput("Course ID is required".into()))?;

        let detail = self.db.write(|txn| -> CourseResult<EnrollmentDetail> {
            CourseRepository::new(txn)
                .get_active(course_id)?
                .ok_or_else(|| CourseError::NotFound("Course not found".into()))?;

            let enrollment = EnrollmentRepository::new(txn)
                .create(caller_id, course_id, Utc::now())?
                .ok_or_else(|| {
                    CourseError::Conflict("You are already enrolled in this course".into())
                })?;

            enrollment_detail(txn, enrollment)
        })?;

        info!(enrollment_id = detail.id, user_id = caller_id, course_id, "User enrolled");
        Ok(detail)
    }

    /// All enrollments of `target_user_id`, most recent first.
    ///
    /// Students may only list their own; admins may list anyone's.
    pub fn list_enrollments(
        &self,
        caller: &AuthenticatedUser,
        target_user_id: u64,
    ) -> CourseResult<EnrollmentList> {
        if caller.user_id != target_user_id && !caller.role.can_view_any_enrollment() {
            return Err(CourseError::Forbidden(
                "You can only view your own enrollments".into(),
            ));
        }
        self.enrollments_of(target_user_id)
    }

    /// The caller's own enrollments.
    pub fn history(&self, caller_id: u64) -> CourseResult<EnrollmentList> {
        self.enrollments_of(caller_id)
    }

    fn enrollments_of(&self, user_id: u64) -> CourseResult<EnrollmentList> {
        self.db.read(|txn| -> CourseResult<EnrollmentList> {
            let records = EnrollmentRepository::new(txn).for_user(user_id)?;
            let mut enrollments = Vec::with_capacity(records.len());
            for enrollment in records {
                enrollments.push(enrollment_detail(txn, enrollment)?);
            }
            Ok(EnrollmentList {
                total: enrollments.len() as u64,
                enrollments,
            })
        })
    }

    /// One of the caller's enrollments with derived progress metrics.
    pub fn get_enrollment(&self, caller_id: u64, enrollment_id: u64) -> CourseResult<EnrollmentProgress> {
        self.db.read(|txn| -> CourseResult<EnrollmentProgress> {
            let enrollment = EnrollmentRepository::new(txn)
                .get(enrollment_id)?
                .owned_by(caller_id, ENROLLMENT_NOT_FOUND)?;
            with_report(txn, enrollment)
        })
    }

    /// Mark a lesson completed or not completed.
    ///
    /// The lesson must belong to the course right now. When
    /// `expected_version` is given it must match the stored version.
    pub fn update_progress(
        &self,
        caller_id: u64,
        enrollment_id: u64,
        lesson_id: Option<u64>,
        completed: bool,
        expected_version: Option<u64>,
    ) -> CourseResult<EnrollmentProgress> {
        let lesson_id = lesson_id
            .filter(|id| *id != 0)
            .ok_or_else(|| CourseError::InvalidInput("Lesson ID is required".into()))?;

        let updated = self.db.write(|txn| -> CourseResult<EnrollmentProgress> {
            let enrollments = EnrollmentRepository::new(txn);
            let mut enrollment = enrollments
                .get(enrollment_id)?
                .owned_by(caller_id, ENROLLMENT_NOT_FOUND)?;

            let lesson_ids = LessonRepository::new(txn).ids_for_course(enrollment.course_id)?;
            if !lesson_ids.contains(&lesson_id) {
                return Err(CourseError::NotFound("Lesson not found in this course".into()));
            }

            if let Some(expected) = expected_version {
                if expected != enrollment.version {
                    return Err(CourseError::Conflict(format!(
                        "Enrollment was modified concurrently (expected version {expected}, found {})",
                        enrollment.version
                    )));
                }
            }

            enrollment.progress.apply(lesson_id, completed, &lesson_ids, Utc::now());
            enrollment.version += 1;
            enrollments.save(&enrollment)?;

            with_report(txn, enrollment)
        })?;

        debug!(
            enrollment_id,
            lesson_id,
            completed,
            version = updated.enrollment.version,
            state = ?updated.progress.state,
            "Progress updated"
        );
        Ok(updated)
    }
}

/// Enrollment joined with its course, instructor and lesson outline.
fn enrollment_detail<S: ReadScope>(scope: &S, enrollment: EnrollmentRecord) -> CourseResult<EnrollmentDetail> {
    // Soft-deleted courses stay visible to their enrollees.
    let course = CourseRepository::new(scope)
        .get(enrollment.course_id)?
        .ok_or_else(|| {
            CourseError::Internal(format!(
                "enrollment {} references missing course {}",
                enrollment.id, enrollment.course_id
            ))
        })?;

    Ok(EnrollmentDetail {
        id: enrollment.id,
        user_id: enrollment.user_id,
        course_id: enrollment.course_id,
        enrolled_at: enrollment.enrolled_at,
        progress: enrollment.progress,
        version: enrollment.version,
        course: enrolled_course(scope, course)?,
    })
}

fn with_report<S: ReadScope>(scope: &S, enrollment: EnrollmentRecord) -> CourseResult<EnrollmentProgress> {
    let enrollment = enrollment_detail(scope, enrollment)?;
    let lesson_ids: BTreeSet<u64> = enrollment.course.lessons.iter().map(|l| l.id).collect();
    let progress = ProgressReport::new(enrollment.progress.clone(), &lesson_ids);
    Ok(EnrollmentProgress {
        enrollment,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::Role;
    use crate::enrollment::ProgressState;
    use crate::storage::{CourseRecord, LessonRecord, NewCourse, NewLesson, UserRepository};

    struct Fixture {
        db: CourseDatabase,
        student: u64,
        course: CourseRecord,
        lessons: Vec<LessonRecord>,
    }

    fn user(db: &CourseDatabase, email: &str, role: Role) -> u64 {
        db.write(|txn| UserRepository::new(txn).create(email, "Ada", "h".into(), role, Utc::now()))
            .unwrap()
            .unwrap()
            .id
    }

    fn course_with_lessons(db: &CourseDatabase, instructor: u64, count: i32) -> (CourseRecord, Vec<LessonRecord>) {
        db.write(|txn| {
            let course = CourseRepository::new(txn).create(
                NewCourse {
                    title: "Rust".into(),
                    description: None,
                    price: 10.0,
                    category: "dev".into(),
                    image_url: None,
                },
                instructor,
                Utc::now(),
            )?;
            let lessons = LessonRepository::new(txn);
            let mut created = Vec::new();
            for order in 1..=count {
                created.push(lessons.create(
                    course.id,
                    NewLesson {
                        title: format!("Lesson {order}"),
                        video_url: None,
                        order,
                    },
                    Utc::now(),
                )?);
            }
            Ok::<_, crate::storage::StoreError>((course, created))
        })
        .unwrap()
    }

    fn fixture(lesson_count: i32) -> Fixture {
        let db = CourseDatabase::in_memory().unwrap();
        let instructor = user(&db, "grace@example.com", Role::Instructor);
        let student = user(&db, "ada@example.com", Role::Student);
        let (course, lessons) = course_with_lessons(&db, instructor, lesson_count);
        Fixture {
            db,
            student,
            course,
            lessons,
        }
    }

    fn caller(user_id: u64, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id,
            role,
            session_id: None,
            expires_at: 0,
        }
    }

    #[test]
    fn enroll_then_complete_every_lesson() {
        let f = fixture(2);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();
        assert!(enrollment.progress.completed_lessons.is_empty());
        assert_eq!(enrollment.course.lesson_count, 2);

        let first = engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), true, None)
            .unwrap();
        assert_eq!(first.progress.metrics.progress_percentage, 50);
        assert_eq!(first.progress.state, ProgressState::InProgress);
        assert!(first.enrollment.progress.completed_at.is_none());

        let second = engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[1].id), true, None)
            .unwrap();
        assert_eq!(second.progress.metrics.progress_percentage, 100);
        assert_eq!(second.progress.state, ProgressState::Completed);
        assert!(second.enrollment.progress.completed_at.is_some());
        assert_eq!(second.enrollment.progress.current_lesson, Some(f.lessons[1].id));
    }

    #[test]
    fn repeated_completion_is_idempotent() {
        let f = fixture(3);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();

        engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), true, None)
            .unwrap();
        let again = engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), true, None)
            .unwrap();

        assert_eq!(again.progress.metrics.completed_lessons_count, 1);
        assert_eq!(again.progress.metrics.progress_percentage, 33);
        assert_eq!(again.enrollment.version, 2);
    }

    #[test]
    fn unchecking_reopens_completed_course() {
        let f = fixture(1);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();
        let lesson = f.lessons[0].id;

        let done = engine
            .update_progress(f.student, enrollment.id, Some(lesson), true, None)
            .unwrap();
        assert_eq!(done.progress.state, ProgressState::Completed);

        let reopened = engine
            .update_progress(f.student, enrollment.id, Some(lesson), false, None)
            .unwrap();
        assert_eq!(reopened.progress.state, ProgressState::NotStarted);
        assert!(reopened.enrollment.progress.completed_at.is_none());
        assert_eq!(reopened.enrollment.progress.current_lesson, Some(lesson));
    }

    #[test]
    fn lesson_from_other_course_is_rejected() {
        let f = fixture(1);
        let (_, foreign) = course_with_lessons(&f.db, f.course.instructor_id, 1);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();

        let err = engine
            .update_progress(f.student, enrollment.id, Some(foreign[0].id), true, None)
            .unwrap_err();
        assert!(matches!(err, CourseError::NotFound(_)));

        let unchanged = engine.get_enrollment(f.student, enrollment.id).unwrap();
        assert_eq!(unchanged.enrollment.version, 0);
        assert!(unchanged.enrollment.progress.current_lesson.is_none());
    }

    #[test]
    fn deleted_lesson_is_no_longer_accepted() {
        let f = fixture(2);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();
        engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), true, None)
            .unwrap();

        f.db.write(|txn| LessonRepository::new(txn).delete(&f.lessons[0]))
            .unwrap();

        let err = engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), false, None)
            .unwrap_err();
        assert!(matches!(err, CourseError::NotFound(_)));

        let report = engine.get_enrollment(f.student, enrollment.id).unwrap();
        assert_eq!(report.progress.metrics.total_lessons, 1);
        assert_eq!(report.progress.metrics.completed_lessons_count, 0);
        assert_eq!(report.progress.metrics.progress_percentage, 0);
    }

    #[test]
    fn lesson_added_after_completion_reopens_enrollment() {
        let f = fixture(1);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();
        let done = engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), true, None)
            .unwrap();
        assert_eq!(done.progress.state, ProgressState::Completed);

        f.db.write(|txn| {
            LessonRepository::new(txn).create(
                f.course.id,
                NewLesson {
                    title: "Lesson 2".into(),
                    video_url: None,
                    order: 2,
                },
                Utc::now(),
            )
        })
        .unwrap();

        let report = engine.get_enrollment(f.student, enrollment.id).unwrap();
        assert_eq!(report.progress.metrics.progress_percentage, 50);
        assert_eq!(report.progress.state, ProgressState::InProgress);
    }

    #[test]
    fn enrollment_of_another_user_looks_missing() {
        let f = fixture(1);
        let intruder = user(&f.db, "eve@example.com", Role::Student);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();

        assert!(matches!(
            engine.get_enrollment(intruder, enrollment.id),
            Err(CourseError::NotFound(_))
        ));
        assert!(matches!(
            engine.update_progress(intruder, enrollment.id, Some(f.lessons[0].id), true, None),
            Err(CourseError::NotFound(_))
        ));
    }

    #[test]
    fn stale_expected_version_conflicts() {
        let f = fixture(2);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();

        engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[0].id), true, Some(0))
            .unwrap();
        let err = engine
            .update_progress(f.student, enrollment.id, Some(f.lessons[1].id), true, Some(0))
            .unwrap_err();
        assert!(matches!(err, CourseError::Conflict(_)));

        let report = engine.get_enrollment(f.student, enrollment.id).unwrap();
        assert_eq!(report.progress.metrics.completed_lessons_count, 1);
        assert_eq!(report.enrollment.version, 1);
    }

    #[test]
    fn enroll_validates_course() {
        let f = fixture(0);
        let engine = EnrollmentEngine::new(&f.db);

        assert!(matches!(engine.enroll(f.student, None), Err(CourseError::InvalidInput(_))));
        assert!(matches!(engine.enroll(f.student, Some(0)), Err(CourseError::InvalidInput(_))));
        assert!(matches!(engine.enroll(f.student, Some(9999)), Err(CourseError::NotFound(_))));

        engine.enroll(f.student, Some(f.course.id)).unwrap();
        assert!(matches!(
            engine.enroll(f.student, Some(f.course.id)),
            Err(CourseError::Conflict(_))
        ));
    }

    #[test]
    fn course_without_lessons_reports_zero_percent() {
        let f = fixture(0);
        let engine = EnrollmentEngine::new(&f.db);
        let enrollment = engine.enroll(f.student, Some(f.course.id)).unwrap();

        let report = engine.get_enrollment(f.student, enrollment.id).unwrap();
        assert_eq!(report.progress.metrics.total_lessons, 0);
        assert_eq!(report.progress.metrics.progress_percentage, 0);
        assert_eq!(report.progress.state, ProgressState::NotStarted);
    }

    #[test]
    fn listing_is_self_or_admin() {
        let f = fixture(1);
        let other = user(&f.db, "eve@example.com", Role::Student);
        let admin = user(&f.db, "root@example.com", Role::Admin);
        let engine = EnrollmentEngine::new(&f.db);
        engine.enroll(f.student, Some(f.course.id)).unwrap();

        assert!(matches!(
            engine.list_enrollments(&caller(other, Role::Student), f.student),
            Err(CourseError::Forbidden(_))
        ));

        let own = engine
            .list_enrollments(&caller(f.student, Role::Student), f.student)
            .unwrap();
        assert_eq!(own.total, 1);
        assert_eq!(own.enrollments[0].course.lessons.len(), 1);

        let as_admin = engine
            .list_enrollments(&caller(admin, Role::Admin), f.student)
            .unwrap();
        assert_eq!(as_admin.total, 1);

        assert_eq!(engine.history(f.student).unwrap().total, 1);
        assert_eq!(engine.history(other).unwrap().total, 0);
    }

    #[tokio::test]
    async fn concurrent_enrollments_produce_one_record() {
        let f = fixture(1);
        let db = Arc::new(f.db);
        let (student, course_id) = (f.student, f.course.id);

        let spawn = move |db: Arc<CourseDatabase>| {
            tokio::task::spawn_blocking(move || EnrollmentEngine::new(&db).enroll(student, Some(course_id)))
        };
        let (a, b) = tokio::join!(spawn(db.clone()), spawn(db.clone()));
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(CourseError::Conflict(_))))
                .count(),
            1
        );

        let count = db
            .read(|txn| EnrollmentRepository::new(txn).count_for_course(course_id))
            .unwrap();
        assert_eq!(count, 1);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course joins shared by the registry, the enrollment engine and the
//! rating aggregator. All of them read through the caller's transaction.

use crate::error::{CourseError, CourseResult};
use crate::models::{CourseResponse, EnrolledCourse, LessonSummary, UserSummary};
use crate::storage::{CourseRecord, LessonRepository, ReadScope, UserRecord, UserRepository};

/// The instructor record of a course.
pub fn instructor_of<S: ReadScope>(scope: &S, course: &CourseRecord) -> CourseResult<UserRecord> {
    UserRepository::new(scope)
        .get(course.instructor_id)?
        .ok_or_else(|| {
            CourseError::Internal(format!(
                "course {} references missing instructor {}",
                course.id, course.instructor_id
            ))
        })
}

/// Course joined with its instructor summary.
pub fn course_response<S: ReadScope>(scope: &S, course: CourseRecord) -> CourseResult<CourseResponse> {
    let instructor = instructor_of(scope, &course)?;
    Ok(CourseResponse::new(course, UserSummary::from(&instructor)))
}

/// Course joined with its instructor and lesson outline.
pub fn enrolled_course<S: ReadScope>(scope: &S, course: CourseRecord) -> CourseResult<EnrolledCourse> {
    let lessons: Vec<LessonSummary> = LessonRepository::new(scope)
        .for_course(course.id)?
        .iter()
        .map(LessonSummary::from)
        .collect();

    Ok(EnrolledCourse {
        lesson_count: lessons.len() as u64,
        lessons,
        course: course_response(scope, course)?,
    })
}

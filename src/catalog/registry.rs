// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course and lesson CRUD.
//!
//! Mutations are scoped to the owning instructor: a course or lesson owned
//! by someone else is reported as not found.

use chrono::Utc;
use tracing::info;

use super::joins::course_response;
use crate::auth::AuthenticatedUser;
use crate::error::{CourseError, CourseResult};
use crate::models::{
    CourseDetail, CourseList, CourseListItem, CourseListQuery, CourseResponse, CreateCourseRequest,
    CreateLessonRequest, LessonResponse, UpdateCourseRequest, UpdateLessonRequest,
};
use crate::storage::{
    CourseDatabase, CourseRecord, CourseRepository, EnrollmentRepository, LessonRepository,
    NewCourse, NewLesson, OwnershipCheck, ReviewRepository,
};

const COURSE_NOT_FOUND: &str = "Course not found";
const LESSON_NOT_FOUND: &str = "Lesson not found";

/// Lesson position used when the author does not pick one.
const DEFAULT_LESSON_ORDER: i32 = 1;

pub struct CourseRegistry<'a> {
    db: &'a CourseDatabase,
}

impl<'a> CourseRegistry<'a> {
    pub fn new(db: &'a CourseDatabase) -> Self {
        Self { db }
    }

    // -------------------------------------------------------------------------
    // Courses
    // -------------------------------------------------------------------------

    pub fn create_course(
        &self,
        author: &AuthenticatedUser,
        request: CreateCourseRequest,
    ) -> CourseResult<CourseResponse> {
        let (Some(price), false, false) = (
            request.price,
            request.title.trim().is_empty(),
            request.category.trim().is_empty(),
        ) else {
            return Err(CourseError::InvalidInput(
                "Title, price, and category are required".into(),
            ));
        };
        validate_price(price)?;

        let new_course = NewCourse {
            title: request.title.trim().to_string(),
            description: request.description,
            price,
            category: request.category.trim().to_string(),
            image_url: request.image_url,
        };

        let response = self.db.write(|txn| -> CourseResult<CourseResponse> {
            let course = CourseRepository::new(txn).create(new_course, author.user_id, Utc::now())?;
            course_response(txn, course)
        })?;

        info!(course_id = response.id, instructor_id = author.user_id, "Course created");
        Ok(response)
    }

    /// Non-deleted courses, newest first, filtered and paginated.
    pub fn list_courses(&self, query: &CourseListQuery) -> CourseResult<CourseList> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.db.read(|txn| -> CourseResult<CourseList> {
            let matching: Vec<CourseRecord> = CourseRepository::new(txn)
                .list_active()?
                .into_iter()
                .filter(|course| matches_filters(course, query, search.as_deref()))
                .collect();

            let (page, pagination) = query.page_query().paginate(matching);

            let lessons = LessonRepository::new(txn);
            let enrollments = EnrollmentRepository::new(txn);
            let mut courses = Vec::with_capacity(page.len());
            for course in page {
                let lesson_count = lessons.count_for_course(course.id)?;
                let enrollment_count = enrollments.count_for_course(course.id)?;
                courses.push(CourseListItem {
                    course: course_response(txn, course)?,
                    lesson_count,
                    enrollment_count,
                });
            }

            Ok(CourseList {
                courses,
                pagination,
            })
        })
    }

    pub fn get_course(&self, course_id: u64) -> CourseResult<CourseDetail> {
        self.db.read(|txn| -> CourseResult<CourseDetail> {
            let course = CourseRepository::new(txn)
                .get_active(course_id)?
                .ok_or_else(|| CourseError::NotFound(COURSE_NOT_FOUND.into()))?;

            let lessons: Vec<LessonResponse> = LessonRepository::new(txn)
                .for_course(course_id)?
                .into_iter()
                .map(LessonResponse::from)
                .collect();
            let enrollment_count = EnrollmentRepository::new(txn).count_for_course(course_id)?;
            let review_count = ReviewRepository::new(txn).count_for_course(course_id)?;

            Ok(CourseDetail {
                course: course_response(txn, course)?,
                lesson_count: lessons.len() as u64,
                lessons,
                enrollment_count,
                review_count,
            })
        })
    }

    pub fn update_course(
        &self,
        author: &AuthenticatedUser,
        course_id: u64,
        request: UpdateCourseRequest,
    ) -> CourseResult<CourseResponse> {
        if let Some(price) = request.price {
            validate_price(price)?;
        }
        let title = non_blank(request.title, "Title cannot be empty")?;
        let category = non_blank(request.category, "Category cannot be empty")?;

        self.db.write(|txn| -> CourseResult<CourseResponse> {
            let courses = CourseRepository::new(txn);
            let mut course = courses
                .get_active(course_id)?
                .owned_by(author.user_id, COURSE_NOT_FOUND)?;

            if let Some(title) = title {
                course.title = title;
            }
            if let Some(description) = request.description {
                course.description = Some(description);
            }
            if let Some(price) = request.price {
                course.price = price;
            }
            if let Some(category) = category {
                course.category = category;
            }
            if let Some(image_url) = request.image_url {
                course.image_url = Some(image_url);
            }
            course.updated_at = Utc::now();
            courses.save(&course)?;

            info!(course_id, "Course updated");
            course_response(txn, course)
        })
    }

    /// Soft delete: existing enrollments and reviews are kept.
    pub fn delete_course(&self, author: &AuthenticatedUser, course_id: u64) -> CourseResult<()> {
        self.db.write(|txn| -> CourseResult<()> {
            let courses = CourseRepository::new(txn);
            let mut course = courses
                .get_active(course_id)?
                .owned_by(author.user_id, COURSE_NOT_FOUND)?;

            let now = Utc::now();
            course.deleted_at = Some(now);
            course.updated_at = now;
            courses.save(&course)?;
            Ok(())
        })?;

        info!(course_id, instructor_id = author.user_id, "Course soft-deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lessons
    // -------------------------------------------------------------------------

    pub fn create_lesson(
        &self,
        author: &AuthenticatedUser,
        course_id: u64,
        request: CreateLessonRequest,
    ) -> CourseResult<LessonResponse> {
        if request.title.trim().is_empty() {
            return Err(CourseError::InvalidInput("Title is required".into()));
        }

        let lesson = self.db.write(|txn| -> CourseResult<_> {
            CourseRepository::new(txn)
                .get_active(course_id)?
                .owned_by(author.user_id, COURSE_NOT_FOUND)?;

            let lesson = LessonRepository::new(txn).create(
                course_id,
                NewLesson {
                    title: request.title.trim().to_string(),
                    video_url: request.video_url,
                    order: request.order.unwrap_or(DEFAULT_LESSON_ORDER),
                },
                Utc::now(),
            )?;
            Ok(lesson)
        })?;

        info!(course_id, lesson_id = lesson.id, "Lesson created");
        Ok(LessonResponse::from(lesson))
    }

    pub fn update_lesson(
        &self,
        author: &AuthenticatedUser,
        lesson_id: u64,
        request: UpdateLessonRequest,
    ) -> CourseResult<LessonResponse> {
        let title = non_blank(request.title, "Title cannot be empty")?;

        self.db.write(|txn| -> CourseResult<LessonResponse> {
            let lessons = LessonRepository::new(txn);
            let mut lesson = lessons
                .get(lesson_id)?
                .ok_or_else(|| CourseError::NotFound(LESSON_NOT_FOUND.into()))?;
            CourseRepository::new(txn)
                .get_active(lesson.course_id)?
                .owned_by(author.user_id, LESSON_NOT_FOUND)?;

            if let Some(title) = title {
                lesson.title = title;
            }
            if let Some(video_url) = request.video_url {
                lesson.video_url = Some(video_url);
            }
            if let Some(order) = request.order {
                lesson.order = order;
            }
            lessons.save(&lesson)?;

            info!(lesson_id, "Lesson updated");
            Ok(LessonResponse::from(lesson))
        })
    }

    /// Remove a lesson. Enrollment progress is reconciled lazily on the next
    /// progress update.
    pub fn delete_lesson(&self, author: &AuthenticatedUser, lesson_id: u64) -> CourseResult<()> {
        self.db.write(|txn| -> CourseResult<()> {
            let lessons = LessonRepository::new(txn);
            let lesson = lessons
                .get(lesson_id)?
                .ok_or_else(|| CourseError::NotFound(LESSON_NOT_FOUND.into()))?;
            CourseRepository::new(txn)
                .get_active(lesson.course_id)?
                .owned_by(author.user_id, LESSON_NOT_FOUND)?;

            lessons.delete(&lesson)?;
            Ok(())
        })?;

        info!(lesson_id, "Lesson deleted");
        Ok(())
    }
}

fn validate_price(price: f64) -> CourseResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(CourseError::InvalidInput(
            "Price must be a non-negative number".into(),
        ));
    }
    Ok(())
}

/// Trim an optional text field; present-but-blank is an error.
fn non_blank(value: Option<String>, message: &str) -> CourseResult<Option<String>> {
    match value {
        Some(text) if text.trim().is_empty() => Err(CourseError::InvalidInput(message.into())),
        Some(text) => Ok(Some(text.trim().to_string())),
        None => Ok(None),
    }
}

fn matches_filters(course: &CourseRecord, query: &CourseListQuery, search: Option<&str>) -> bool {
    if let Some(category) = query.category.as_deref() {
        if course.category != category {
            return false;
        }
    }
    if let Some(min) = query.min_price {
        if course.price < min {
            return false;
        }
    }
    if let Some(max) = query.max_price {
        if course.price > max {
            return false;
        }
    }
    match search {
        Some(needle) => {
            course.title.to_lowercase().contains(needle)
                || course
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(needle))
        }
        None => true,
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course reviews and the cached average rating.
//!
//! A review mutation and the recompute of `average_rating` share one write
//! transaction. The recompute step is best-effort: when it fails the error
//! is logged and the review mutation still commits.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::catalog::joins::instructor_of;
use crate::error::{CourseError, CourseResult};
use crate::models::{
    CourseInfo, CourseReviews, PageQuery, ReviewResponse, ReviewedCourse, Reviewer, UserReview,
    UserReviews,
};
use crate::storage::{
    CourseDatabase, CourseRepository, EnrollmentRepository, OwnershipCheck, ReadScope,
    ReviewRecord, ReviewRepository, UserRepository, WriteScope,
};

const REVIEW_NOT_FOUND: &str = "Review not found";
const INVALID_RATING: &str = "Rating is required and must be between 1 and 5";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub struct RatingAggregator<'a> {
    db: &'a CourseDatabase,
}

impl<'a> RatingAggregator<'a> {
    pub fn new(db: &'a CourseDatabase) -> Self {
        Self { db }
    }

    /// Review a course the caller is enrolled in.
    pub fn submit_review(
        &self,
        caller_id: u64,
        course_id: u64,
        rating: Option<i64>,
        comment: Option<String>,
    ) -> CourseResult<ReviewResponse> {
        let rating = validate_rating(rating)?;

        let review = self.db.write(|txn| -> CourseResult<ReviewResponse> {
            CourseRepository::new(txn)
                .get_active(course_id)?
                .ok_or_else(|| CourseError::NotFound("Course not found".into()))?;

            if EnrollmentRepository::new(txn).find(caller_id, course_id)?.is_none() {
                return Err(CourseError::Forbidden(
                    "You must be enrolled in this course to leave a review".into(),
                ));
            }

            let review = ReviewRepository::new(txn)
                .create(caller_id, course_id, rating, comment, Utc::now())?
                .ok_or_else(|| CourseError::Conflict("You have already reviewed this course".into()))?;

            refresh_average(txn, course_id);
            review_response(txn, review)
        })?;

        info!(review_id = review.id, course_id, rating, "Review submitted");
        Ok(review)
    }

    /// Replace the rating and comment of the caller's review. An absent
    /// comment clears the stored one.
    pub fn edit_review(
        &self,
        caller_id: u64,
        review_id: u64,
        rating: Option<i64>,
        comment: Option<String>,
    ) -> CourseResult<ReviewResponse> {
        let rating = validate_rating(rating)?;

        self.db.write(|txn| -> CourseResult<ReviewResponse> {
            let reviews = ReviewRepository::new(txn);
            let mut review = reviews
                .get(review_id)?
                .owned_by(caller_id, REVIEW_NOT_FOUND)?;

            review.rating = rating;
            review.comment = comment;
            review.updated_at = Utc::now();
            reviews.save(&review)?;

            refresh_average(txn, review.course_id);
            info!(review_id, rating, "Review updated");
            review_response(txn, review)
        })
    }

    pub fn delete_review(&self, caller_id: u64, review_id: u64) -> CourseResult<()> {
        self.db.write(|txn| -> CourseResult<()> {
            let reviews = ReviewRepository::new(txn);
            let review = reviews
                .get(review_id)?
                .owned_by(caller_id, REVIEW_NOT_FOUND)?;

            reviews.delete(&review)?;
            refresh_average(txn, review.course_id);
            Ok(())
        })?;

        info!(review_id, "Review deleted");
        Ok(())
    }

    /// Reviews of an active course, newest first, with the rating summary.
    pub fn list_course_reviews(&self, course_id: u64, page: PageQuery) -> CourseResult<CourseReviews> {
        self.db.read(|txn| -> CourseResult<CourseReviews> {
            let course = CourseRepository::new(txn)
                .get_active(course_id)?
                .ok_or_else(|| CourseError::NotFound("Course not found".into()))?;

            let all = ReviewRepository::new(txn).for_course(course_id)?;
            let rating_distribution = distribution(all.iter().map(|r| r.rating));
            let (window, pagination) = page.paginate(all);

            let mut reviews = Vec::with_capacity(window.len());
            for review in window {
                reviews.push(review_response(txn, review)?);
            }

            Ok(CourseReviews {
                reviews,
                course_info: CourseInfo {
                    id: course.id,
                    title: course.title,
                    average_rating: course.average_rating,
                    total_reviews: pagination.total,
                },
                pagination,
                rating_distribution,
            })
        })
    }

    /// The caller's own reviews, newest first.
    pub fn list_user_reviews(&self, caller_id: u64, page: PageQuery) -> CourseResult<UserReviews> {
        self.db.read(|txn| -> CourseResult<UserReviews> {
            let (window, pagination) = page.paginate(ReviewRepository::new(txn).for_user(caller_id)?);

            let courses = CourseRepository::new(txn);
            let mut reviews = Vec::with_capacity(window.len());
            for review in window {
                let course = courses.get(review.course_id)?.ok_or_else(|| {
                    CourseError::Internal(format!(
                        "review {} references missing course {}",
                        review.id, review.course_id
                    ))
                })?;
                let instructor = instructor_of(txn, &course)?;

                reviews.push(UserReview {
                    id: review.id,
                    rating: review.rating,
                    comment: review.comment,
                    created_at: review.created_at,
                    updated_at: review.updated_at,
                    course: ReviewedCourse {
                        id: course.id,
                        title: course.title,
                        instructor_name: instructor.name,
                    },
                });
            }

            Ok(UserReviews {
                reviews,
                pagination,
            })
        })
    }
}

fn validate_rating(rating: Option<i64>) -> CourseResult<u8> {
    rating
        .filter(|r| (i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(r))
        .and_then(|r| u8::try_from(r).ok())
        .ok_or_else(|| CourseError::InvalidInput(INVALID_RATING.into()))
}

/// Mean rating rounded half-up to one decimal; 0 without ratings.
pub fn average(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let count = ratings.len() as u64;
    let sum: u64 = ratings.iter().map(|r| u64::from(*r)).sum();
    let tenths = (sum * 20 + count) / (count * 2);
    tenths as f64 / 10.0
}

/// Review count per star, every star present.
fn distribution(ratings: impl Iterator<Item = u8>) -> BTreeMap<u8, u64> {
    let mut counts: BTreeMap<u8, u64> = (MIN_RATING..=MAX_RATING).map(|star| (star, 0)).collect();
    for rating in ratings {
        *counts.entry(rating).or_default() += 1;
    }
    counts
}

/// Recompute and store a course's average rating.
pub fn recompute_average<S: WriteScope>(scope: &S, course_id: u64) -> CourseResult<f64> {
    let courses = CourseRepository::new(scope);
    let mut course = courses
        .get(course_id)?
        .ok_or_else(|| CourseError::NotFound("Course not found".into()))?;

    let ratings = ReviewRepository::new(scope).ratings_for_course(course_id)?;
    course.average_rating = average(&ratings);
    courses.save(&course)?;
    Ok(course.average_rating)
}

fn refresh_average<S: WriteScope>(scope: &S, course_id: u64) {
    if let Err(err) = recompute_average(scope, course_id) {
        warn!(course_id, error = %err, "Failed to recompute course average rating");
    }
}

fn review_response<S: ReadScope>(scope: &S, review: ReviewRecord) -> CourseResult<ReviewResponse> {
    let user = UserRepository::new(scope).get(review.user_id)?.ok_or_else(|| {
        CourseError::Internal(format!(
            "review {} references missing user {}",
            review.id, review.user_id
        ))
    })?;

    Ok(ReviewResponse {
        id: review.id,
        course_id: review.course_id,
        rating: review.rating,
        comment: review.comment,
        created_at: review.created_at,
        updated_at: review.updated_at,
        user: Reviewer {
            id: user.id,
            name: user.name,
        },
    })
}

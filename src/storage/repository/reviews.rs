// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Review repository.
//!
//! `(user_id, course_id)` is unique, enforced through the `review_keys` index.

use chrono::{DateTime, Utc};

use super::super::database::{
    ReadScope, StoreResult, WriteScope, COURSE_REVIEWS, REVIEWS, REVIEW_KEYS,
};
use super::super::records::ReviewRecord;

/// Repository for reviews.
pub struct ReviewRepository<'t, S> {
    scope: &'t S,
}

fn newest_first(a: &ReviewRecord, b: &ReviewRecord) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

impl<'t, S: ReadScope> ReviewRepository<'t, S> {
    pub fn new(scope: &'t S) -> Self {
        Self { scope }
    }

    pub fn get(&self, review_id: u64) -> StoreResult<Option<ReviewRecord>> {
        self.scope.load(REVIEWS, review_id)
    }

    /// The review of `user_id` for `course_id`, if any.
    pub fn find(&self, user_id: u64, course_id: u64) -> StoreResult<Option<ReviewRecord>> {
        match self.scope.lookup(REVIEW_KEYS, (user_id, course_id))? {
            Some(review_id) => self.get(review_id),
            None => Ok(None),
        }
    }

    /// All reviews of a course, newest first.
    pub fn for_course(&self, course_id: u64) -> StoreResult<Vec<ReviewRecord>> {
        let mut reviews = self.collect(self.scope.children(COURSE_REVIEWS, course_id)?)?;
        reviews.sort_by(newest_first);
        Ok(reviews)
    }

    /// All reviews written by a user, newest first.
    pub fn for_user(&self, user_id: u64) -> StoreResult<Vec<ReviewRecord>> {
        let mut reviews = self.collect(self.scope.children(REVIEW_KEYS, user_id)?)?;
        reviews.sort_by(newest_first);
        Ok(reviews)
    }

    /// Every rating recorded for a course.
    pub fn ratings_for_course(&self, course_id: u64) -> StoreResult<Vec<u8>> {
        Ok(self
            .collect(self.scope.children(COURSE_REVIEWS, course_id)?)?
            .into_iter()
            .map(|review| review.rating)
            .collect())
    }

    pub fn count_for_course(&self, course_id: u64) -> StoreResult<u64> {
        self.scope.count_children(COURSE_REVIEWS, course_id)
    }

    fn collect(&self, review_ids: Vec<u64>) -> StoreResult<Vec<ReviewRecord>> {
        let mut reviews = Vec::with_capacity(review_ids.len());
        for review_id in review_ids {
            if let Some(review) = self.get(review_id)? {
                reviews.push(review);
            }
        }
        Ok(reviews)
    }
}

impl<'t, S: WriteScope> ReviewRepository<'t, S> {
    /// Create a review. Returns `None` if the user already reviewed the course.
    pub fn create(
        &self,
        user_id: u64,
        course_id: u64,
        rating: u8,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<ReviewRecord>> {
        if self.scope.lookup(REVIEW_KEYS, (user_id, course_id))?.is_some() {
            return Ok(None);
        }

        let id = self.scope.next_id("reviews")?;
        let record = ReviewRecord {
            id,
            user_id,
            course_id,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        };
        self.scope.store(REVIEWS, id, &record)?;
        self.scope.link(REVIEW_KEYS, (user_id, course_id), id)?;
        self.scope.link(COURSE_REVIEWS, (course_id, id), id)?;
        Ok(Some(record))
    }

    pub fn save(&self, review: &ReviewRecord) -> StoreResult<()> {
        self.scope.store(REVIEWS, review.id, review)
    }

    /// Remove a review and its index entries.
    pub fn delete(&self, review: &ReviewRecord) -> StoreResult<()> {
        self.scope.unlink(REVIEW_KEYS, (review.user_id, review.course_id))?;
        self.scope.unlink(COURSE_REVIEWS, (review.course_id, review.id))?;
        self.scope.erase(REVIEWS, review.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CourseDatabase, StoreError};

    #[test]
    fn one_review_per_user_and_course() {
        let db = CourseDatabase::in_memory().unwrap();
        let create = |user_id| {
            db.write(|txn| ReviewRepository::new(txn).create(user_id, 5, 4, None, Utc::now()))
        };
        assert!(create(1).unwrap().is_some());
        assert!(create(1).unwrap().is_none());
        assert!(create(2).unwrap().is_some());

        let ratings = db
            .read(|txn| ReviewRepository::new(txn).ratings_for_course(5))
            .unwrap();
        assert_eq!(ratings, vec![4, 4]);
    }

    #[test]
    fn delete_frees_the_pair() {
        let db = CourseDatabase::in_memory().unwrap();
        let review = db
            .write(|txn| ReviewRepository::new(txn).create(1, 5, 3, Some("ok".into()), Utc::now()))
            .unwrap()
            .unwrap();

        db.write(|txn| ReviewRepository::new(txn).delete(&review)).unwrap();

        db.read(|txn| {
            let repo = ReviewRepository::new(txn);
            assert!(repo.get(review.id)?.is_none());
            assert!(repo.find(1, 5)?.is_none());
            assert_eq!(repo.count_for_course(5)?, 0);
            Ok::<_, StoreError>(())
        })
        .unwrap();

        let again = db
            .write(|txn| ReviewRepository::new(txn).create(1, 5, 5, None, Utc::now()))
            .unwrap();
        assert!(again.is_some());
    }

    #[test]
    fn for_user_spans_courses() {
        let db = CourseDatabase::in_memory().unwrap();
        db.write(|txn| {
            let repo = ReviewRepository::new(txn);
            repo.create(1, 5, 3, None, Utc::now() - chrono::Duration::seconds(5))?;
            repo.create(1, 6, 4, None, Utc::now())?;
            Ok::<_, StoreError>(())
        })
        .unwrap();

        let courses: Vec<u64> = db
            .read(|txn| ReviewRepository::new(txn).for_user(1))
            .unwrap()
            .into_iter()
            .map(|r| r.course_id)
            .collect();
        assert_eq!(courses, vec![6, 5]);
    }
}

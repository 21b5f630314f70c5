// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lesson repository.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::super::database::{ReadScope, StoreResult, WriteScope, COURSE_LESSONS, LESSONS};
use super::super::records::LessonRecord;

/// Fields supplied when creating a lesson.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub video_url: Option<String>,
    pub order: i32,
}

/// Repository for lessons.
pub struct LessonRepository<'t, S> {
    scope: &'t S,
}

impl<'t, S: ReadScope> LessonRepository<'t, S> {
    pub fn new(scope: &'t S) -> Self {
        Self { scope }
    }

    pub fn get(&self, lesson_id: u64) -> StoreResult<Option<LessonRecord>> {
        self.scope.load(LESSONS, lesson_id)
    }

    /// Lessons of a course sorted by `order` ascending (ties by id).
    pub fn for_course(&self, course_id: u64) -> StoreResult<Vec<LessonRecord>> {
        let mut lessons = Vec::new();
        for lesson_id in self.scope.children(COURSE_LESSONS, course_id)? {
            if let Some(lesson) = self.get(lesson_id)? {
                lessons.push(lesson);
            }
        }
        lessons.sort_by(|a: &LessonRecord, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
        Ok(lessons)
    }

    /// Ids of the lessons currently belonging to a course.
    pub fn ids_for_course(&self, course_id: u64) -> StoreResult<BTreeSet<u64>> {
        Ok(self
            .scope
            .children(COURSE_LESSONS, course_id)?
            .into_iter()
            .collect())
    }

    pub fn count_for_course(&self, course_id: u64) -> StoreResult<u64> {
        self.scope.count_children(COURSE_LESSONS, course_id)
    }
}

impl<'t, S: WriteScope> LessonRepository<'t, S> {
    pub fn create(
        &self,
        course_id: u64,
        lesson: NewLesson,
        now: DateTime<Utc>,
    ) -> StoreResult<LessonRecord> {
        let id = self.scope.next_id("lessons")?;
        let record = LessonRecord {
            id,
            course_id,
            title: lesson.title,
            video_url: lesson.video_url,
            order: lesson.order,
            created_at: now,
        };
        self.scope.store(LESSONS, id, &record)?;
        self.scope.link(COURSE_LESSONS, (course_id, id), id)?;
        Ok(record)
    }

    pub fn save(&self, lesson: &LessonRecord) -> StoreResult<()> {
        self.scope.store(LESSONS, lesson.id, lesson)
    }

    /// Remove a lesson and detach it from its course.
    pub fn delete(&self, lesson: &LessonRecord) -> StoreResult<()> {
        self.scope.unlink(COURSE_LESSONS, (lesson.course_id, lesson.id))?;
        self.scope.erase(LESSONS, lesson.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CourseDatabase, StoreError};

    fn lesson(title: &str, order: i32) -> NewLesson {
        NewLesson {
            title: title.to_string(),
            video_url: None,
            order,
        }
    }

    #[test]
    fn lessons_sort_by_order_then_id() {
        let db = CourseDatabase::in_memory().unwrap();
        db.write(|txn| {
            let repo = LessonRepository::new(txn);
            repo.create(1, lesson("c", 3), Utc::now())?;
            repo.create(1, lesson("a", 1), Utc::now())?;
            repo.create(1, lesson("b", 1), Utc::now())?;
            repo.create(2, lesson("other", 0), Utc::now())?;
            Ok::<_, StoreError>(())
        })
        .unwrap();

        let titles: Vec<String> = db
            .read(|txn| LessonRepository::new(txn).for_course(1))
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn delete_detaches_lesson() {
        let db = CourseDatabase::in_memory().unwrap();
        let created = db
            .write(|txn| LessonRepository::new(txn).create(4, lesson("x", 1), Utc::now()))
            .unwrap();

        db.write(|txn| LessonRepository::new(txn).delete(&created)).unwrap();

        db.read(|txn| {
            let repo = LessonRepository::new(txn);
            assert!(repo.get(created.id)?.is_none());
            assert_eq!(repo.count_for_course(4)?, 0);
            assert!(repo.ids_for_course(4)?.is_empty());
            Ok::<_, StoreError>(())
        })
        .unwrap();
    }
}

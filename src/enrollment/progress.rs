// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-enrollment progress document and its derived metrics.
//!
//! ## States
//!
//! - `NotStarted`: no lesson completed
//! - `InProgress`: some but not all lessons completed
//! - `Completed`: every current lesson completed
//!
//! The state is always judged against the course's current lessons, so a
//! lesson added after completion reopens the enrollment. `completed_at` is
//! recomputed on every update and is not sticky: unchecking a lesson of a
//! completed course clears it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lesson completion state of one enrollment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Progress {
    /// Ids of completed lessons (no duplicates).
    #[schema(value_type = Vec<u64>)]
    pub completed_lessons: BTreeSet<u64>,
    /// Last lesson touched by a progress update.
    pub current_lesson: Option<u64>,
    /// When every lesson became completed; absent otherwise.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Coarse progress state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    NotStarted,
    InProgress,
    Completed,
}

/// Metrics derived from a progress document and the course's current lessons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProgressMetrics {
    pub total_lessons: u64,
    pub completed_lessons_count: u64,
    /// `round(100 * completed / total)`; 0 for a course without lessons.
    pub progress_percentage: u32,
}

impl Progress {
    /// Apply one lesson toggle and recompute completion.
    ///
    /// `lesson_ids` must be the course's lessons at call time. Completed ids
    /// that no longer belong to the course are dropped so the set stays a
    /// subset of the current lessons.
    pub fn apply(
        &mut self,
        lesson_id: u64,
        completed: bool,
        lesson_ids: &BTreeSet<u64>,
        now: DateTime<Utc>,
    ) {
        self.completed_lessons.retain(|id| lesson_ids.contains(id));

        if completed {
            self.completed_lessons.insert(lesson_id);
        } else {
            self.completed_lessons.remove(&lesson_id);
        }

        self.current_lesson = Some(lesson_id);

        let total = lesson_ids.len() as u64;
        if self.completed_count() == total {
            self.completed_at = Some(now);
        } else {
            self.completed_at = None;
        }
    }

    pub fn completed_count(&self) -> u64 {
        self.completed_lessons.len() as u64
    }

    /// State against the course's current lessons.
    pub fn state(&self, lesson_ids: &BTreeSet<u64>) -> ProgressState {
        self.metrics(lesson_ids).state()
    }

    /// Metrics against the course's current lessons.
    ///
    /// Only completed ids that still belong to the course are counted, so a
    /// lesson deleted since the last update never pushes the percentage
    /// above 100.
    pub fn metrics(&self, lesson_ids: &BTreeSet<u64>) -> ProgressMetrics {
        let total_lessons = lesson_ids.len() as u64;
        let completed = self.completed_lessons.intersection(lesson_ids).count() as u64;
        ProgressMetrics {
            total_lessons,
            completed_lessons_count: completed,
            progress_percentage: percentage(completed, total_lessons),
        }
    }
}

impl ProgressMetrics {
    pub fn state(&self) -> ProgressState {
        if self.completed_lessons_count == 0 {
            ProgressState::NotStarted
        } else if self.completed_lessons_count == self.total_lessons {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        }
    }
}

/// Integer `round(100 * part / whole)` with halves rounded up.
fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 200 + whole) / (whole * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lessons(ids: &[u64]) -> BTreeSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn new_progress_is_not_started() {
        let progress = Progress::default();
        assert_eq!(progress.state(&lessons(&[1])), ProgressState::NotStarted);
        assert!(progress.current_lesson.is_none());
        assert!(progress.completed_at.is_none());
    }

    #[test]
    fn two_lesson_course_walkthrough() {
        let ids = lessons(&[1, 2]);
        let mut progress = Progress::default();

        progress.apply(1, true, &ids, Utc::now());
        assert!(progress.completed_at.is_none());
        assert_eq!(progress.metrics(&ids).progress_percentage, 50);
        assert_eq!(progress.state(&ids), ProgressState::InProgress);

        progress.apply(2, true, &ids, Utc::now());
        assert!(progress.completed_at.is_some());
        assert_eq!(progress.metrics(&ids).progress_percentage, 100);
        assert_eq!(progress.state(&ids), ProgressState::Completed);

        progress.apply(1, false, &ids, Utc::now());
        assert!(progress.completed_at.is_none());
        assert_eq!(progress.metrics(&ids).progress_percentage, 50);
        assert_eq!(progress.current_lesson, Some(1));
    }

    #[test]
    fn toggles_are_idempotent() {
        let ids = lessons(&[1, 2, 3]);
        let mut progress = Progress::default();

        progress.apply(2, true, &ids, Utc::now());
        progress.apply(2, true, &ids, Utc::now());
        assert_eq!(progress.completed_count(), 1);

        progress.apply(3, false, &ids, Utc::now());
        progress.apply(3, false, &ids, Utc::now());
        assert_eq!(progress.completed_count(), 1);
        assert_eq!(progress.current_lesson, Some(3));
    }

    #[test]
    fn removed_lessons_are_pruned_on_update() {
        let mut progress = Progress::default();
        progress.apply(1, true, &lessons(&[1, 2, 3]), Utc::now());
        progress.apply(2, true, &lessons(&[1, 2, 3]), Utc::now());

        // Lesson 1 was deleted from the course; finishing 3 completes it.
        progress.apply(3, true, &lessons(&[2, 3]), Utc::now());
        assert_eq!(progress.completed_lessons, lessons(&[2, 3]));
        assert!(progress.completed_at.is_some());
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn stale_completions_are_not_counted() {
        let mut progress = Progress::default();
        progress.apply(1, true, &lessons(&[1, 2]), Utc::now());
        progress.apply(2, true, &lessons(&[1, 2]), Utc::now());

        let metrics = progress.metrics(&lessons(&[2, 3, 4]));
        assert_eq!(metrics.completed_lessons_count, 1);
        assert_eq!(metrics.total_lessons, 3);
        assert_eq!(metrics.progress_percentage, 33);
        assert_eq!(metrics.state(), ProgressState::InProgress);
    }

    #[test]
    fn added_lesson_reopens_completed_progress() {
        let mut progress = Progress::default();
        progress.apply(1, true, &lessons(&[1]), Utc::now());
        assert_eq!(progress.state(&lessons(&[1])), ProgressState::Completed);

        assert_eq!(progress.state(&lessons(&[1, 2])), ProgressState::InProgress);
    }

    #[test]
    fn deleting_the_last_open_lesson_completes_progress() {
        let mut progress = Progress::default();
        progress.apply(1, true, &lessons(&[1, 2]), Utc::now());
        assert!(progress.completed_at.is_none());

        let metrics = progress.metrics(&lessons(&[1]));
        assert_eq!(metrics.progress_percentage, 100);
        assert_eq!(metrics.state(), ProgressState::Completed);
    }

    #[test]
    fn zero_lessons_does_not_divide_by_zero() {
        let metrics = Progress::default().metrics(&BTreeSet::new());
        assert_eq!(metrics.total_lessons, 0);
        assert_eq!(metrics.progress_percentage, 0);
        assert_eq!(metrics.state(), ProgressState::NotStarted);
    }
}

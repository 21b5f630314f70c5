// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Enrollments and per-lesson progress.

pub mod engine;
pub mod progress;

pub use engine::EnrollmentEngine;
pub use progress::{Progress, ProgressMetrics, ProgressState};

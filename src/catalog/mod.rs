// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course catalog: courses, lessons and the joins other modules render them
//! with.

pub mod joins;
pub mod registry;

pub use registry::CourseRegistry;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coursify - Course Marketplace Backend
//!
//! Tracks per-lesson progress of course enrollments and keeps each course's
//! average review rating consistent with its reviews, on top of an embedded
//! ACID record store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Accounts, session tokens and role checks
//! - `catalog` - Course and lesson registry
//! - `enrollment` - Enrollments and progress tracking
//! - `rating` - Reviews and average rating aggregation
//! - `storage` - Record store (redb) and typed repositories

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod models;
pub mod rating;
pub mod state;
pub mod storage;

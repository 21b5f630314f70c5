// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course reviews and rating aggregation.

pub mod aggregator;

pub use aggregator::{average, recompute_average, RatingAggregator};

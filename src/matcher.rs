// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! The pluggable predicate that decides which ways Pass 2 matches.

/// Decides whether a way's tags qualify it for extraction.
///
/// `Sync` so the same matcher can be shared, read-only, across the parallel
/// scanner's worker threads.
pub trait WayMatcher: Sync {
    fn matches(&self, tags: &[(String, String)]) -> bool;
}

/// The default matcher: `leisure=golf_course`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GolfCourseMatcher;

impl WayMatcher for GolfCourseMatcher {
    fn matches(&self, tags: &[(String, String)]) -> bool {
        tags.iter()
            .any(|(k, v)| k == "leisure" && v == "golf_course")
    }
}

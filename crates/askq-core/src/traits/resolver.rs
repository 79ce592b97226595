// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolver trait for turning request text into a canned answer.

use crate::types::{Answer, Category};

/// Looks up answers for request text.
///
/// Implementations hold an ordered list of procedures. The order is a
/// priority contract: when several procedures match, the earliest one wins.
pub trait Resolver: Send + Sync + 'static {
    /// Returns the answer of the first matching procedure, if any.
    fn lookup(&self, text: &str) -> Option<Answer>;

    /// Fallback answer used whenever [`lookup`](Resolver::lookup) finds nothing.
    fn default_help(&self) -> Answer;

    /// Quick-submit shortcuts in first-appearance order, one keyword per category.
    fn categories(&self) -> Vec<Category>;

    /// Answer for `text`, falling back to the default help.
    fn resolve(&self, text: &str) -> Answer {
        self.lookup(text).unwrap_or_else(|| self.default_help())
    }
}

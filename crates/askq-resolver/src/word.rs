// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-word keyword matching.

use askq_core::{Answer, Category, Resolver};
use regex::Regex;
use tracing::warn;

use crate::procedure::Catalog;

/// Matches a keyword only where it starts and ends on a word boundary.
#[derive(Debug, Clone)]
pub struct WordResolver {
    catalog: Catalog,
    /// One compiled pattern per procedure, alternating its keywords.
    /// `None` for a procedure without keywords.
    patterns: Vec<Option<Regex>>,
}

impl WordResolver {
    pub fn new(catalog: Catalog) -> Self {
        let patterns = catalog
            .procedures
            .iter()
            .map(|p| {
                if p.keywords.is_empty() {
                    return None;
                }
                let alternatives: Vec<String> =
                    p.keywords.iter().map(|k| regex::escape(k)).collect();
                let pattern = format!(r"\b(?:{})\b", alternatives.join("|"));
                match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(category = %p.category, error = %e, "keyword pattern rejected");
                        None
                    }
                }
            })
            .collect();
        Self { catalog, patterns }
    }
}

impl Resolver for WordResolver {
    fn lookup(&self, text: &str) -> Option<Answer> {
        let lower = text.to_lowercase();
        self.catalog
            .procedures
            .iter()
            .zip(&self.patterns)
            .find(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(&lower)))
            .map(|(p, _)| p.to_answer())
    }

    fn default_help(&self) -> Answer {
        self.catalog.default_answer()
    }

    fn categories(&self) -> Vec<Category> {
        self.catalog.categories()
    }
}

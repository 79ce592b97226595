// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Substring keyword matching.

use askq_core::{Answer, Category, Resolver};

use crate::procedure::Catalog;

/// Matches a keyword anywhere inside the lowercased request text.
///
/// `"time"` matches `"sometimes"`; use [`WordResolver`](crate::WordResolver)
/// when that is undesirable.
#[derive(Debug, Clone)]
pub struct SubstringResolver {
    catalog: Catalog,
}

impl SubstringResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Resolver for SubstringResolver {
    fn lookup(&self, text: &str) -> Option<Answer> {
        let lower = text.to_lowercase();
        self.catalog
            .procedures
            .iter()
            .find(|p| p.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|p| p.to_answer())
    }

    fn default_help(&self) -> Answer {
        self.catalog.default_answer()
    }

    fn categories(&self) -> Vec<Category> {
        self.catalog.categories()
    }
}

// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword procedure resolution for the askq request queue.
//!
//! This crate provides:
//! - [`Catalog`]: the ordered procedure table, built in or loaded from TOML
//! - [`SubstringResolver`]: keyword matches anywhere in the text
//! - [`WordResolver`]: keyword matches on word boundaries only

pub mod procedure;
pub mod substring;
pub mod word;

use std::path::Path;
use std::sync::Arc;

use askq_config::model::{MatchStrategy, ResolverConfig};
use askq_core::{AskqError, Resolver};
use tracing::info;

pub use procedure::{builtin_catalog, Catalog, Procedure};
pub use substring::SubstringResolver;
pub use word::WordResolver;

/// Build the resolver described by `config`.
pub fn build_resolver(config: &ResolverConfig) -> Result<Arc<dyn Resolver>, AskqError> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(Path::new(path))?,
        None => builtin_catalog(),
    };
    info!(
        strategy = %config.strategy,
        procedures = catalog.procedures.len(),
        "resolver ready"
    );
    Ok(match config.strategy {
        MatchStrategy::Substring => Arc::new(SubstringResolver::new(catalog)),
        MatchStrategy::Word => Arc::new(WordResolver::new(catalog)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_substring_resolver() {
        let resolver = build_resolver(&ResolverConfig::default()).unwrap();
        assert!(resolver.lookup("sometimes").is_some());
        assert_eq!(resolver.categories().len(), 8);
    }

    #[test]
    fn word_strategy_and_custom_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
default_help = "Library help."

[[procedures]]
category = "Loans"
keywords = ["borrow"]
answer = "Bring your ID."
"#,
        )
        .unwrap();

        let config = ResolverConfig {
            strategy: MatchStrategy::Word,
            catalog_path: Some(path.display().to_string()),
        };
        let resolver = build_resolver(&config).unwrap();
        assert_eq!(resolver.resolve("can I borrow this").text, "Bring your ID.");
        assert_eq!(resolver.resolve("borrowing").text, "Library help.");
    }
}

// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered `askq.toml` configuration.
//!
//! Compiled defaults are overlaid by `/etc/askq/askq.toml`, the user config
//! dir, `./askq.toml` and `ASKQ_*` variables, or by a single file given with
//! `--config`. Every entry point returns either a validated [`AskqConfig`] or
//! all problems found, as [`ConfigError`] diagnostics.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::AskqConfig;

/// Load from the standard locations and validate.
pub fn load_and_validate() -> Result<AskqConfig, Vec<ConfigError>> {
    checked(loader::load_config(), standard_sources)
}

/// Load from `path` (plus `ASKQ_*` overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<AskqConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load from TOML text alone and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<AskqConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a loaded config, or turn the load error into diagnostics.
///
/// Sources are only read when there is an error to point into.
fn checked(
    loaded: Result<AskqConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<AskqConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}

/// The files [`load_and_validate`] may have read, keyed the way figment names them.
fn standard_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into());

    [Some(local), loader::user_config_path(), Some(loader::SYSTEM_CONFIG_PATH.into())]
        .into_iter()
        .flatten()
        .filter_map(|path| read_source(&path))
        .collect()
}

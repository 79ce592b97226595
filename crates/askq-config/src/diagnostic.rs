// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered through miette.
//!
//! Figment reports an unknown key as a path such as `["storage", "backend_typ"]`.
//! The key is reported against the table it appeared in, and the suggestion
//! and valid-key list come from that table alone. A misspelled table name is
//! its own diagnostic and is matched against [`SECTIONS`].

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::{Error as FigmentError, Kind};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Top-level tables of `askq.toml`.
pub const SECTIONS: &[&str] = &["agent", "queue", "client", "storage", "resolver"];

/// Jaro-Winkler score a candidate must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, ready for [`render_errors`].
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that its table does not define.
    #[error("unknown key `{key}` in [{section}]")]
    #[diagnostic(
        code(askq::config::unknown_key),
        help("{}", unknown_key_help(section, suggestion.as_deref(), valid_keys, env_var.as_deref()))
    )]
    UnknownKey {
        section: String,
        key: String,
        suggestion: Option<String>,
        /// Keys the table accepts, in declaration order.
        valid_keys: Vec<String>,
        /// Set when the key came from the environment rather than a file.
        env_var: Option<String>,
        #[label("unknown key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A table name that is not one of [`SECTIONS`].
    #[error("unknown section [{name}]")]
    #[diagnostic(
        code(askq::config::unknown_section),
        help("{}", unknown_section_help(suggestion.as_deref()))
    )]
    UnknownSection {
        name: String,
        suggestion: Option<String>,
        #[label("unknown section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into its key's type.
    #[error("invalid type for `{key}`: found {found}")]
    #[diagnostic(code(askq::config::invalid_type), help("`{key}` expects {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `queue.transcript_cap`.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but is out of range.
    #[error("validation error: {message}")]
    #[diagnostic(code(askq::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(askq::config::other))]
    Other(String),
}

fn unknown_key_help(
    section: &str,
    suggestion: Option<&str>,
    valid_keys: &[String],
    env_var: Option<&str>,
) -> String {
    let mut help = match suggestion {
        Some(s) => format!("did you mean `{s}`? "),
        None => String::new(),
    };
    help.push_str(&format!("[{section}] accepts: {}", valid_keys.join(", ")));
    if let Some(var) = env_var {
        help.push_str(&format!(" (set by environment variable {var})"));
    }
    help
}

fn unknown_section_help(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("did you mean [{s}]? sections are {}", SECTIONS.join(", ")),
        None => format!("sections are {}", SECTIONS.join(", ")),
    }
}

/// Convert every error figment collected into a [`ConfigError`].
///
/// `toml_sources` pairs each file path with its content so spans can point
/// into the file. A single inline source is used for errors figment cannot
/// attribute to a file.
pub fn figment_to_config_errors(
    err: FigmentError,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &FigmentError, toml_sources: &[(String, String)]) -> ConfigError {
    // Figment prefixes the offending key itself onto the path.
    let table: &[String] = match error.path.split_last() {
        Some((_, parents)) => parents,
        None => &[],
    };

    match &error.kind {
        Kind::UnknownField(name, _) if table.is_empty() => {
            let (span, src) = locate(
                error,
                toml_sources,
                |content| find_section_offset(content, name),
                name.len() + 2,
            );
            ConfigError::UnknownSection {
                suggestion: suggest_key(name, SECTIONS),
                name: name.clone(),
                span,
                src,
            }
        }
        Kind::UnknownField(key, expected) => {
            let (span, src) = locate(
                error,
                toml_sources,
                |content| find_key_offset(content, table, key),
                key.len(),
            );
            ConfigError::UnknownKey {
                section: table.join("."),
                key: key.clone(),
                suggestion: suggest_key(key, expected),
                valid_keys: expected.iter().map(|k| (*k).to_string()).collect(),
                env_var: env_var_name(error),
                span,
                src,
            }
        }
        Kind::InvalidType(found, expected) => {
            let leaf = error.path.last().map(String::as_str).unwrap_or_default();
            let (span, src) = locate(
                error,
                toml_sources,
                |content| find_value_offset(content, table, leaf),
                0,
            );
            ConfigError::InvalidType {
                key: error.path.join("."),
                found: found.to_string(),
                expected: expected.to_string(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// `ASKQ_QUEUE_TRANSCRIPT_CAP` for an error whose value came from the environment.
fn env_var_name(error: &FigmentError) -> Option<String> {
    let metadata = error.metadata.as_ref()?;
    if !metadata.name.contains("environment variable") {
        return None;
    }
    Some(format!("ASKQ_{}", error.path.join("_").to_ascii_uppercase()))
}

/// Find the source text an error came from and a span inside it.
///
/// `find` returns a byte offset in the content; `len` is the span length,
/// with zero meaning "to the end of the line".
fn locate(
    error: &FigmentError,
    toml_sources: &[(String, String)],
    find: impl Fn(&str) -> Option<usize>,
    len: usize,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let metadata = error.metadata.as_ref();
    let file = metadata
        .and_then(|m| m.source.as_ref())
        .and_then(|s| s.file_path())
        .map(|p| p.display().to_string());

    let source = match file {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if env_var_name(error).is_none() && toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };
    let Some((path, content)) = source else {
        return (None, None);
    };
    let Some(offset) = find(content.as_str()) else {
        return (None, None);
    };

    let len = if len == 0 {
        content[offset..].find('\n').unwrap_or(content.len() - offset)
    } else {
        len
    };
    (
        Some(SourceSpan::new(offset.into(), len)),
        Some(NamedSource::new(path, content.clone())),
    )
}

/// Byte offset of `[name]` in the content.
pub fn find_section_offset(content: &str, name: &str) -> Option<usize> {
    let header = format!("[{name}]");
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim() == header {
            return Some(offset + line.len() - line.trim_start().len());
        }
        offset += line.len();
    }
    None
}

/// Byte offset of `field = ...` inside the `[table]` it belongs to.
///
/// The search stops at the next table header, so a key that is valid in one
/// table is not matched when looking for it in another.
pub fn find_key_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_table = table.is_empty();
    let header = format!("[{}]", table.join("."));

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            if in_table && !table.is_empty() {
                return None;
            }
            in_table = trimmed.trim_end() == header;
        } else if in_table {
            let rest = trimmed.strip_prefix(field).map(str::trim_start);
            if rest.is_some_and(|r| r.starts_with('=')) {
                return Some(offset + line.len() - trimmed.len());
            }
        }
        offset += line.len();
    }
    None
}

/// Byte offset of the value assigned to `field` inside `[table]`.
fn find_value_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let key_at = find_key_offset(content, table, field)?;
    let eq = content[key_at..].find('=')?;
    let after = &content[key_at + eq + 1..];
    Some(key_at + eq + 1 + (after.len() - after.trim_start().len()))
}

/// Best Jaro-Winkler match for `unknown` among `candidates`, if any is close enough.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|&c| (strsim::jaro_winkler(unknown, c), c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Render each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

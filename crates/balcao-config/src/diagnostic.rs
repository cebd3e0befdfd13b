// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge.
//!
//! Raw figment errors name the failing key but not where it sits in the
//! file the operator edited. This module turns them into miette
//! diagnostics: a source span pointing at the offending key, the valid
//! keys for that section, and a Jaro-Winkler "did you mean?" suggestion
//! for near-miss typos.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a typo suggestion. 0.75 catches
/// `pagesize` -> `page_size` and `baseurl` -> `base_url` without
/// suggesting unrelated keys.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, carrying whatever context miette needs to
/// render it against the offending TOML.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(balcao::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Close-enough valid key, if one exists.
        suggestion: Option<String>,
        /// Comma-separated valid keys for the section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key whose value has the wrong type or an out-of-domain value.
    #[error("bad value for `{key}`: {found}")]
    #[diagnostic(code(balcao::config::bad_value), help("expected {expected}"))]
    BadValue {
        key: String,
        /// What the file actually contains.
        found: String,
        expected: String,
        #[label("this value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A semantic check failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(balcao::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no richer mapping.
    #[error("configuration error: {0}")]
    #[diagnostic(code(balcao::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    if let Some(candidate) = suggestion {
        format!("did you mean `{candidate}`? Valid keys: {valid_keys}")
    } else {
        format!("valid keys: {valid_keys}")
    }
}

/// Expands a `figment::Error` into per-problem diagnostics. One figment
/// error can carry several underlying failures; each becomes its own
/// entry. `toml_sources` pairs file paths with their contents so unknown
/// keys can be located in the text the operator wrote.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, allowed) => {
                let valid_keys: Vec<&str> = allowed.to_vec();
                let (span, src) = locate_key(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid_keys),
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::InvalidType(actual, expected) => ConfigError::BadValue {
                key: dotted_path(&error),
                found: actual.to_string(),
                expected: expected.clone(),
                span: None,
                src: None,
            },
            Kind::InvalidValue(actual, expected) => ConfigError::BadValue {
                key: dotted_path(&error),
                found: actual.to_string(),
                expected: expected.clone(),
                span: None,
                src: None,
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// The error's key path in `section.key` form.
fn dotted_path(error: &figment::error::Error) -> String {
    error.path.join(".")
}

/// Resolves a span + named source for `field`, if the error's metadata
/// names a file we were given the contents of.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let from_file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    let Some(path) = from_file else {
        return (None, None);
    };
    let Some((_, content)) = toml_sources.iter().find(|(p, _)| *p == path) else {
        return (None, None);
    };

    // error.path holds the section the key sits under, e.g. ["inbox"]
    // for `inbox.pagesize`.
    match key_offset(content, error.path.first().map(String::as_str), field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` within `content`, scanning line starts after
/// the `[section]` header (or from the top for top-level keys). The match
/// must be followed by `=` or whitespace so `page` never matches
/// `page_size`.
fn key_offset(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let start = match section {
        Some(name) => {
            let header = format!("[{name}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let key = line.trim_start();
        if let Some(rest) = key.strip_prefix(field) {
            if rest.starts_with(['=', ' ', '\t']) {
                return Some(offset + (line.len() - key.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// The valid key closest to `unknown`, if any scores above the
/// suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders every diagnostic to stderr with miette's graphical handler,
/// falling back to plain `Display` if rendering fails.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

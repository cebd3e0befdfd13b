// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the balcao conversation desk.
//!
//! Layered TOML (`deny_unknown_fields`) with environment overrides,
//! semantic validation that collects every problem instead of stopping at
//! the first, and miette diagnostics with typo suggestions for the
//! inevitable `pagesize`.
//!
//! ```no_run
//! let config = balcao_config::load_and_validate().expect("config errors");
//! println!("API base: {}", config.api.base_url);
//! ```

use std::path::Path;

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::BalcaoConfig;

/// Load from the standard hierarchy and validate.
///
/// On a figment failure the hierarchy's files are re-read so the
/// diagnostics can point a span into whichever file holds the bad key.
pub fn load_and_validate() -> Result<BalcaoConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || {
        loader::config_files()
            .iter()
            .filter_map(|p| read_source(p))
            .collect()
    })
}

/// Load one explicit file (`--config`) and validate. Environment
/// overrides still apply; the hierarchy is skipped.
pub fn load_and_validate_path(path: &Path) -> Result<BalcaoConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load from a TOML string and validate. Hermetic; tests use this.
pub fn load_and_validate_str(toml_content: &str) -> Result<BalcaoConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Shared tail of every load path: validate on success, bridge figment
/// errors to diagnostics on failure. `sources` is only invoked when the
/// spans are actually needed.
fn finish(
    loaded: Result<BalcaoConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<BalcaoConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads one config file for span resolution, absolutizing relative
/// paths so they match the path figment records in its error metadata.
fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    let name = if path.is_relative() {
        std::env::current_dir()
            .map(|d| d.join(path).display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    } else {
        path.display().to_string()
    };
    Some((name, content))
}

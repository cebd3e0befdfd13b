// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading via Figment.
//!
//! Merge order, later layers winning: compiled defaults, then
//! `/etc/balcao/balcao.toml`, the XDG user file, `./balcao.toml`, and
//! finally `BALCAO_*` environment variables. Missing files are skipped
//! silently; a malformed file is an error.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BalcaoConfig;

/// Config sections, used to anchor `BALCAO_<SECTION>_<KEY>` mapping.
const SECTIONS: [&str; 5] = ["api", "inbox", "bridge", "import", "log"];

/// The TOML files of the standard hierarchy, lowest precedence first.
/// The local file stays relative so Figment resolves it like any other
/// tool would.
pub fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/balcao/balcao.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("balcao/balcao.toml"));
    }
    files.push(PathBuf::from("balcao.toml"));
    files
}

/// Load from the standard hierarchy plus environment overrides.
pub fn load_config() -> Result<BalcaoConfig, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(BalcaoConfig::default()));
    for file in config_files() {
        figment = figment.merge(Toml::file(file));
    }
    figment.merge(env_overrides()).extract()
}

/// Load from one explicit file, skipping the hierarchy. Environment
/// overrides still apply so `--config` behaves like the default files.
pub fn load_config_from_path(path: &Path) -> Result<BalcaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BalcaoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
}

/// Load from a TOML string alone. No files, no environment; tests use
/// this for hermetic inputs.
pub fn load_config_from_str(toml_content: &str) -> Result<BalcaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BalcaoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// `BALCAO_*` variables mapped onto `section.key` paths.
///
/// The section name is matched as a prefix and everything after it is
/// the key, so `BALCAO_API_BASE_URL` becomes `api.base_url` rather than
/// `api.base.url`. A raw `Env::split("_")` would get that wrong for
/// every underscored key.
fn env_overrides() -> Env {
    Env::prefixed("BALCAO_").map(|name| {
        let name = name.as_str();
        for section in SECTIONS {
            if let Some(key) = name.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
                return format!("{section}.{key}").into();
            }
        }
        name.to_string().into()
    })
}

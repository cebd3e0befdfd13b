// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Saved login session: the bearer token between runs.
//!
//! `balcao login` writes the token and the operator identity returned by
//! the login endpoint to a mode-0600 TOML file under the user config
//! directory. Later commands read it back instead of prompting again. An
//! explicit `api.token` in the configuration always wins over the saved
//! token, but carries no identity with it.

use std::path::{Path, PathBuf};

use balcao_config::BalcaoConfig;
use balcao_core::types::Agent;
use balcao_core::BalcaoError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token and operator identity persisted by `balcao login`.
///
/// The desk API has no who-am-I endpoint; the login response is the only
/// source of the operator's id and role, so both are kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub token: String,
    pub agent: Agent,
    pub saved_at: DateTime<Utc>,
}

/// Resolved credentials for an API-backed command.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    /// Known when a saved session exists. `api.token` users without one
    /// stay anonymous, which rules out commands that need an identity.
    pub agent: Option<Agent>,
}

/// Path of the session file: `<config dir>/balcao/session.toml`.
pub fn session_file() -> Result<PathBuf, BalcaoError> {
    let base = dirs::config_dir()
        .ok_or_else(|| BalcaoError::Config("no user config directory".to_string()))?;
    Ok(base.join("balcao").join("session.toml"))
}

/// Reads the saved session, if one exists.
pub fn load() -> Result<Option<SavedSession>, BalcaoError> {
    load_from(&session_file()?)
}

pub fn save(session: &SavedSession) -> Result<(), BalcaoError> {
    save_to(&session_file()?, session)
}

/// Deletes the saved session. Returns whether one existed.
pub fn clear() -> Result<bool, BalcaoError> {
    clear_at(&session_file()?)
}

fn load_from(path: &Path) -> Result<Option<SavedSession>, BalcaoError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BalcaoError::Config(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };
    let session = toml::from_str(&raw).map_err(|e| {
        BalcaoError::Config(format!("malformed session file {}: {e}", path.display()))
    })?;
    Ok(Some(session))
}

fn save_to(path: &Path, session: &SavedSession) -> Result<(), BalcaoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            BalcaoError::Config(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let raw = toml::to_string_pretty(session)
        .map_err(|e| BalcaoError::Internal(format!("cannot serialize session: {e}")))?;
    std::fs::write(path, raw).map_err(|e| {
        BalcaoError::Config(format!("cannot write {}: {e}", path.display()))
    })?;

    // The file holds a bearer token; keep it owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(
            |e| BalcaoError::Config(format!("cannot restrict {}: {e}", path.display())),
        )?;
    }

    Ok(())
}

fn clear_at(path: &Path) -> Result<bool, BalcaoError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BalcaoError::Config(format!(
            "cannot remove {}: {e}",
            path.display()
        ))),
    }
}

/// Picks the token for an API command: explicit `api.token` first, then
/// the saved session.
pub fn resolve(config: &BalcaoConfig) -> Result<Credentials, BalcaoError> {
    resolve_with(config, load()?)
}

fn resolve_with(
    config: &BalcaoConfig,
    saved: Option<SavedSession>,
) -> Result<Credentials, BalcaoError> {
    if let Some(token) = &config.api.token {
        return Ok(Credentials {
            token: token.clone(),
            agent: saved.map(|s| s.agent),
        });
    }
    match saved {
        Some(s) => Ok(Credentials {
            token: s.token,
            agent: Some(s.agent),
        }),
        None => Err(BalcaoError::Validation(
            "not logged in; run `balcao login` or set api.token".to_string(),
        )),
    }
}

/// The operator identity, required by commands that assign, delegate, or
/// filter by "mine".
pub fn require_agent(credentials: &Credentials) -> Result<Agent, BalcaoError> {
    credentials.agent.clone().ok_or_else(|| {
        BalcaoError::Validation(
            "operator identity unknown; run `balcao login` once so the desk knows who you are"
                .to_string(),
        )
    })
}

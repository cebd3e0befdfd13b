// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao login` and `balcao logout` command implementations.
//!
//! Login is the one unauthenticated API call. The returned token and
//! operator identity are saved for every later command; logout forgets
//! them.

use balcao_config::BalcaoConfig;
use balcao_core::BalcaoError;
use chrono::Utc;
use colored::Colorize;

use crate::session::{self, SavedSession};

/// The environment variable for providing the password non-interactively.
pub const PASSWORD_ENV_VAR: &str = "BALCAO_PASSWORD";

/// Runs the `balcao login` command.
pub async fn run_login(
    config: &BalcaoConfig,
    email: Option<String>,
) -> Result<(), BalcaoError> {
    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt_line("Email: ")?,
    };
    if email.is_empty() {
        return Err(BalcaoError::Validation("email is empty".to_string()));
    }
    let password = get_password()?;

    let backend = crate::api_backend(config, None)?;
    let login = backend.login(&email, &password).await?;

    session::save(&SavedSession {
        token: login.access_token.clone(),
        agent: login.agent.clone(),
        saved_at: Utc::now(),
    })?;

    println!(
        "{} logged in as {} ({})",
        "✓".green(),
        login.agent.name.bold(),
        login.agent.role
    );
    Ok(())
}

/// Runs the `balcao logout` command.
pub fn run_logout() -> Result<(), BalcaoError> {
    if session::clear()? {
        println!("session forgotten");
    } else {
        println!("no saved session");
    }
    Ok(())
}

/// Get the password from the environment variable or an interactive TTY
/// prompt.
///
/// Priority:
/// 1. `BALCAO_PASSWORD` environment variable (for headless use)
/// 2. Interactive TTY prompt via `rpassword`
fn get_password() -> Result<String, BalcaoError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR)
        && !password.is_empty()
    {
        return Ok(password);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("Password: ");
        let password = rpassword::read_password()
            .map_err(|e| BalcaoError::Validation(format!("cannot read password: {e}")))?;
        if password.is_empty() {
            return Err(BalcaoError::Validation("empty password".to_string()));
        }
        return Ok(password);
    }

    Err(BalcaoError::Validation(
        "no password provided; set BALCAO_PASSWORD or run interactively".to_string(),
    ))
}

fn prompt_line(label: &str) -> Result<String, BalcaoError> {
    use std::io::Write;

    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(BalcaoError::Validation(
            "no email provided; pass --email or run interactively".to_string(),
        ));
    }

    eprint!("{label}");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| BalcaoError::Validation(format!("cannot read input: {e}")))?;
    Ok(line.trim().to_string())
}

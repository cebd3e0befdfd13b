// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao status` command implementation.
//!
//! Reports whether the desk API answers with the current credentials and
//! who the saved session belongs to. Works without a session too; it then
//! reports the missing login instead of an error.

use std::io::IsTerminal;

use balcao_config::BalcaoConfig;
use balcao_core::BalcaoError;
use serde::Serialize;

use crate::session;

/// JSON shape of the status report.
#[derive(Serialize)]
struct StatusReport {
    connected: bool,
    base_url: String,
    operator: Option<String>,
    role: Option<String>,
    error: Option<String>,
}

/// Run the `balcao status` command.
///
/// With `--json`, prints the report as JSON. With `--plain`, disables
/// colored output.
pub async fn run_status(
    config: &BalcaoConfig,
    json: bool,
    plain: bool,
) -> Result<(), BalcaoError> {
    let report = build_report(config).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&report, use_color);
    }

    Ok(())
}

async fn build_report(config: &BalcaoConfig) -> StatusReport {
    let base_url = config.api.base_url.clone();

    let credentials = match session::resolve(config) {
        Ok(credentials) => credentials,
        Err(e) => {
            return StatusReport {
                connected: false,
                base_url,
                operator: None,
                role: None,
                error: Some(e.to_string()),
            };
        }
    };

    let operator = credentials.agent.as_ref().map(|a| a.name.clone());
    let role = credentials.agent.as_ref().map(|a| a.role.to_string());

    // Counts is the cheapest authenticated endpoint; it proves both
    // reachability and that the token is still accepted.
    let probe = match crate::api_backend(config, Some(&credentials.token)) {
        Ok(backend) => backend.conversation_counts().await.map(|_| ()),
        Err(e) => Err(e),
    };

    match probe {
        Ok(()) => StatusReport {
            connected: true,
            base_url,
            operator,
            role,
            error: None,
        },
        Err(e) => StatusReport {
            connected: false,
            base_url,
            operator,
            role,
            error: Some(e.to_string()),
        },
    }
}

/// Print the status report with optional colors.
fn print_status(report: &StatusReport, use_color: bool) {
    println!();
    println!("  balcao status");
    println!("  {}", "-".repeat(35));

    if report.connected {
        if use_color {
            use colored::Colorize;
            println!("    Desk:     {} {}", "✓".green(), "connected".green());
        } else {
            println!("    Desk:     [OK] connected");
        }
    } else if use_color {
        use colored::Colorize;
        println!("    Desk:     {} {}", "✗".red(), "unreachable".red());
    } else {
        println!("    Desk:     [FAIL] unreachable");
    }

    println!("    Endpoint: {}", report.base_url);

    match (&report.operator, &report.role) {
        (Some(operator), Some(role)) => {
            println!("    Operator: {operator} ({role})");
        }
        (Some(operator), None) => {
            println!("    Operator: {operator}");
        }
        _ => {
            println!("    Operator: not logged in");
        }
    }

    if let Some(error) = &report.error {
        println!();
        println!("  {error}");
        if report.operator.is_none() {
            println!("  Log in with: balcao login");
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_when_connected() {
        let report = StatusReport {
            connected: true,
            base_url: "http://localhost:8080/api/v1".to_string(),
            operator: Some("Ana".to_string()),
            role: Some("agent".to_string()),
            error: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"connected\":true"));
        assert!(json.contains("\"operator\":\"Ana\""));
    }

    #[test]
    fn report_serializes_when_logged_out() {
        let report = StatusReport {
            connected: false,
            base_url: "http://localhost:8080/api/v1".to_string(),
            operator: None,
            role: None,
            error: Some("not logged in".to_string()),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"connected\":false"));
        assert!(json.contains("\"operator\":null"));
    }
}

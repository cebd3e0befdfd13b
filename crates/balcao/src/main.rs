// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Balcao - a WhatsApp commerce desk in the terminal.
//!
//! This is the binary entry point for the desk client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use balcao_api::{ClientOptions, HttpBackend};
use balcao_config::{BalcaoConfig, ConfigError};
use balcao_core::{Backend, BalcaoError};
use clap::{Parser, Subcommand};
use uuid::Uuid;

mod channels;
mod connect;
mod counts;
mod import;
mod inbox;
mod login;
mod send;
mod session;
mod status;

/// Balcao - a WhatsApp commerce desk in the terminal.
#[derive(Parser, Debug)]
#[command(name = "balcao", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default lookup.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in to the desk and save the session.
    Login {
        /// Email to log in with; prompted when omitted.
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the saved session.
    Logout,
    /// Desk connectivity and operator overview.
    Status {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Interactive conversation inbox.
    Inbox {
        /// Starting category: unassigned, in-progress, mine, or archived.
        #[arg(long)]
        filter: Option<String>,
        /// Starting search term.
        #[arg(long)]
        search: Option<String>,
    },
    /// Send one message or file to a conversation.
    Send {
        /// Target conversation id.
        conversation_id: Uuid,
        /// Message text. Omit when sending a file.
        message: Option<String>,
        /// File to upload and send as media.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Caption for the media file.
        #[arg(long, requires = "file")]
        caption: Option<String>,
    },
    /// Unread tallies per inbox category.
    Counts {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// List WhatsApp channels and their bridge status.
    Channels {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
        /// Keep refreshing until interrupted.
        #[arg(long, conflicts_with = "json")]
        watch: bool,
    },
    /// Pair a channel with WhatsApp by QR code.
    Connect {
        /// Channel name or id.
        channel: String,
    },
    /// Upload a product CSV and follow the import job.
    Import {
        /// CSV file to upload.
        file: PathBuf,
        /// Print the final job report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            balcao_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log);

    let Some(command) = cli.command else {
        println!("balcao: use --help for available commands");
        return;
    };

    if let Err(e) = dispatch(command, &config).await {
        use colored::Colorize;
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands, config: &BalcaoConfig) -> Result<(), BalcaoError> {
    match command {
        Commands::Login { email } => login::run_login(config, email).await,
        Commands::Logout => login::run_logout(),
        Commands::Status { json, plain } => status::run_status(config, json, plain).await,
        Commands::Inbox { filter, search } => {
            let credentials = session::resolve(config)?;
            let agent = session::require_agent(&credentials)?;
            let backend = api_backend(config, Some(&credentials.token))?;
            inbox::run_inbox(backend, agent, &config.inbox, filter, search).await
        }
        Commands::Send {
            conversation_id,
            message,
            file,
            caption,
        } => {
            let credentials = session::resolve(config)?;
            let backend = api_backend(config, Some(&credentials.token))?;
            send::run_send(backend, conversation_id, message, file, caption).await
        }
        Commands::Counts { json, plain } => {
            let credentials = session::resolve(config)?;
            let backend = api_backend(config, Some(&credentials.token))?;
            counts::run_counts(backend, json, plain).await
        }
        Commands::Channels { json, plain, watch } => {
            let credentials = session::resolve(config)?;
            let backend = api_backend(config, Some(&credentials.token))?;
            channels::run_channels(backend, &config.bridge, json, plain, watch).await
        }
        Commands::Connect { channel } => {
            let credentials = session::resolve(config)?;
            let backend = api_backend(config, Some(&credentials.token))?;
            connect::run_connect(backend, &config.bridge, &channel).await
        }
        Commands::Import { file, json } => {
            let credentials = session::resolve(config)?;
            let backend = api_backend(config, Some(&credentials.token))?;
            import::run_import(backend, &config.import, &file, json).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BalcaoConfig, Vec<ConfigError>> {
    match path {
        Some(path) => balcao_config::load_and_validate_path(path),
        None => balcao_config::load_and_validate(),
    }
}

/// Builds the HTTP backend every API command talks through. `token` is
/// `None` only for login.
fn api_backend(
    config: &BalcaoConfig,
    token: Option<&str>,
) -> Result<Arc<dyn Backend>, BalcaoError> {
    let options = ClientOptions {
        timeout: Duration::from_secs(config.api.timeout_secs),
        retry_attempts: config.api.retry_attempts,
        retry_delay: Duration::from_millis(config.api.retry_delay_ms),
    };
    let backend = HttpBackend::new(&config.api.base_url, token, &options)?;
    Ok(Arc::new(backend))
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(log: &balcao_config::model::LogConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("balcao={},warn", log.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    if log.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = balcao_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1");
    }

    #[test]
    fn cli_parses_inbox_flags() {
        let cli = Cli::try_parse_from(["balcao", "inbox", "--filter", "mine"]).unwrap();
        match cli.command {
            Some(Commands::Inbox { filter, search }) => {
                assert_eq!(filter.as_deref(), Some("mine"));
                assert!(search.is_none());
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn caption_requires_a_file() {
        let id = Uuid::new_v4().to_string();
        let result =
            Cli::try_parse_from(["balcao", "send", &id, "--caption", "recibo"]);
        assert!(result.is_err());
    }

    #[test]
    fn watch_conflicts_with_json() {
        let result = Cli::try_parse_from(["balcao", "channels", "--watch", "--json"]);
        assert!(result.is_err());
    }
}

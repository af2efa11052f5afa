//! keyhold service binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                      keyhold                          │
//!   Client Request  │  ┌────────┐   ┌────────┐   ┌───────────┐   ┌────────┐ │
//!   ────────────────┼─▶│  CORS  │──▶│  TLS   │──▶│ admission │──▶│  app   │ │
//!                   │  │  gate  │   │ policy │   │   gate    │   │handler │ │
//!   Client Response │  └────────┘   └────────┘   └───────────┘   └───┬────┘ │
//!   ◀───────────────┼──── CORS headers on every response             │      │
//!                   │                                                ▼      │
//!                   │  ┌────────────────┐                      ┌─────────┐  │
//!                   │  │   lifecycle    │── init / clean up ──▶│ storage │  │
//!                   │  │ signals, exit  │                      └─────────┘  │
//!                   │  └────────────────┘                           ▲       │
//!                   │  ┌────────────────┐                           │       │
//!                   │  │ accounts admin │── open / op / close ──────┘       │
//!                   │  └────────────────┘                                   │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use keyhold::accounts::{AccountAdmin, AdminError, ListOutcome};
use keyhold::app::ApiHandler;
use keyhold::cli::{AccountsCommand, Cli, Command};
use keyhold::config::{self, AppConfig};
use keyhold::lifecycle::LifecycleController;
use keyhold::observability::{logging, metrics};
use keyhold::storage::{FileStorage, Storage};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::resolve(cli.config.as_deref(), cli.to_config()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_tracing(&cli.log_level);
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init_tracing(&config.observability.log_level);
    if let Some(path) = &cli.config {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        tracing::warn!(
            path = %path.display(),
            "Loaded config from file; all other flags and environment variables are ignored"
        );
    }

    match cli.command {
        Command::Runserver(_) => run_server(config).await,
        Command::Accounts(command) => run_accounts(&config, command),
    }
}

async fn run_server(config: AppConfig) -> ExitCode {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "keyhold starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        port = config.server.port,
        tls = config.server.tls_enabled(),
        storage = %config.storage.path,
        "Configuration loaded"
    );

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.storage.path));
    let handler = Arc::new(ApiHandler::new(storage, config.server.clone()));
    let controller = LifecycleController::new(config, handler);

    let exit = controller.run().await;
    ExitCode::from(exit.code() as u8)
}

fn run_accounts(config: &AppConfig, command: AccountsCommand) -> ExitCode {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.storage.path));
    let admin = AccountAdmin::new(storage);

    let result = match command {
        AccountsCommand::List => admin.list().map(|outcome| match outcome {
            ListOutcome::Empty => println!("No existing accounts!"),
            ListOutcome::Accounts(emails) => {
                for email in emails {
                    println!("{}", email);
                }
            }
        }),
        AccountsCommand::Create { email } => admin
            .create(email.as_deref().unwrap_or_default())
            .map(|account| println!("Created account {}", account.email)),
        AccountsCommand::Display { email } => admin
            .display(email.as_deref().unwrap_or_default())
            .and_then(|account| account.render().map_err(AdminError::from))
            .map(|rendered| println!("{}", rendered)),
        AccountsCommand::Delete { email } => admin
            .delete(email.as_deref().unwrap_or_default())
            .map(|()| println!("Account deleted")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &AdminError) {
    if err.is_input_error() {
        eprintln!("{}", err);
        eprintln!("Usage: keyhold accounts <create|display|delete> <email>");
    } else {
        eprintln!("Error: {}", err);
    }
}

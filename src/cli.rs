//! Command-line interface definitions.
//!
//! Every flag has a `KEYHOLD_*` environment equivalent. Flags only matter
//! when no config file is given; see [`crate::config::resolve`].

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{AppConfig, EmailConfig, ServerConfig, StorageConfig};

#[derive(Debug, Parser)]
#[command(name = "keyhold", version)]
#[command(about = "Account service with per-route request admission", long_about = None)]
pub struct Cli {
    /// Path to configuration file. Overrides all other flags and environment variables.
    #[arg(short, long, env = "KEYHOLD_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Path to the database directory
    #[arg(long, env = "KEYHOLD_DB_PATH", default_value = "db")]
    pub db_path: String,

    /// Mail server for sending emails
    #[arg(long, env = "KEYHOLD_EMAIL_SERVER", default_value = "")]
    pub email_server: String,

    /// Port to use with mail server
    #[arg(long, env = "KEYHOLD_EMAIL_PORT", default_value = "")]
    pub email_port: String,

    /// Username for authentication with mail server
    #[arg(long, env = "KEYHOLD_EMAIL_USER", default_value = "")]
    pub email_user: String,

    /// Password for authentication with mail server
    #[arg(long, env = "KEYHOLD_EMAIL_PASSWORD", default_value = "", hide_env_values = true)]
    pub email_password: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "KEYHOLD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a server instance
    Runserver(ServerArgs),
    /// Commands for managing accounts
    #[command(subcommand)]
    Accounts(AccountsCommand),
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(short, long, env = "KEYHOLD_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Path to assets directory
    #[arg(long, env = "KEYHOLD_ASSETS_PATH", default_value = "assets")]
    pub assets_path: String,

    /// Reject insecure connections
    #[arg(long, env = "KEYHOLD_REQUIRE_TLS", value_parser = FalseyValueParser::new())]
    pub require_tls: bool,

    /// Email address to send error reports to
    #[arg(long, env = "KEYHOLD_NOTIFY_EMAIL", default_value = "")]
    pub notify_email: String,

    /// Path to TLS certificate file
    #[arg(long, env = "KEYHOLD_TLS_CERT", default_value = "")]
    pub tls_cert: String,

    /// Path to TLS key file
    #[arg(long, env = "KEYHOLD_TLS_KEY", default_value = "")]
    pub tls_key: String,

    /// Public host name, if it differs from the listener address
    #[arg(long, env = "KEYHOLD_HOST_NAME", default_value = "")]
    pub host_name: String,
}

#[derive(Debug, Subcommand)]
pub enum AccountsCommand {
    /// List existing accounts
    List,
    /// Create new account
    Create { email: Option<String> },
    /// Display account
    Display { email: Option<String> },
    /// Delete account
    Delete { email: Option<String> },
}

impl Cli {
    /// Configuration populated from flags and environment only.
    pub fn to_config(&self) -> AppConfig {
        let server = match &self.command {
            Command::Runserver(args) => ServerConfig {
                port: args.port,
                tls_cert: args.tls_cert.clone(),
                tls_key: args.tls_key.clone(),
                require_tls: args.require_tls,
                assets_path: args.assets_path.clone(),
                notify_email: args.notify_email.clone(),
                host_name: args.host_name.clone(),
            },
            Command::Accounts(_) => ServerConfig::default(),
        };

        let mut config = AppConfig {
            server,
            storage: StorageConfig {
                path: self.db_path.clone(),
            },
            email: EmailConfig {
                server: self.email_server.clone(),
                port: self.email_port.clone(),
                user: self.email_user.clone(),
                password: self.email_password.clone(),
            },
            ..AppConfig::default()
        };
        config.observability.log_level = self.log_level.clone();
        config
    }
}

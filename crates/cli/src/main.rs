//! TicketSlave CLI - Database migrations and account recovery.
//!
//! # Usage
//!
//! ```bash
//! # Create/upgrade the database schema
//! ticketslave migrate
//!
//! # Reset an account password (prints the generated password once)
//! ticketslave admin reset-password alice
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin reset-password` - Rotate a user's password to a random one

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ticketslave")]
#[command(author, version, about = "TicketSlave CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Reset a user's password to a freshly generated one
    ResetPassword {
        /// Username of the account to reset
        username: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketslave_cli=info,ticketslave_server=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Admin {
            action: AdminAction::ResetPassword { username },
        } => commands::admin::reset_password(&username).await,
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

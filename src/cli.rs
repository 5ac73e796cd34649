use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::{create_admin, init_database, migrate_and_serve, serve};

const DEFAULT_DATABASE_URL: &str = "sqlite://salesdesk.db?mode=rwc";

#[derive(Parser)]
#[command(name = "salesdesk")]
#[command(about = "SalesDesk CRM back end with CLI tools and web server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Database URL
        ///
        /// Examples:
        ///   SQLite: sqlite:///path/to/salesdesk.db?mode=rwc
        ///   In-memory: sqlite::memory:
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
        bind_address: String,
    },
    /// Apply pending migrations, then start the web server
    MigrateAndServe {
        /// Database URL
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,

        /// Bind address for the web server
        #[arg(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
        bind_address: String,
    },
    /// Initialize the database using migrations
    InitDb {
        /// Database URL
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
    /// Create an administrator account
    ///
    /// Used once to bootstrap a fresh database; every other account is
    /// created through the API by an admin.
    CreateAdmin {
        /// Login name of the new admin
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        full_name: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "SALESDESK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Database URL
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { database_url, bind_address } => {
                serve(&database_url, &bind_address).await?;
            }
            Commands::MigrateAndServe { database_url, bind_address } => {
                migrate_and_serve(&database_url, &bind_address).await?;
            }
            Commands::InitDb { database_url } => {
                init_database(&database_url).await?;
            }
            Commands::CreateAdmin { username, full_name, password, database_url } => {
                create_admin(&database_url, &username, &full_name, &password).await?;
            }
        }
        Ok(())
    }
}

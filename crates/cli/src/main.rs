//! FoodHub CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! foodhub-cli migrate
//!
//! # Load the bundled restaurant catalog
//! foodhub-cli seed
//!
//! # Load a custom catalog, even if restaurants already exist
//! foodhub-cli seed --file catalog.json --force
//!
//! # Promote a registered user to admin
//! foodhub-cli user promote -e admin@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert restaurants and menus from a JSON fixture
//! - `user promote` - Change a user's role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "foodhub-cli")]
#[command(author, version, about = "FoodHub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the restaurant catalog from a JSON fixture
    Seed {
        /// Catalog file (`{"restaurants": [...]}`); the bundled fixture if omitted
        #[arg(short, long)]
        file: Option<String>,

        /// Insert even if the catalog already has restaurants
        #[arg(long)]
        force: bool,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change the role of an existing user
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// New role (`user` or `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, force } => {
            commands::seed::catalog(file.as_deref(), force).await?;
        }
        Commands::User { action } => match action {
            UserAction::Promote { email, role } => {
                commands::user::promote(&email, &role).await?;
            }
        },
    }
    Ok(())
}

//! Dashboard CLI - seeding, identity management and exports.
//!
//! Operates on the same storage as the server, configured by the same
//! environment (`DASHBOARD_SESSION_SECRET`, `DASHBOARD_DATA_DIR`, ...).
//! The server only reads storage at startup, so run commands that write
//! (`seed`, `identity create`, `identity set-password`) while it is stopped.
//!
//! # Usage
//!
//! ```bash
//! # Write seed data for any missing collection (or rewrite all with --reset)
//! dashboard-cli seed --reset
//!
//! # Create an identity that can log in
//! dashboard-cli identity create -e ops@example.com -n "Ops" -p 'long password' -r admin
//!
//! # Give a seed identity a password
//! dashboard-cli identity set-password -e admin@example.com -p 'long password'
//!
//! # List identities
//! dashboard-cli identity list
//!
//! # Export a collection as CSV
//! dashboard-cli export products --out products.csv
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use dashboard_admin::models::Collection;
use dashboard_core::Role;

mod commands;

#[derive(Parser)]
#[command(name = "dashboard-cli")]
#[command(author, version, about = "Admin dashboard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write seed data for missing collections
    Seed {
        /// Discard stored users, products and identities first
        #[arg(long)]
        reset: bool,
    },
    /// Manage login identities
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },
    /// Export a collection as CSV
    Export {
        /// Collection to export (`users` or `products`)
        collection: Collection,

        /// Free-text search applied before exporting
        #[arg(short, long)]
        search: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum IdentityAction {
    /// Create a new identity with a password
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`admin` or `user`)
        #[arg(short, long, default_value = "user")]
        role: Role,
    },
    /// Set the password of an existing identity
    SetPassword {
        /// Email address of the identity
        #[arg(short, long)]
        email: String,

        /// New password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// List identities
    List,
}

fn main() {
    // .env may carry RUST_LOG as well as the dashboard settings
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Seed { reset } => commands::seed::run(reset)?,
        Commands::Identity { action } => match action {
            IdentityAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::identity::create(&email, &name, &SecretString::from(password), role)?;
            }
            IdentityAction::SetPassword { email, password } => {
                commands::identity::set_password(&email, &SecretString::from(password))?;
            }
            IdentityAction::List => commands::identity::list()?,
        },
        Commands::Export {
            collection,
            search,
            out,
        } => commands::export::run(collection, search, out.as_deref())?,
    }
    Ok(())
}

//! Frenos CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (tables + session stores)
//! frenos migrate
//!
//! # Load the built-in catalog, or a JSON file, into the products table
//! frenos seed products [--file productos.json] [--replace]
//!
//! # Tracker backups
//! frenos backup export --store data/tracker/<id>.json --out respaldo.json
//! frenos backup import --store data/tracker/<id>.json --file respaldo.json
//!
//! # Settings file
//! frenos settings get WHATSAPP_NUMBER
//! frenos settings set WHATSAPP_NUMBER "+54 9 11 5555-0000"
//!
//! # Password hash for ADMIN_PASSWORD_HASH
//! frenos admin hash-password 'una contraseña larga'
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// Settings file used when `--file` is not given.
const DEFAULT_SETTINGS_FILE: &str = ".env.local";

#[derive(Parser)]
#[command(name = "frenos")]
#[command(author, version, about = "Frenos CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed database tables
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Export or import tracker backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Read or write the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Admin account tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert products from a JSON list (default: the built-in catalog)
    Products {
        /// JSON array of products
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Delete products not in the list
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write the tracker state to a backup file
    Export {
        /// Tracker data file
        #[arg(short, long)]
        store: PathBuf,

        /// Backup file to write
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Replace the tracker state with a backup file
    Import {
        /// Tracker data file
        #[arg(short, long)]
        store: PathBuf,

        /// Backup file to read
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print a setting (file first, then environment)
    Get {
        key: String,

        #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
        file: PathBuf,
    },
    /// Write a setting; an empty value removes it
    Set {
        key: String,
        value: String,

        #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Print the Argon2 hash to use as `ADMIN_PASSWORD_HASH`
    HashPassword {
        password: String,
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

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, replace } => {
                let count = commands::seed::products(file.as_deref(), replace).await?;
                println!("{count} productos cargados");
            }
        },
        Commands::Backup { action } => match action {
            BackupAction::Export { store, out } => {
                let count = commands::backup::export(&store, &out)?;
                println!("{count} claves exportadas a {}", out.display());
            }
            BackupAction::Import { store, file } => {
                let count = commands::backup::import(&store, &file)?;
                println!("{count} claves importadas en {}", store.display());
            }
        },
        Commands::Settings { action } => match action {
            SettingsAction::Get { key, file } => match commands::settings::get(&file, &key)? {
                Some(value) => println!("{value}"),
                None => return Err(format!("{key} no está configurado").into()),
            },
            SettingsAction::Set { key, value, file } => {
                commands::settings::set(&file, &key, &value)?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => {
                println!("{}", commands::admin::hash(&password)?);
            }
        },
    }
    Ok(())
}

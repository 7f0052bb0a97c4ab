use clap::{Parser, Subcommand};
use content_backend::config::Config;
use content_backend::models::db_operations::accounts_db_operations;
use content_backend::setup::db_setup;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Creates the content database and its schema.
    Setup,
}

#[derive(Subcommand, Debug)]
enum AccountsAction {
    /// Lists every account created by a GitHub login.
    List,
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_content_database(&config),
        },
        Commands::Accounts { action } => match action {
            AccountsAction::List => list_accounts(&config),
        },
    }
}

fn setup_content_database(config: &Config) {
    let db_path = config.database_file();
    println!("\nSetting up content database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        if let Err(e) = fs::create_dir_all(parent_dir) {
            eprintln!("❌ Error: Could not create database directory: {}", e);
            return;
        }
    }

    let mut conn = match Connection::open(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Error: Could not open content database: {}", e);
            return;
        }
    };

    match db_setup::setup_content_db(&mut conn) {
        Ok(_) => println!("✅ Content database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up content database: {}", e),
    }
}

fn list_accounts(config: &Config) {
    let db_path = config.database_file();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Content database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return;
    }

    let conn = match Connection::open(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Error: Could not open content database: {}", e);
            return;
        }
    };

    match accounts_db_operations::read_all_accounts(&conn) {
        Ok(accounts) if accounts.is_empty() => println!("ℹ️ No accounts yet. Accounts are created on first GitHub login."),
        Ok(accounts) => {
            println!("\n--- Accounts ---");
            for account in accounts {
                println!(
                    "{}  {}  {}  (since {})",
                    account.id,
                    account.username,
                    account.email.as_deref().unwrap_or("-"),
                    account.created_at.format("%Y-%m-%d")
                );
            }
        }
        Err(e) => eprintln!("❌ Error listing accounts: {}", e),
    }
}

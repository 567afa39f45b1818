//! CLI administration tool for surl shard files.
//!
//! Provides the write-side commands the redirect server deliberately does not
//! expose: inserting destinations, deleting entries, and expired-row cleanup.
//!
//! # Usage
//!
//! ```bash
//! # Insert (or reuse) a destination URL
//! cargo run --bin admin -- --file shard0.db --node 0 add https://example.com/docs
//!
//! # Insert with a 1-hour lifetime
//! cargo run --bin admin -- --file shard0.db --node 0 add https://example.com/promo --expire-in 3600
//!
//! # Remove expired rows
//! cargo run --bin admin -- --file shard0.db --node 0 clean
//!
//! # Delete a single entry by its external id
//! cargo run --bin admin -- --file shard0.db --node 0 delete 3hG8kmP2
//! ```
//!
//! # Environment Variables
//!
//! - `ID_EPOCH_MILLIS` (optional): id-generation epoch; must match every other
//!   writer of the same shard set

use surl::application::services::Manager;
use surl::config::DEFAULT_EPOCH_MILLIS;
use surl::infrastructure::persistence::SqliteBackend;
use surl::utils::snowflake::ShortId;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing surl shard files.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite shard file (created if missing)
    #[arg(short, long)]
    file: PathBuf,

    /// Shard number minted into new ids (0-1023)
    #[arg(short, long, default_value_t = 1)]
    node: u64,

    #[command(subcommand)]
    command: Commands,
}

/// Shard maintenance commands.
#[derive(Subcommand)]
enum Commands {
    /// Insert a destination URL, reusing an existing id when possible
    Add {
        /// Absolute destination URL
        url: String,

        /// Lifetime in seconds from now; omit for a permanent entry
        #[arg(short, long)]
        expire_in: Option<i64>,
    },

    /// Remove all expired rows
    Clean,

    /// Delete a single entry by its external id
    Delete {
        /// External (base58) id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let epoch_millis = std::env::var("ID_EPOCH_MILLIS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_EPOCH_MILLIS);

    let backend = Arc::new(
        SqliteBackend::open_writable(&cli.file, cli.node)
            .await
            .with_context(|| format!("failed to open shard file {}", cli.file.display()))?,
    );
    let manager = Manager::new(backend, epoch_millis)?;

    match cli.command {
        Commands::Add { url, expire_in } => {
            let expire_at = match expire_in {
                Some(secs) if secs <= 0 => bail!("--expire-in must be positive"),
                Some(secs) => Some(Utc::now().timestamp() + secs),
                None => None,
            };
            let id = manager.insert_or_reuse(&url, expire_at).await?;
            println!("{}", id.to_base58().green());
        }
        Commands::Clean => {
            let removed = manager.clean().await?;
            println!("removed {} expired entries", removed.to_string().cyan());
        }
        Commands::Delete { id } => {
            let id = ShortId::parse_base58(&id).context("not a valid external id")?;
            if manager.delete(id).await? {
                println!("{}", "deleted".green());
            } else {
                println!("{}", "no such entry".yellow());
            }
        }
    }

    Ok(())
}

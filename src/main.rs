//! # EcoDMS → Paperless-ngx migration CLI (`eco2pl`)
//!
//! Thin binary over the `ecodms2paperless` library.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `eco2pl migrate` | Upload every not-yet-migrated document from the export |
//! | `eco2pl migrate --dry-run` | Show what would be uploaded, no network calls |
//! | `eco2pl inspect` | Parse the export and print the projected metadata |
//!
//! ## Configuration
//!
//! Everything is read from the environment:
//!
//! ```bash
//! export PATH_ECODMS_EXPORT_FILE=/archive/export.xml
//! export PAPERLESS_API_URL=https://paperless.example.org/api
//! export PAPERLESS_API_TOKEN=...
//! eco2pl migrate
//! ```
//!
//! Optional: `PAPERLESS_MIGRATION_LEDGER` (ledger file path),
//! `ECODMS_POLL_INTERVAL_SECS`, `ECODMS_POLL_MAX_ATTEMPTS`.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::time::Duration;

use clap::{Parser, Subcommand};

use ecodms2paperless::config::Config;
use ecodms2paperless::inspect;
use ecodms2paperless::logging::EnvLog;
use ecodms2paperless::migrate::{self, MigrationOptions};

/// Migrate an EcoDMS XML export into Paperless-ngx.
#[derive(Parser)]
#[command(
    name = "eco2pl",
    about = "Migrate documents and their metadata from an EcoDMS XML export into Paperless-ngx",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration.
    ///
    /// Uploads every document of the export that the ledger does not
    /// already record, waits for each consumption task to finish, and
    /// records completions so re-runs skip them.
    Migrate {
        /// Parse, map, and consult the ledger without any network calls
        /// or uploads.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of documents to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Parse the export and print the projected metadata per document.
    ///
    /// Entirely offline; useful for checking an export before migrating.
    Inspect,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Migrate { dry_run, limit } => {
            let opts = MigrationOptions {
                dry_run,
                limit,
                poll_interval: Duration::from_secs(config.poll_interval_secs),
                poll_max_attempts: config.poll_max_attempts,
            };
            migrate::run(&config, &opts, &EnvLog)?;
        }
        Commands::Inspect => {
            inspect::run_inspect(&config.export_file)?;
        }
    }

    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use applog::{Config, JsonFileStore, LogStore, RetentionManager};

/// Inspect and trim an applog record store
#[derive(Parser)]
#[command(name = "applog")]
#[command(version)]
#[command(about = "Inspect and trim an applog record store")]
struct Cli {
    /// Store file (default: store_path from ~/.applog/config.toml)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show record count and time range
    Stats,

    /// Print the newest records
    Tail {
        /// Number of records to print
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },

    /// Delete records older than a number of days
    Prune {
        #[arg(long)]
        before_days: u64,
    },

    /// Keep only the newest records
    Trim {
        #[arg(long)]
        limit: usize,
    },

    /// Delete every record
    Purge,

    /// Apply the retention limits from the config file
    Apply,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "applog=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load().context("Failed to load config")?;
    let store_path = cli.store.unwrap_or_else(|| config.store_path.clone());
    let mut store = JsonFileStore::new(store_path);

    match cli.command {
        Commands::Stats => {
            let records = store.records().context("Failed to read log store")?;
            println!("Store: {}", store.path().display());
            println!("Records: {}", records.len());
            if let (Some(oldest), Some(newest)) = (records.first(), records.last()) {
                println!("Oldest: {}", oldest.created_at_display);
                println!("Newest: {}", newest.created_at_display);
            }
        }

        Commands::Tail { count } => {
            let records = store.records().context("Failed to read log store")?;
            let skip = records.len().saturating_sub(count);
            for record in &records[skip..] {
                println!(
                    "{} {:<5} {}::{} {}",
                    record.created_at_display,
                    record.severity,
                    record.class_name,
                    record.method_name,
                    record.message
                );
                if record.has_exception {
                    print!("{}", record.exception_text);
                }
            }
        }

        Commands::Prune { before_days } => {
            let deleted = RetentionManager::new(&mut store)
                .delete_logs_older_than(before_days)
                .context("Failed to prune log store")?;
            tracing::info!("Deleted {} records older than {} days", deleted, before_days);
        }

        Commands::Trim { limit } => {
            let deleted = RetentionManager::new(&mut store)
                .delete_logs_to_limit(limit)
                .context("Failed to trim log store")?;
            tracing::info!("Deleted {} records to keep {}", deleted, limit);
        }

        Commands::Purge => {
            let deleted = RetentionManager::new(&mut store)
                .delete_all_logs()
                .context("Failed to purge log store")?;
            tracing::info!("Deleted {} records", deleted);
        }

        Commands::Apply => {
            let report = RetentionManager::new(&mut store)
                .apply(&config.retention)
                .context("Failed to apply retention")?;
            tracing::info!(
                "Deleted {} expired and {} excess records",
                report.expired,
                report.trimmed
            );
        }
    }

    Ok(())
}

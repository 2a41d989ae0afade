use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use storewatch::reviews::Store;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Watch app-store reviews and rating changes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a reviews page, persist what is new and notify
    Scrape {
        /// Unique app name, e.g. candy-crush
        #[arg(long)]
        app_name: String,

        /// Link to the reviews page, e.g. https://apps.apple.com/us/app/candy-crush-saga/id553834731?see-all=reviews
        #[arg(long)]
        reviews_url: String,

        /// Database file (overrides config and STOREWATCH_DB)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Do not print notifications to the console
        #[arg(long)]
        no_console: bool,
    },

    /// Create or update the database schema
    Migrate {
        /// Database file (overrides config and STOREWATCH_DB)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Show stored rating state for an app
    Status {
        /// App name used when scraping
        #[arg(long)]
        app_name: String,

        /// Storefront (ios, android)
        #[arg(long)]
        store: Store,

        /// Database file (overrides config and STOREWATCH_DB)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Number of snapshots to list
        #[arg(long, default_value_t = 5)]
        history: usize,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            app_name,
            reviews_url,
            db,
            no_console,
        } => {
            commands::scrape::execute(commands::scrape::ScrapeOptions {
                app_name,
                reviews_url,
                db,
                no_console,
            })?;
        }
        Commands::Migrate { db } => {
            commands::migrate::execute(db)?;
        }
        Commands::Status {
            app_name,
            store,
            db,
            history,
            json,
        } => {
            commands::status::execute(&app_name, store, db, history, json)?;
        }
    }

    Ok(())
}

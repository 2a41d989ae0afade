use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use storewatch::config::Config;
use storewatch::notify::{ConsoleNotifier, Fanout, TeamsNotifier};
use storewatch::pipeline;

pub struct ScrapeOptions {
    pub app_name: String,
    pub reviews_url: String,
    pub db: Option<PathBuf>,
    pub no_console: bool,
}

pub fn execute(options: ScrapeOptions) -> Result<()> {
    info!("app-name: {}", options.app_name);
    info!("reviews-url: {}", options.reviews_url);

    let config = super::load_config(options.db)?;
    let repo = super::open_repository(&config.database.path)?;
    let notifier = build_notifier(&config, options.no_console)?;
    if notifier.is_empty() {
        warn!("No notification channel configured; changes are only persisted");
    }

    let report = pipeline::scrape(
        &config,
        &repo,
        &notifier,
        &options.app_name,
        &options.reviews_url,
    )
    .with_context(|| format!("Failed to scrape {}", options.reviews_url))?;

    info!(
        "Finished! {} new reviews, rating {}",
        report.new_reviews.len(),
        if report.snapshot_advanced {
            "changed"
        } else {
            "unchanged"
        }
    );
    Ok(())
}

fn build_notifier(config: &Config, no_console: bool) -> Result<Fanout> {
    let mut fanout = Fanout::new();
    if config.notify.console && !no_console {
        fanout = fanout.with(Box::new(ConsoleNotifier::new()));
    }
    if let Some(hook) = &config.notify.teams_hook_url {
        let teams = TeamsNotifier::new(hook.as_str()).context("Failed to set up Teams notifier")?;
        fanout = fanout.with(Box::new(teams));
    }
    Ok(fanout)
}

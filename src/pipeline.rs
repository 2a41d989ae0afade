//! One scrape-reconcile-notify invocation for an (application, store) pair.
//!
//! "Do X": Scrape once, persist what is new, announce what changed.
//!
//! Steps run strictly in sequence and any failure stops the run. Inserts
//! made before a failure stay committed; re-running is safe because the
//! repository dedupes by natural key.

use log::info;
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::repository::{snapshot_advanced, RatingSnapshot, ReviewRecord, ReviewsRepository};
use crate::store::{self, StoreAdapter};

/// What one run persisted and announced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub new_reviews: Vec<ReviewRecord>,
    /// Latest snapshot before this run, if any.
    pub previous: Option<RatingSnapshot>,
    /// Snapshot matching this run's distribution.
    pub current: RatingSnapshot,
    /// Whether `current` was announced as a rating change.
    pub snapshot_advanced: bool,
}

/// Classify `url`, build the matching adapter and [`run`] it.
pub fn scrape(
    config: &Config,
    repo: &ReviewsRepository,
    notifier: &dyn Notifier,
    app_name: &str,
    url: &str,
) -> Result<RunReport> {
    let kind = store::detect(url)?;
    info!("Review url classified as {}", kind);
    let adapter = store::adapter(kind, config)?;
    run(adapter.as_ref(), repo, notifier, app_name, url)
}

/// Run one invocation with an already chosen adapter.
///
/// Order: surf, reject an empty aggregate, reconcile reviews, read the
/// last snapshot, reconcile the current snapshot, notify the rating change
/// if it advanced, then notify the new reviews.
pub fn run(
    adapter: &dyn StoreAdapter,
    repo: &ReviewsRepository,
    notifier: &dyn Notifier,
    app_name: &str,
    url: &str,
) -> Result<RunReport> {
    let batch = adapter.surf(app_name, url)?;
    if batch.distribution.total == 0 {
        return Err(Error::NoReviews {
            url: url.to_string(),
        });
    }

    let new_reviews = repo.reconcile_reviews(&batch)?;
    info!("{} new reviews", new_reviews.len());

    let previous = repo.last_snapshot(&batch.app_name, batch.store)?;
    let current = repo.reconcile_snapshot(&batch)?;
    let advanced = snapshot_advanced(previous.as_ref(), &current);

    if advanced {
        info!("Rating distribution changed (snapshot #{})", current.id);
        notifier.notify_snapshot(&current, previous.as_ref())?;
    } else {
        info!("Rating distribution unchanged");
    }

    notifier.notify_new_reviews(&new_reviews)?;

    Ok(RunReport {
        new_reviews,
        previous,
        current,
        snapshot_advanced: advanced,
    })
}

//! Play Store StoreAdapter implementation.
//!
//! "Do X": Collect recent Play Store reviews and derive their distribution.
//!
//! The Play Store page exposes no rating distribution we can read, so the
//! adapter tallies the star ratings of the reviews it enumerates and uses
//! the review count as the total. Enumeration itself is delegated to a
//! [`ReviewFeed`]; the shipped [`CommandFeed`] runs an external scraper
//! program and reads its JSON output.

mod internal;

use log::info;

use super::StoreAdapter;
use crate::config::PlayStoreSection;
use crate::error::Result;
use crate::rating::rounded_percentage;
use crate::reviews::{Distribution, Review, ReviewBatch, ReviewColumns, Store};

pub use internal::app_info;

/// Application identity taken from a Play Store URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayApp {
    /// Package id, e.g. `com.king.candycrushsaga`
    pub id: String,
    /// `hl` language, e.g. `en`
    pub lang: String,
}

/// One review as reported by a feed, before it joins a batch.
pub type FeedReview = Review;

/// Enumerates the most recent reviews of a Play Store app.
pub trait ReviewFeed {
    /// Fetch up to `count` most recent reviews, newest first.
    fn fetch(&self, app: &PlayApp, count: usize) -> Result<Vec<FeedReview>>;
}

/// ReviewFeed backed by an external program printing JSON.
pub struct CommandFeed {
    program: String,
    args: Vec<String>,
}

impl CommandFeed {
    pub fn new(config: &PlayStoreSection) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

impl ReviewFeed for CommandFeed {
    fn fetch(&self, app: &PlayApp, count: usize) -> Result<Vec<FeedReview>> {
        internal::run_feed_command(&self.program, &self.args, app, count)
    }
}

/// Play Store implementation of StoreAdapter.
pub struct PlayStoreAdapter {
    feed: Box<dyn ReviewFeed>,
    review_count: usize,
}

impl PlayStoreAdapter {
    pub fn new(feed: Box<dyn ReviewFeed>, review_count: usize) -> Self {
        Self { feed, review_count }
    }
}

impl StoreAdapter for PlayStoreAdapter {
    fn store(&self) -> Store {
        Store::Android
    }

    fn surf(&self, app_name: &str, page: &str) -> Result<ReviewBatch> {
        let app = app_info(page)?;
        info!(
            "Fetching up to {} Play Store reviews for {} ({})",
            self.review_count, app.id, app.lang
        );

        let reviews = self.feed.fetch(&app, self.review_count)?;

        let mut buckets = [0_i64; 5];
        let mut columns = ReviewColumns::default();
        for review in reviews.into_iter().take(self.review_count) {
            if let 1..=5 = review.rating {
                buckets[usize::from(review.rating) - 1] += 1;
            }
            columns.push(review);
        }

        let total = columns.usernames.len() as i64;
        let distribution =
            Distribution::new(total, buckets.map(|count| rounded_percentage(count, total)));
        info!(
            "Derived distribution from {} reviews: {:?}",
            total,
            distribution.percentages()
        );

        ReviewBatch::from_columns(app_name, Store::Android, columns, distribution)
    }
}

//! Store adapters: turn a review URL into a validated [`ReviewBatch`].
//!
//! "Do X": Scrape one app's reviews from one storefront.
//!
//! # Design
//!
//! - **StoreAdapter**: one capability, `surf`, shared by every storefront
//! - **app_store**: rendered product page, parsed field by field
//! - **play_store**: no page-level distribution, derived from a review feed
//!
//! # Example
//!
//! ```ignore
//! use storewatch::store;
//!
//! let kind = store::detect("https://apps.apple.com/us/app/x/id553834731?see-all=reviews")?;
//! let adapter = store::adapter(kind, &config)?;
//! let batch = adapter.surf("candy-crush", url)?;
//! ```

pub mod app_store;
pub mod play_store;

mod datetime;

pub use app_store::{AppStoreAdapter, HttpFetcher, PageFetcher};
pub use play_store::{CommandFeed, FeedReview, PlayApp, PlayStoreAdapter, ReviewFeed};

use reqwest::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reviews::{ReviewBatch, Store};

/// Host of the App Store product pages.
pub const APP_STORE_HOST: &str = "apps.apple.com";
/// Host of the Play Store product pages.
pub const PLAY_STORE_HOST: &str = "play.google.com";

/// Scrape access to one storefront.
///
/// Implementations validate the batch before returning it; callers never
/// see a partially extracted batch.
pub trait StoreAdapter {
    /// Storefront this adapter scrapes.
    fn store(&self) -> Store;

    /// Extract reviews and the rating distribution from `page`.
    ///
    /// `app_name` is attached to the batch as given.
    fn surf(&self, app_name: &str, page: &str) -> Result<ReviewBatch>;
}

/// Classify a review URL by its host.
pub fn detect(url: &str) -> Result<Store> {
    let parsed = parse_url(url)?;
    let host = parsed.host_str().unwrap_or_default();

    if host == APP_STORE_HOST {
        Ok(Store::Ios)
    } else if host == PLAY_STORE_HOST {
        Ok(Store::Android)
    } else {
        Err(Error::classification(
            url,
            format!("host '{}' is neither {} nor {}", host, APP_STORE_HOST, PLAY_STORE_HOST),
        ))
    }
}

/// Build the adapter for a storefront from config.
pub fn adapter(store: Store, config: &Config) -> Result<Box<dyn StoreAdapter>> {
    match store {
        Store::Ios => {
            let fetcher = HttpFetcher::new(&config.app_store)?;
            Ok(Box::new(AppStoreAdapter::new(Box::new(fetcher))))
        }
        Store::Android => {
            let feed = CommandFeed::new(&config.play_store);
            Ok(Box::new(PlayStoreAdapter::new(
                Box::new(feed),
                config.play_store.review_count,
            )))
        }
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::classification(url, e.to_string()))
}

//! App Store StoreAdapter implementation.
//!
//! "Do X": Scrape reviews from a rendered App Store product page.
//!
//! Fetching goes through [`PageFetcher`] so extraction can run against
//! fixture HTML. All selector and pattern work lives in internal.rs.

mod internal;

pub use internal::RATING_BARS;

use log::info;
use reqwest::blocking::Client;
use scraper::Html;
use std::time::Duration;

use super::StoreAdapter;
use crate::config::AppStoreSection;
use crate::error::{Error, Result};
use crate::reviews::{ReviewBatch, Store};

/// Retrieves the HTML of a page.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP fetcher with a browser user agent.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &AppStoreSection) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Fetch {
                target: "http client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let fetch_error = |reason: String| Error::Fetch {
            target: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

/// App Store implementation of StoreAdapter.
pub struct AppStoreAdapter {
    fetcher: Box<dyn PageFetcher>,
}

impl AppStoreAdapter {
    pub fn new(fetcher: Box<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Extract a batch from already fetched HTML.
    pub fn extract(&self, app_name: &str, page: &str, html: &str) -> Result<ReviewBatch> {
        let document = Html::parse_document(html);
        internal::extract_batch(&document, app_name, page)
    }
}

impl StoreAdapter for AppStoreAdapter {
    fn store(&self) -> Store {
        Store::Ios
    }

    fn surf(&self, app_name: &str, page: &str) -> Result<ReviewBatch> {
        info!("Fetching App Store page {}", page);
        let html = self.fetcher.fetch(page)?;
        let batch = self.extract(app_name, page, &html)?;
        info!(
            "Extracted {} reviews, {} ratings in total",
            batch.reviews.len(),
            batch.distribution.total
        );
        Ok(batch)
    }
}

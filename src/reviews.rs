//! Canonical shape of one scrape result.
//!
//! Extraction fills [`ReviewColumns`] one concern at a time (all ratings,
//! then all dates, and so on). The columns are checked for equal length and
//! zipped into [`Review`] records exactly once, inside
//! [`ReviewBatch::from_columns`], so nothing downstream indexes parallel
//! arrays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Storefront a batch was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Ios,
    Android,
}

impl Store {
    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Ios => "ios",
            Store::Android => "android",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Store::Ios),
            "android" => Ok(Store::Android),
            other => Err(format!("unknown store '{}' (expected ios or android)", other)),
        }
    }
}

/// One review as shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub username: String,
    pub title: String,
    pub body: String,
    /// 1..=5, or 0 when the page carried no recognisable star class.
    pub rating: u8,
    pub rated_at: DateTime<Utc>,
}

/// Aggregate rating distribution reported by (or derived for) a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Total number of ratings.
    pub total: i64,
    /// Percentage per star, index 0 is 1 star. Not required to sum to 100.
    percentages: [i64; 5],
}

impl Distribution {
    /// `percentages` run from 1 star to 5 stars.
    pub fn new(total: i64, percentages: [i64; 5]) -> Self {
        Self { total, percentages }
    }

    pub fn percentages(&self) -> &[i64; 5] {
        &self.percentages
    }

    /// Percentage for a star count in 1..=5. Out of range yields 0.
    pub fn percentage(&self, stars: u8) -> i64 {
        match stars {
            1..=5 => self.percentages[usize::from(stars) - 1],
            _ => 0,
        }
    }

    /// Set the percentage for a star count in 1..=5; other values are ignored.
    pub fn set_percentage(&mut self, stars: u8, percentage: i64) {
        if let 1..=5 = stars {
            self.percentages[usize::from(stars) - 1] = percentage;
        }
    }
}

/// Per-concern columns as extracted from a page.
///
/// Index `i` of every column describes the same review. The columns are
/// filled independently, so they only line up if the page structure held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewColumns {
    pub ratings: Vec<u8>,
    pub usernames: Vec<String>,
    pub titles: Vec<String>,
    pub bodies: Vec<String>,
    pub rated_at: Vec<DateTime<Utc>>,
}

impl ReviewColumns {
    /// All columns must be the same length. All empty is fine.
    pub fn validate(&self) -> Result<()> {
        let len = self.usernames.len();
        let consistent = self.titles.len() == len
            && self.bodies.len() == len
            && self.ratings.len() == len
            && self.rated_at.len() == len;

        if consistent {
            Ok(())
        } else {
            Err(Error::InconsistentBatch {
                usernames: self.usernames.len(),
                titles: self.titles.len(),
                bodies: self.bodies.len(),
                ratings: self.ratings.len(),
                rated_at: self.rated_at.len(),
            })
        }
    }

    pub fn push(&mut self, review: Review) {
        self.ratings.push(review.rating);
        self.usernames.push(review.username);
        self.titles.push(review.title);
        self.bodies.push(review.body);
        self.rated_at.push(review.rated_at);
    }

    fn into_reviews(self) -> Result<Vec<Review>> {
        self.validate()?;

        let reviews = self
            .usernames
            .into_iter()
            .zip(self.titles)
            .zip(self.bodies)
            .zip(self.ratings)
            .zip(self.rated_at)
            .map(|((((username, title), body), rating), rated_at)| Review {
                username,
                title,
                body,
                rating,
                rated_at,
            })
            .collect();
        Ok(reviews)
    }
}

/// One validated scrape result for an (application, store) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewBatch {
    /// Chosen by the caller, never read from the page.
    pub app_name: String,
    pub store: Store,
    pub reviews: Vec<Review>,
    pub distribution: Distribution,
}

impl ReviewBatch {
    /// Validate the columns and assemble the batch.
    pub fn from_columns(
        app_name: impl Into<String>,
        store: Store,
        columns: ReviewColumns,
        distribution: Distribution,
    ) -> Result<Self> {
        Ok(Self {
            app_name: app_name.into(),
            store,
            reviews: columns.into_reviews()?,
            distribution,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

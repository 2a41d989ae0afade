//! Error taxonomy for the extraction-and-reconciliation engine.
//!
//! Every variant is terminal for the current invocation. Nothing in the
//! library retries; the caller decides what to do with a failure.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The review URL belongs to no known storefront, or lacks a required
    /// query parameter.
    #[error("cannot classify review url {url}: {reason}")]
    Classification { url: String, reason: String },

    /// A required page element is missing or its content does not parse.
    #[error("failed to extract {field} from {page}: {reason}")]
    Extraction {
        field: &'static str,
        page: String,
        reason: String,
    },

    /// Review columns came back with different lengths.
    #[error(
        "fetched review counts do not match up (usernames={usernames}, titles={titles}, \
         bodies={bodies}, ratings={ratings}, rated_at={rated_at})"
    )]
    InconsistentBatch {
        usernames: usize,
        titles: usize,
        bodies: usize,
        ratings: usize,
        rated_at: usize,
    },

    /// A find or insert against the store failed.
    #[error("persistence failed during {operation}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The page or review feed could not be retrieved.
    #[error("failed to fetch {target}: {reason}")]
    Fetch { target: String, reason: String },

    /// A notification channel rejected a message.
    #[error("failed to notify via {channel}: {reason}")]
    Notify {
        channel: &'static str,
        reason: String,
    },

    /// The scraped page reported no reviews at all.
    #[error("no reviews found at {url}, or the page did not render")]
    NoReviews { url: String },
}

impl Error {
    pub(crate) fn extraction(
        field: &'static str,
        page: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Extraction {
            field,
            page: page.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn classification(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Classification {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Adapter for `map_err` on rusqlite calls.
    pub(crate) fn persistence(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Error::Persistence { operation, source }
    }
}

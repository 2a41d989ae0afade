//! Internal implementation for the Play Store adapter.
//!
//! Contains URL parsing, the feed command call and its JSON parsing.
//! Not exposed in public interface.

use log::debug;
use serde::Deserialize;
use std::process::Command;

use super::{FeedReview, PlayApp};
use crate::error::{Error, Result};
use crate::store::datetime::parse_datetime;
use crate::store::{parse_url, PLAY_STORE_HOST};

// ============================================================================
// Feed JSON types (internal, match the scraper's output format)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    user_name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    score: u8,
    date: String,
}

/// Play Store reviews have no title; this stands in for it.
pub const DEFAULT_TITLE: &str = "Google Play store";

// ============================================================================
// Functions called by PlayStoreAdapter / CommandFeed
// ============================================================================

/// Package id and language from a Play Store URL.
///
/// `play.google.com/store/apps/details?id=com.king.candycrushsaga&hl=en&gl=US`
/// yields id `com.king.candycrushsaga`, lang `en`.
pub fn app_info(url: &str) -> Result<PlayApp> {
    let parsed = parse_url(url)?;
    let host = parsed.host_str().unwrap_or_default();
    if host != PLAY_STORE_HOST {
        return Err(Error::classification(
            url,
            format!("host '{}' is not {}", host, PLAY_STORE_HOST),
        ));
    }

    let query = |key: &str| {
        parsed
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    let id = query("id")
        .ok_or_else(|| Error::classification(url, "missing app id query parameter 'id'"))?;
    let lang = query("hl")
        .ok_or_else(|| Error::classification(url, "missing language query parameter 'hl'"))?;

    Ok(PlayApp { id, lang })
}

/// Run the configured feed program and parse its stdout.
pub(crate) fn run_feed_command(
    program: &str,
    args: &[String],
    app: &PlayApp,
    count: usize,
) -> Result<Vec<FeedReview>> {
    let args: Vec<String> = args
        .iter()
        .map(|arg| expand_placeholders(arg, app, count))
        .collect();
    debug!("Running review feed: {} {}", program, args.join(" "));

    let fetch_error = |reason: String| Error::Fetch {
        target: format!("{} reviews via `{}`", app.id, program),
        reason,
    };

    let output = Command::new(program)
        .args(&args)
        .output()
        .map_err(|e| fetch_error(format!("failed to run: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fetch_error(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_feed_output(&String::from_utf8_lossy(&output.stdout), &app.id)
}

fn expand_placeholders(arg: &str, app: &PlayApp, count: usize) -> String {
    arg.replace("{id}", &app.id)
        .replace("{lang}", &app.lang)
        .replace("{count}", &count.to_string())
}

/// Parse the feed's JSON array into reviews.
pub(crate) fn parse_feed_output(json: &str, app_id: &str) -> Result<Vec<FeedReview>> {
    let items: Vec<FeedItem> = serde_json::from_str(json).map_err(|e| {
        Error::extraction("review feed", app_id, format!("invalid feed JSON: {}", e))
    })?;

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let rated_at = parse_datetime(&item.date).ok_or_else(|| {
                Error::extraction(
                    "review date",
                    app_id,
                    format!("review #{} date '{}' is not a date", idx, item.date),
                )
            })?;
            Ok(FeedReview {
                username: item.user_name.trim().to_string(),
                title: item
                    .title
                    .map(|title| title.trim().to_string())
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                body: item.text.unwrap_or_default(),
                rating: item.score,
                rated_at,
            })
        })
        .collect()
}

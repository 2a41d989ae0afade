//! Internal implementation for the App Store adapter.
//!
//! Each concern is extracted on its own pass over the document. Order does
//! not matter; the columns are reconciled once at the end by
//! [`ReviewBatch::from_columns`].
//!
//! Page layout the selectors assume:
//!
//! ```text
//! 276 Ratings  ★★★★★ ─────────  style="width: 17%"
//!              ★★★★  ───
//!              ★★★   ──
//!              ★★    ─
//!              ★     ────
//!
//! ★★★☆☆                        .we-star-rating-stars-3
//! John Doe      2021/12/02      .we-customer-review__user / __date[datetime]
//! Great App                     .we-customer-review__title
//! Hi, this is a great app..     .we-customer-review__body
//! ```

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::reviews::{Distribution, ReviewBatch, ReviewColumns, Store};
use crate::store::datetime::parse_datetime;

/// Rating bars in rendered order, top to bottom.
pub const RATING_BARS: [(&str, u8); 5] = [
    ("5-star", 5),
    ("4-star", 4),
    ("3-star", 3),
    ("2-star", 2),
    ("1-star", 1),
];

/// Unit suffixes on the total count. Add a marker here to support another
/// locale's abbreviation.
const UNIT_MARKERS: &[(&str, f64)] = &[("M", 1_000_000.0), ("K", 1_000.0), ("万", 10_000.0)];

const TOTAL_CSS: &str = ".we-customer-ratings__count";
const BAR_CSS: &str = ".we-star-bar-graph__bar__foreground-bar";
const STARS_CSS: &str = ".we-star-rating-stars";
const DATE_CSS: &str = ".we-customer-review__date";
const USER_CSS: &str = ".we-customer-review__user";
const TITLE_CSS: &str = ".we-customer-review__title";
const BODY_CSS: &str = ".we-customer-review__body";

/// `we-star-rating-stars-4` marks a 4 star review.
const STARS_CLASS_PREFIX: &str = "we-star-rating-stars-";

struct Selectors {
    total: Selector,
    bar: Selector,
    stars: Selector,
    date: Selector,
    user: Selector,
    title: Selector,
    body: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("Invalid App Store selector");
        Selectors {
            total: parse(TOTAL_CSS),
            bar: parse(BAR_CSS),
            stars: parse(STARS_CSS),
            date: parse(DATE_CSS),
            user: parse(USER_CSS),
            title: parse(TITLE_CSS),
            body: parse(BODY_CSS),
        }
    })
}

/// Leading number of the total count, e.g. `2.5` in `2.5M Ratings`.
fn count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("Invalid count regex"))
}

/// `width: 17%` inside a bar's inline style.
fn width_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"width:\s*\d+(?:\.\d+)?%").expect("Invalid width regex"))
}

fn digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("Invalid digits regex"))
}

/// Extract and validate a full batch from a product page.
pub(crate) fn extract_batch(document: &Html, app_name: &str, page: &str) -> Result<ReviewBatch> {
    let mut distribution = Distribution::new(extract_total(document, page)?, [0; 5]);
    extract_bars(document, page, &mut distribution)?;

    let columns = ReviewColumns {
        ratings: extract_ratings(document),
        rated_at: extract_dates(document, page)?,
        usernames: extract_texts(document, &selectors().user, true),
        titles: extract_texts(document, &selectors().title, true),
        bodies: extract_texts(document, &selectors().body, false),
    };
    debug!(
        "Columns from {}: ratings={} dates={} users={} titles={} bodies={}",
        page,
        columns.ratings.len(),
        columns.rated_at.len(),
        columns.usernames.len(),
        columns.titles.len(),
        columns.bodies.len()
    );

    ReviewBatch::from_columns(app_name, Store::Ios, columns, distribution)
}

/// Total number of ratings, e.g. `276 Ratings`, `2.5M Ratings`, `2.5万件の評価`.
pub(crate) fn extract_total(document: &Html, page: &str) -> Result<i64> {
    let element = document
        .select(&selectors().total)
        .next()
        .ok_or_else(|| Error::extraction("total", page, format!("no {} element", TOTAL_CSS)))?;
    let text = element.text().collect::<String>();

    let token = count_regex().find(&text).ok_or_else(|| {
        Error::extraction("total", page, format!("no number in '{}'", text.trim()))
    })?;
    let value: f64 = token.as_str().replace(',', "").parse().map_err(|e| {
        Error::extraction("total", page, format!("'{}' is not a number: {}", token.as_str(), e))
    })?;

    if value < 0.0 {
        return Err(Error::extraction(
            "total",
            page,
            format!("negative count '{}'", token.as_str()),
        ));
    }

    let total = value * unit_multiplier(&text[token.end()..]);
    Ok(total as i64)
}

/// Multiplier for a unit marker directly after the number, 1 if none.
fn unit_multiplier(rest: &str) -> f64 {
    let rest = rest.trim_start();
    UNIT_MARKERS
        .iter()
        .find(|(marker, _)| {
            rest.strip_prefix(marker)
                .is_some_and(|after| !after.starts_with(|c: char| c.is_ascii_alphanumeric()))
        })
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

/// Percentages from the five distribution bars, assigned via [`RATING_BARS`].
pub(crate) fn extract_bars(
    document: &Html,
    page: &str,
    distribution: &mut Distribution,
) -> Result<()> {
    let bars: Vec<ElementRef> = document.select(&selectors().bar).collect();
    if bars.len() != RATING_BARS.len() {
        return Err(Error::extraction(
            "rating bars",
            page,
            format!("expected {} bars, found {}", RATING_BARS.len(), bars.len()),
        ));
    }

    for ((label, stars), bar) in RATING_BARS.iter().zip(bars) {
        let fail = |reason: String| Error::extraction("rating bars", page, reason);

        let style = bar
            .value()
            .attr("style")
            .ok_or_else(|| fail(format!("{} bar has no style attribute", label)))?;
        let width = width_regex()
            .find(style)
            .ok_or_else(|| fail(format!("{} bar style '{}' has no width", label, style)))?;
        let percentage = digits_regex()
            .find(width.as_str())
            .ok_or_else(|| fail(format!("{} bar width '{}' has no number", label, width.as_str())))?
            .as_str()
            .parse::<i64>()
            .map_err(|e| fail(format!("{} bar width: {}", label, e)))?;

        distribution.set_percentage(*stars, percentage);
    }
    Ok(())
}

/// Star rating per review. Unrecognised markup yields 0 rather than failing.
pub(crate) fn extract_ratings(document: &Html) -> Vec<u8> {
    document
        .select(&selectors().stars)
        .map(|element| {
            element
                .value()
                .classes()
                .find_map(|class| {
                    class
                        .strip_prefix(STARS_CLASS_PREFIX)?
                        .parse::<u8>()
                        .ok()
                        .filter(|stars| (1..=5).contains(stars))
                })
                .unwrap_or(0)
        })
        .collect()
}

/// Review dates from the machine readable `datetime` attribute.
pub(crate) fn extract_dates(
    document: &Html,
    page: &str,
) -> Result<Vec<chrono::DateTime<chrono::Utc>>> {
    document
        .select(&selectors().date)
        .enumerate()
        .map(|(idx, element)| {
            let raw = element.value().attr("datetime").ok_or_else(|| {
                Error::extraction("review date", page, format!("review #{} has no datetime", idx))
            })?;
            parse_datetime(raw).ok_or_else(|| {
                Error::extraction(
                    "review date",
                    page,
                    format!("review #{} datetime '{}' is not a date", idx, raw),
                )
            })
        })
        .collect()
}

fn extract_texts(document: &Html, selector: &Selector, trim: bool) -> Vec<String> {
    document
        .select(selector)
        .map(|element| {
            let text = element.text().collect::<String>();
            if trim {
                text.trim().to_string()
            } else {
                text
            }
        })
        .collect()
}

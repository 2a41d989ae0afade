//! Percentage and rating arithmetic shared by the adapters and notifiers.

use crate::reviews::Distribution;

/// Share of `count` in `total` as a whole percentage.
///
/// E.g. 127/999 = 12.71% rounds to 13, 123/999 = 12.31% rounds to 12.
/// A zero total yields 0 and results are never negative.
pub fn rounded_percentage(count: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    let percentage = (count as f64 / total as f64 * 100.0).round() as i64;
    percentage.max(0)
}

/// Weighted mean star rating of a distribution.
///
/// Percentages are taken as given. Negative values are not rejected and
/// simply take part in the sums; only a non-positive denominator short
/// circuits to 0.
pub fn average_rating(distribution: &Distribution) -> f64 {
    let denominator: i64 = distribution.percentages().iter().sum();
    if denominator <= 0 {
        return 0.0;
    }
    let numerator: i64 = distribution
        .percentages()
        .iter()
        .zip(1_i64..)
        .map(|(pct, stars)| stars * pct)
        .sum();
    numerator as f64 / denominator as f64
}

/// `★★★☆☆` style rendering of a 0..=5 rating.
pub fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

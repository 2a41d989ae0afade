//! Persisted row types.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::Serialize;

use crate::reviews::{Distribution, Store};

/// One stored review, row of `reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub app_name: String,
    pub store: Store,
    pub username: String,
    pub title: String,
    pub body: String,
    pub rating: u8,
    pub rated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One stored distribution observation, row of `review_counts`.
///
/// The identity that matters for change detection is `id`: two snapshots
/// with equal distributions are the same state only if they are the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingSnapshot {
    pub id: i64,
    pub app_name: String,
    pub store: Store,
    pub distribution: Distribution,
    pub created_at: DateTime<Utc>,
}

pub(crate) const REVIEW_COLUMNS: &str =
    "id, app_name, store, username, title, body, rating, rated_at, created_at";

pub(crate) const SNAPSHOT_COLUMNS: &str = "id, app_name, store, total, \
     rating_1_percentage, rating_2_percentage, rating_3_percentage, \
     rating_4_percentage, rating_5_percentage, created_at";

impl ReviewRecord {
    /// Map a row selected with [`REVIEW_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            app_name: row.get(1)?,
            store: row.get(2)?,
            username: row.get(3)?,
            title: row.get(4)?,
            body: row.get(5)?,
            rating: row.get(6)?,
            rated_at: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl RatingSnapshot {
    /// Map a row selected with [`SNAPSHOT_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            app_name: row.get(1)?,
            store: row.get(2)?,
            distribution: Distribution::new(
                row.get(3)?,
                [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?],
            ),
            created_at: row.get(9)?,
        })
    }
}

impl ToSql for Store {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Store {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

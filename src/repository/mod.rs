//! Reconciliation of scraped batches against the persisted corpus.
//!
//! "Do X": Persist only what is new - unseen reviews, unseen distributions.
//!
//! # Design
//!
//! Both tables are keyed by domain fields, not timestamps:
//!
//! - a review is `(app_name, store, username, rated_at)`
//! - a snapshot is `(app_name, store, total, rating_1..5_percentage)`
//!
//! Re-running the same batch is therefore a no-op, without locking. Each
//! insert commits on its own; a failure mid-run leaves earlier inserts.
//!
//! # Order
//!
//! Callers run [`ReviewsRepository::reconcile_reviews`], then
//! [`ReviewsRepository::last_snapshot`], then
//! [`ReviewsRepository::reconcile_snapshot`], and compare the last two
//! with [`snapshot_advanced`].

mod models;
pub mod schema;

pub use models::{RatingSnapshot, ReviewRecord};

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::reviews::{Distribution, Review, ReviewBatch, Store};
use models::{REVIEW_COLUMNS, SNAPSHOT_COLUMNS};

/// Repository over the `reviews` and `review_counts` tables.
pub struct ReviewsRepository {
    conn: Connection,
}

impl ReviewsRepository {
    /// Open (or create) a database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::persistence("open database"))?;
        Self::from_connection(conn)
    }

    /// In-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(Error::persistence("open in-memory database"))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Re-apply the schema.
    pub fn migrate(&self) -> Result<()> {
        schema::migrate(&self.conn)
    }

    /// Insert every review of the batch that is not stored yet.
    ///
    /// Returns only the inserted records, in batch order. Existing reviews
    /// are left untouched, even if their title or body changed.
    pub fn reconcile_reviews(&self, batch: &ReviewBatch) -> Result<Vec<ReviewRecord>> {
        let mut inserted = Vec::new();

        for review in &batch.reviews {
            let existing =
                self.find_review(&batch.app_name, batch.store, &review.username, &review.rated_at)?;
            if existing.is_some() {
                continue;
            }
            inserted.push(self.insert_review(&batch.app_name, batch.store, review)?);
        }

        debug!(
            "{} of {} reviews are new for {}/{}",
            inserted.len(),
            batch.reviews.len(),
            batch.app_name,
            batch.store
        );
        Ok(inserted)
    }

    /// Most recently inserted snapshot for the pair, if any.
    pub fn last_snapshot(&self, app_name: &str, store: Store) -> Result<Option<RatingSnapshot>> {
        let sql = format!(
            "SELECT {} FROM review_counts
             WHERE app_name = ?1 AND store = ?2 AND deleted_at IS NULL
             ORDER BY id DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        );
        self.conn
            .query_row(&sql, params![app_name, store], RatingSnapshot::from_row)
            .optional()
            .map_err(Error::persistence("find last snapshot"))
    }

    /// Snapshot matching the batch's distribution exactly, inserted if new.
    ///
    /// A distribution seen before returns its original row, even when a
    /// different distribution was recorded in between.
    pub fn reconcile_snapshot(&self, batch: &ReviewBatch) -> Result<RatingSnapshot> {
        if let Some(existing) =
            self.find_snapshot(&batch.app_name, batch.store, &batch.distribution)?
        {
            debug!("Distribution already recorded as snapshot #{}", existing.id);
            return Ok(existing);
        }
        self.insert_snapshot(&batch.app_name, batch.store, &batch.distribution)
    }

    /// Number of stored reviews for the pair.
    pub fn review_count(&self, app_name: &str, store: Store) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM reviews
                 WHERE app_name = ?1 AND store = ?2 AND deleted_at IS NULL",
                params![app_name, store],
                |row| row.get(0),
            )
            .map_err(Error::persistence("count reviews"))
    }

    /// Latest snapshots for the pair, newest first.
    pub fn snapshot_history(
        &self,
        app_name: &str,
        store: Store,
        limit: usize,
    ) -> Result<Vec<RatingSnapshot>> {
        let sql = format!(
            "SELECT {} FROM review_counts
             WHERE app_name = ?1 AND store = ?2 AND deleted_at IS NULL
             ORDER BY id DESC LIMIT ?3",
            SNAPSHOT_COLUMNS
        );
        let history = || -> rusqlite::Result<Vec<RatingSnapshot>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![app_name, store, limit as i64],
                RatingSnapshot::from_row,
            )?;
            rows.collect()
        };
        history().map_err(Error::persistence("list snapshots"))
    }

    fn find_review(
        &self,
        app_name: &str,
        store: Store,
        username: &str,
        rated_at: &DateTime<Utc>,
    ) -> Result<Option<ReviewRecord>> {
        let sql = format!(
            "SELECT {} FROM reviews
             WHERE app_name = ?1 AND store = ?2 AND username = ?3 AND rated_at = ?4
               AND deleted_at IS NULL
             ORDER BY id LIMIT 1",
            REVIEW_COLUMNS
        );
        self.conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| {
                stmt.query_row(
                    params![app_name, store, username, rated_at],
                    ReviewRecord::from_row,
                )
                .optional()
            })
            .map_err(Error::persistence("find review"))
    }

    fn insert_review(&self, app_name: &str, store: Store, review: &Review) -> Result<ReviewRecord> {
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO reviews
                 (app_name, store, username, title, body, rating, rated_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    app_name,
                    store,
                    &review.username,
                    &review.title,
                    &review.body,
                    review.rating,
                    review.rated_at,
                    now,
                ],
            )
            .map_err(Error::persistence("insert review"))?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted review #{} by {}", id, review.username);

        Ok(ReviewRecord {
            id,
            app_name: app_name.to_string(),
            store,
            username: review.username.clone(),
            title: review.title.clone(),
            body: review.body.clone(),
            rating: review.rating,
            rated_at: review.rated_at,
            created_at: now,
        })
    }

    fn find_snapshot(
        &self,
        app_name: &str,
        store: Store,
        distribution: &Distribution,
    ) -> Result<Option<RatingSnapshot>> {
        let [one, two, three, four, five] = *distribution.percentages();
        let sql = format!(
            "SELECT {} FROM review_counts
             WHERE app_name = ?1 AND store = ?2 AND total = ?3
               AND rating_1_percentage = ?4 AND rating_2_percentage = ?5
               AND rating_3_percentage = ?6 AND rating_4_percentage = ?7
               AND rating_5_percentage = ?8
               AND deleted_at IS NULL
             ORDER BY id DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        );
        self.conn
            .query_row(
                &sql,
                params![app_name, store, distribution.total, one, two, three, four, five],
                RatingSnapshot::from_row,
            )
            .optional()
            .map_err(Error::persistence("find snapshot"))
    }

    fn insert_snapshot(
        &self,
        app_name: &str,
        store: Store,
        distribution: &Distribution,
    ) -> Result<RatingSnapshot> {
        let now = Utc::now();
        let [one, two, three, four, five] = *distribution.percentages();
        self.conn
            .execute(
                "INSERT INTO review_counts
                 (app_name, store, total,
                  rating_1_percentage, rating_2_percentage, rating_3_percentage,
                  rating_4_percentage, rating_5_percentage, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![app_name, store, distribution.total, one, two, three, four, five, now],
            )
            .map_err(Error::persistence("insert snapshot"))?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted snapshot #{} for {}/{}", id, app_name, store);

        Ok(RatingSnapshot {
            id,
            app_name: app_name.to_string(),
            store,
            distribution: *distribution,
            created_at: now,
        })
    }
}

/// Whether `current` is a genuinely new state relative to `previous`.
///
/// `previous` must come from [`ReviewsRepository::last_snapshot`] read
/// before `current` was reconciled. Ids are never reused, so a snapshot
/// newer than the previous latest was inserted by that reconcile call; a
/// recurring older distribution has a lower id and is not an advance.
pub fn snapshot_advanced(previous: Option<&RatingSnapshot>, current: &RatingSnapshot) -> bool {
    match previous {
        None => true,
        Some(previous) => current.id != previous.id && current.id > previous.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::ReviewColumns;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn review(username: &str, title: &str, rated_at: DateTime<Utc>) -> Review {
        Review {
            username: username.into(),
            title: title.into(),
            body: format!("{} says hi", username),
            rating: 4,
            rated_at,
        }
    }

    fn batch(reviews: Vec<Review>, distribution: Distribution) -> ReviewBatch {
        let mut columns = ReviewColumns::default();
        for r in reviews {
            columns.push(r);
        }
        ReviewBatch::from_columns("app", Store::Ios, columns, distribution).unwrap()
    }

    fn distribution(total: i64, five: i64) -> Distribution {
        Distribution::new(total, [100 - five, 0, 0, 0, five])
    }

    #[test]
    fn test_reconcile_reviews_is_idempotent() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let batch = batch(
            vec![review("u1", "t", at(1)), review("u2", "t", at(2))],
            distribution(2, 50),
        );

        let first = repo.reconcile_reviews(&batch)?;
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].username, "u1");
        assert_eq!(first[1].username, "u2");
        assert!(first[0].id < first[1].id);

        let second = repo.reconcile_reviews(&batch)?;
        assert!(second.is_empty());
        assert_eq!(repo.review_count("app", Store::Ios)?, 2);
        Ok(())
    }

    #[test]
    fn test_natural_key_ignores_title_and_body() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        repo.reconcile_reviews(&batch(vec![review("u", "first", at(1))], distribution(1, 100)))?;

        let mut edited = review("u", "edited title", at(1));
        edited.body = "edited body".into();
        let again = repo.reconcile_reviews(&batch(vec![edited], distribution(1, 100)))?;

        assert!(again.is_empty());
        assert_eq!(repo.review_count("app", Store::Ios)?, 1);
        Ok(())
    }

    #[test]
    fn test_same_user_new_date_is_new_review() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        repo.reconcile_reviews(&batch(vec![review("u", "t", at(1))], distribution(1, 100)))?;

        let newer = repo.reconcile_reviews(&batch(vec![review("u", "t", at(2))], distribution(1, 100)))?;
        assert_eq!(newer.len(), 1);
        Ok(())
    }

    #[test]
    fn test_reviews_scoped_by_store() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let ios = batch(vec![review("u", "t", at(1))], distribution(1, 100));
        let mut android = ios.clone();
        android.store = Store::Android;

        assert_eq!(repo.reconcile_reviews(&ios)?.len(), 1);
        assert_eq!(repo.reconcile_reviews(&android)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_within_batch_inserted_once() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let inserted = repo.reconcile_reviews(&batch(
            vec![review("u", "t", at(1)), review("u", "t again", at(1))],
            distribution(2, 100),
        ))?;
        assert_eq!(inserted.len(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_batch() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let inserted = repo.reconcile_reviews(&batch(vec![], Distribution::default()))?;
        assert!(inserted.is_empty());
        Ok(())
    }

    #[test]
    fn test_last_snapshot_none_when_empty() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        assert!(repo.last_snapshot("app", Store::Ios)?.is_none());
        Ok(())
    }

    #[test]
    fn test_last_snapshot_is_latest_insert() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        repo.reconcile_snapshot(&batch(vec![], distribution(10, 10)))?;
        let second = repo.reconcile_snapshot(&batch(vec![], distribution(20, 20)))?;

        let last = repo.last_snapshot("app", Store::Ios)?.expect("snapshot");
        assert_eq!(last.id, second.id);
        assert_eq!(last.distribution, distribution(20, 20));
        assert!(repo.last_snapshot("app", Store::Android)?.is_none());
        Ok(())
    }

    #[test]
    fn test_snapshot_recurrence_reuses_original_row() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let d = batch(vec![], distribution(100, 70));
        let d_prime = batch(vec![], distribution(101, 71));

        let first = repo.reconcile_snapshot(&d)?;
        let other = repo.reconcile_snapshot(&d_prime)?;
        let again = repo.reconcile_snapshot(&d)?;

        assert_ne!(first.id, other.id);
        assert_eq!(again.id, first.id);
        assert_eq!(repo.snapshot_history("app", Store::Ios, 10)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_change_detection() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let d = batch(vec![], distribution(100, 70));
        let d_prime = batch(vec![], distribution(101, 71));

        // First observation ever
        let previous = repo.last_snapshot("app", Store::Ios)?;
        let current = repo.reconcile_snapshot(&d)?;
        assert!(snapshot_advanced(previous.as_ref(), &current));

        // Same distribution again
        let previous = repo.last_snapshot("app", Store::Ios)?;
        let current = repo.reconcile_snapshot(&d)?;
        assert_eq!(previous.as_ref().map(|s| s.id), Some(current.id));
        assert!(!snapshot_advanced(previous.as_ref(), &current));

        // Genuinely new distribution
        let previous = repo.last_snapshot("app", Store::Ios)?;
        let current = repo.reconcile_snapshot(&d_prime)?;
        assert_ne!(previous.as_ref().map(|s| s.id), Some(current.id));
        assert!(snapshot_advanced(previous.as_ref(), &current));

        // Old distribution recurs: different identity, but not fresh
        let previous = repo.last_snapshot("app", Store::Ios)?;
        let current = repo.reconcile_snapshot(&d)?;
        assert_ne!(previous.as_ref().map(|s| s.id), Some(current.id));
        assert!(!snapshot_advanced(previous.as_ref(), &current));
        Ok(())
    }

    #[test]
    fn test_end_to_end_single_review() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let mut columns = ReviewColumns::default();
        columns.usernames.push("u".into());
        columns.titles.push("t".into());
        columns.bodies.push("b".into());
        columns.ratings.push(1);
        columns.rated_at.push(at(7));
        let batch = ReviewBatch::from_columns("app", Store::Android, columns, Distribution::default())?;

        let first = repo.reconcile_reviews(&batch)?;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].app_name, "app");
        assert_eq!(first[0].store, Store::Android);
        assert_eq!(first[0].title, "t");
        assert_eq!(first[0].body, "b");
        assert_eq!(first[0].rating, 1);
        assert_eq!(first[0].rated_at, at(7));

        assert!(repo.reconcile_reviews(&batch)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_soft_deleted_review_is_not_a_match() -> Result<()> {
        let repo = ReviewsRepository::open_in_memory()?;
        let b = batch(vec![review("u", "t", at(1))], distribution(1, 100));
        repo.reconcile_reviews(&b)?;

        repo.conn
            .execute("UPDATE reviews SET deleted_at = '2024-06-01'", [])
            .map_err(Error::persistence("soft delete"))?;

        assert_eq!(repo.reconcile_reviews(&b)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_stored_rows_read_back() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.db");

        let inserted = {
            let repo = ReviewsRepository::open(&path)?;
            repo.reconcile_snapshot(&batch(vec![], distribution(42, 60)))?
        };

        let reopened = ReviewsRepository::open(&path)?;
        let last = reopened.last_snapshot("app", Store::Ios)?.expect("snapshot");
        assert_eq!(last.id, inserted.id);
        assert_eq!(last.store, Store::Ios);
        assert_eq!(last.distribution, distribution(42, 60));
        Ok(())
    }
}

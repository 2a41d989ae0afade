//! SQLite schema for persisted reviews and rating snapshots.
//!
//! Both tables are append-only from the engine's point of view: rows are
//! found by natural key and inserted, never updated or hard deleted.
//! `deleted_at` is a soft-delete marker maintained by operators.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Create tables and indexes. Safe to run on every open.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Individual reviews, natural key (app_name, store, username, rated_at)
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,   -- Never reused, orders inserts
            app_name TEXT NOT NULL,                 -- From the command line, not the page
            store TEXT NOT NULL,                    -- 'ios' | 'android'
            username TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            rating INTEGER NOT NULL,                -- 1..5, 0 when unrecognised
            rated_at TEXT NOT NULL,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_natural_key
            ON reviews(app_name, store, username, rated_at);

        -- Rating distribution snapshots, natural key is the distribution itself
        CREATE TABLE IF NOT EXISTS review_counts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            app_name TEXT NOT NULL,
            store TEXT NOT NULL,
            total INTEGER NOT NULL,
            rating_1_percentage INTEGER NOT NULL,
            rating_2_percentage INTEGER NOT NULL,
            rating_3_percentage INTEGER NOT NULL,
            rating_4_percentage INTEGER NOT NULL,
            rating_5_percentage INTEGER NOT NULL,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_review_counts_natural_key
            ON review_counts(app_name, store, total,
                             rating_1_percentage, rating_2_percentage, rating_3_percentage,
                             rating_4_percentage, rating_5_percentage);
        "#,
    )
    .map_err(Error::persistence("migrate"))
}

// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Local event index: the durable mapping from (subscription, remote uid)
//! to the materialized target-store event.

mod events;
mod subscriptions;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::SyncError;

pub use events::{IndexInsert, IndexUpdate, IndexedEvent, IndexedEvents};
pub use subscriptions::Subscriptions;

#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    pub subscriptions: Subscriptions,
    pub events: IndexedEvents,
}

impl LocalDb {
    /// Opens a sqlite database connection.
    /// If `filename` is `None`, it opens an in-memory database.
    pub async fn open(filename: Option<&Path>) -> Result<Self, SyncError> {
        let options = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true)
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            SqliteConnectOptions::new().in_memory(true)
        };
        let options = options.foreign_keys(true);

        // A private in-memory database exists per connection, so the pool
        // must hold exactly one and never recycle it or the migrated schema
        // vanishes mid-session.
        let pool_options = if filename.is_none() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("src/db/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        let subscriptions = Subscriptions::new(pool.clone());
        let events = IndexedEvents::new(pool.clone());
        Ok(LocalDb {
            pool,
            subscriptions,
            events,
        })
    }

    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }
}

/// Stable timestamp encoding for TEXT columns.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(format!("invalid timestamp {raw:?}: {e}").into()))
}

// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy, split by failure domain so callers can isolate
//! per-subscription and per-event failures.

use thiserror::Error;

/// Errors raised while fetching a feed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (connect, TLS, unexpected status).
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the provided credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The feed does not exist at the given location.
    #[error("feed not found: {0}")]
    NotFound(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The location is not a supported URI.
    #[error("invalid feed location: {0}")]
    InvalidUri(String),

    /// Local file read failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing a fetched feed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed calendar feed: {0}")]
    Malformed(String),
}

/// Errors raised by a [`CalendarStore`](crate::CalendarStore) implementation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// A calendar-level operation failed.
    #[error("calendar operation failed: {0}")]
    Calendar(String),

    /// An event-level operation failed.
    #[error("event operation failed: {0}")]
    Event(String),

    /// The referenced handle no longer exists in the store.
    #[error("not found in store: {0}")]
    NotFound(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration error.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);

/// Error for a single subscription's sync. Nothing here propagates past the
/// orchestrator; it turns these into per-subscription report entries.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local event index failure. Should not occur under per-subscription
    /// exclusivity; fatal to that subscription's pass when it does.
    #[error("index error: {0}")]
    Index(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("subscription has no calendar in the target store")]
    MissingCalendarHandle,

    #[error("subscription not found: {0}")]
    SubscriptionNotFound(i64),

    #[error("subscription uri must not be empty")]
    EmptyUri,
}

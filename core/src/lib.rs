// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Subscribes to remote ICS feeds and reconciles them into a local calendar
//! store, keeping a durable index so repeated passes stay idempotent.

mod config;
mod db;
mod error;
mod feed;
mod fetch;
mod reconcile;
mod remote;
mod scheduler;
mod store;
mod subscription;
mod sync;

pub use crate::config::{APP_NAME, Config, MIN_SYNC_INTERVAL_MINUTES, Theme};
pub use crate::db::{IndexedEvent, LocalDb};
pub use crate::error::{ConfigError, FetchError, ParseError, StoreError, SyncError};
pub use crate::feed::parse_feed;
pub use crate::fetch::{Credentials, DEFAULT_USER_AGENT, FeedFetcher, Fetched, HttpFetcher};
pub use crate::reconcile::{EventFailure, ReconcileOutcome, Reconciler};
pub use crate::remote::RemoteEvent;
pub use crate::scheduler::SyncScheduler;
pub use crate::store::{
    CalendarHandle, CalendarProperties, CalendarStore, DirectoryStore, EventFields, EventHandle,
    StoredEvent,
};
pub use crate::subscription::{DEFAULT_COLOR, Subscription, SubscriptionDraft, SyncStrategy};
pub use crate::sync::{CancelFlag, PassOutcome, SubscriptionReport, SyncReport, Syncer};

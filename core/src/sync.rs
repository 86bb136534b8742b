// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Sync orchestration: drives fetch, parse and reconcile for each
//! subscription, with per-subscription failure isolation and bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::db::LocalDb;
use crate::error::{FetchError, SyncError};
use crate::feed;
use crate::fetch::FeedFetcher;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::store::{CalendarHandle, CalendarStore};
use crate::subscription::{Subscription, SubscriptionDraft};

/// Cooperative cancellation token shared between a running pass and its
/// superseder. Once set it stays set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

const CANCELLED_REASON: &str = "sync pass cancelled";

/// Result of syncing one subscription.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PassOutcome {
    Synced { outcome: ReconcileOutcome },
    Failed { reason: String },
}

impl PassOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-subscription line in a pass report.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SubscriptionReport {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub outcome: PassOutcome,
}

/// Report covering one whole sync pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SyncReport {
    pub completed_at: DateTime<Utc>,
    pub subscriptions: Vec<SubscriptionReport>,
}

impl SyncReport {
    pub fn failed_count(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.outcome.is_failed()).count()
    }
}

/// Orchestrates sync passes over all subscriptions.
///
/// A per-subscription async lock guarantees a single writer per target
/// calendar even when a manual sync overlaps a periodic pass.
pub struct Syncer {
    db: LocalDb,
    store: Arc<dyn CalendarStore>,
    fetcher: Arc<dyn FeedFetcher>,
    reconciler: Reconciler,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl Syncer {
    pub fn new(db: LocalDb, store: Arc<dyn CalendarStore>, fetcher: Arc<dyn FeedFetcher>) -> Self {
        let reconciler = Reconciler::new(store.clone(), db.clone());
        Self {
            db,
            store,
            fetcher,
            reconciler,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a new subscription. No fetch happens here; the next pass
    /// picks it up.
    pub async fn import(&self, draft: &SubscriptionDraft) -> Result<Subscription, SyncError> {
        if draft.uri.trim().is_empty() {
            return Err(SyncError::EmptyUri);
        }
        let sub = self.db.subscriptions.insert(draft, Utc::now()).await?;
        tracing::info!(subscription = sub.id, name = %sub.name, "imported subscription");
        Ok(sub)
    }

    /// Persists edited settings and pushes display properties to the target
    /// calendar when one exists already.
    pub async fn update_subscription(&self, sub: &Subscription) -> Result<(), SyncError> {
        self.db.subscriptions.update(sub, Utc::now()).await?;
        if let Some(handle) = &sub.calendar_handle {
            self.store
                .update_calendar(handle, &sub.display_properties())
                .await?;
        }
        Ok(())
    }

    /// Removes a subscription, its target calendar and its index entries.
    pub async fn remove(&self, id: i64) -> Result<(), SyncError> {
        let sub = self
            .db
            .subscriptions
            .get(id)
            .await?
            .ok_or(SyncError::SubscriptionNotFound(id))?;

        if let Some(handle) = &sub.calendar_handle {
            self.store.delete_calendar(handle).await?;
        }
        self.db.subscriptions.delete(id).await?;
        tracing::info!(subscription = id, "removed subscription");
        Ok(())
    }

    /// Runs one sync pass over every subscription.
    ///
    /// Failures are isolated per subscription; the pass itself only fails on
    /// an index error while listing. Subscriptions left unprocessed by a
    /// cancellation are reported as failed without touching the store.
    #[tracing::instrument(skip_all)]
    pub async fn run_pass(&self, cancel: &CancelFlag) -> Result<SyncReport, SyncError> {
        let subscriptions = self.db.subscriptions.list().await?;
        tracing::info!(count = subscriptions.len(), "starting sync pass");

        let mut reports = Vec::with_capacity(subscriptions.len());
        for sub in subscriptions {
            let outcome = if cancel.is_set() {
                PassOutcome::Failed {
                    reason: CANCELLED_REASON.to_string(),
                }
            } else {
                self.sync_locked(&sub, cancel).await
            };
            reports.push(SubscriptionReport {
                id: sub.id,
                name: sub.name,
                outcome,
            });
        }

        let report = SyncReport {
            completed_at: Utc::now(),
            subscriptions: reports,
        };
        tracing::info!(
            total = report.subscriptions.len(),
            failed = report.failed_count(),
            "sync pass finished"
        );
        Ok(report)
    }

    /// Syncs a single subscription on demand.
    pub async fn sync_one(&self, id: i64, cancel: &CancelFlag) -> Result<SubscriptionReport, SyncError> {
        let sub = self
            .db
            .subscriptions
            .get(id)
            .await?
            .ok_or(SyncError::SubscriptionNotFound(id))?;

        let outcome = self.sync_locked(&sub, cancel).await;
        Ok(SubscriptionReport {
            id: sub.id,
            name: sub.name,
            outcome,
        })
    }

    /// Serializes writers per subscription, then runs the sync and records
    /// the result on the subscription row.
    async fn sync_locked(&self, sub: &Subscription, cancel: &CancelFlag) -> PassOutcome {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(sub.id).or_default().clone()
        };
        let _guard = lock.lock().await;

        match self.sync_subscription(sub, cancel).await {
            Ok(outcome) => {
                if let Err(e) = self.db.subscriptions.set_last_sync(sub.id, Utc::now()).await {
                    tracing::warn!(subscription = sub.id, err = %e, "failed to record last sync");
                }
                PassOutcome::Synced { outcome }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(subscription = sub.id, err = %reason, "subscription sync failed");
                if let Err(e) = self.db.subscriptions.set_error(sub.id, &reason).await {
                    tracing::warn!(subscription = sub.id, err = %e, "failed to record sync error");
                }
                PassOutcome::Failed { reason }
            }
        }
    }

    #[tracing::instrument(skip_all, fields(subscription = sub.id, uri = %sub.uri))]
    async fn sync_subscription(
        &self,
        sub: &Subscription,
        cancel: &CancelFlag,
    ) -> Result<ReconcileOutcome, SyncError> {
        let fetched = self.fetch_with_retry(sub).await?;
        let remote = feed::parse_feed(&fetched.body)?;

        let handle = self.ensure_calendar(sub).await?;
        let mut target = sub.clone();
        target.calendar_handle = Some(handle);

        let outcome = self.reconciler.reconcile(&target, &remote, cancel).await?;

        if let Some(etag) = &fetched.etag {
            self.db.subscriptions.set_etag(sub.id, etag).await?;
        }
        Ok(outcome)
    }

    /// Fetches the feed, retrying once within the pass when the first
    /// attempt times out.
    async fn fetch_with_retry(&self, sub: &Subscription) -> Result<crate::fetch::Fetched, SyncError> {
        let credentials = sub.credentials();
        let attempt = self
            .fetcher
            .fetch(&sub.uri, credentials.as_ref(), sub.user_agent.as_deref())
            .await;

        match attempt {
            Err(FetchError::Timeout(_)) => {
                tracing::debug!(subscription = sub.id, "fetch timed out, retrying once");
                Ok(self
                    .fetcher
                    .fetch(&sub.uri, credentials.as_ref(), sub.user_agent.as_deref())
                    .await?)
            }
            other => Ok(other?),
        }
    }

    /// Returns the subscription's target calendar handle, creating the
    /// calendar on the first successful sync. The handle is assigned exactly
    /// once; a concurrently assigned handle wins and the extra calendar is
    /// discarded.
    async fn ensure_calendar(&self, sub: &Subscription) -> Result<CalendarHandle, SyncError> {
        if let Some(handle) = &sub.calendar_handle {
            return Ok(handle.clone());
        }

        let handle = self.store.create_calendar(&sub.display_properties()).await?;
        if self
            .db
            .subscriptions
            .assign_calendar_handle(sub.id, &handle)
            .await?
        {
            tracing::info!(subscription = sub.id, calendar = %handle, "created target calendar");
            return Ok(handle);
        }

        self.store.delete_calendar(&handle).await?;
        let current = self
            .db
            .subscriptions
            .get(sub.id)
            .await?
            .ok_or(SyncError::SubscriptionNotFound(sub.id))?;
        current.calendar_handle.ok_or(SyncError::MissingCalendarHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_is_sticky() {
        let flag = CancelFlag::new();
        assert!(!flag.is_set());
        flag.set();
        flag.set();
        assert!(flag.is_set());
    }

    #[test]
    fn report_serializes_with_status_tag() {
        let report = SubscriptionReport {
            id: 7,
            name: "Team".into(),
            outcome: PassOutcome::Failed {
                reason: "timeout".into(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");
    }
}

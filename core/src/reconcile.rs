// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The reconciliation engine: computes and applies the minimal set of
//! create/update/delete operations bringing a target calendar in line with
//! the fetched feed.
//!
//! Writes are at-least-once, not all-or-nothing: a failure on one event
//! never rolls back earlier writes in the same pass. A field that
//! self-heals on the next periodic pass beats a global rollback here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::{IndexInsert, IndexUpdate, IndexedEvent, LocalDb};
use crate::error::{StoreError, SyncError};
use crate::remote::RemoteEvent;
use crate::store::{CalendarHandle, CalendarStore};
use crate::subscription::{Subscription, SyncStrategy};
use crate::sync::CancelFlag;

/// Counts and per-event failures from one reconcile.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ReconcileOutcome {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failures: Vec<EventFailure>,
}

impl ReconcileOutcome {
    /// True when the reconcile performed no store writes.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.deleted == 0
    }

    fn record_failure(&mut self, uid: &str, reason: impl Into<String>) {
        self.skipped += 1;
        self.failures.push(EventFailure {
            uid: uid.to_string(),
            reason: reason.into(),
        });
    }
}

/// One event that could not be applied.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EventFailure {
    pub uid: String,
    pub reason: String,
}

const MISSING_INSTANTS: &str = "missing start or end";

/// Applies a subscription's fetched feed to the target store and the local
/// event index, under the subscription's strategy.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn CalendarStore>,
    db: LocalDb,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CalendarStore>, db: LocalDb) -> Self {
        Self { store, db }
    }

    /// Reconciles `remote` into the subscription's target calendar.
    ///
    /// Per-event failures are captured in the outcome; only unrecoverable
    /// input errors (missing calendar handle, index failure, store-level
    /// failure) abort the subscription's pass.
    #[tracing::instrument(skip_all, fields(subscription = subscription.id, strategy = %subscription.strategy))]
    pub async fn reconcile(
        &self,
        subscription: &Subscription,
        remote: &[RemoteEvent],
        cancel: &CancelFlag,
    ) -> Result<ReconcileOutcome, SyncError> {
        let calendar = subscription
            .calendar_handle
            .clone()
            .ok_or(SyncError::MissingCalendarHandle)?;

        let outcome = match subscription.strategy {
            SyncStrategy::Replace => self.replace(subscription, &calendar, remote, cancel).await?,
            SyncStrategy::Merge => self.merge(subscription, &calendar, remote, cancel).await?,
        };

        tracing::debug!(
            added = outcome.added,
            updated = outcome.updated,
            deleted = outcome.deleted,
            skipped = outcome.skipped,
            "reconcile finished"
        );
        Ok(outcome)
    }

    /// Replace strategy: purge everything, re-insert the whole feed.
    async fn replace(
        &self,
        subscription: &Subscription,
        calendar: &CalendarHandle,
        remote: &[RemoteEvent],
        cancel: &CancelFlag,
    ) -> Result<ReconcileOutcome, SyncError> {
        let mut outcome = ReconcileOutcome::default();

        self.store.delete_all_events(calendar).await?;
        outcome.deleted = self.db.events.clear_subscription(subscription.id).await? as usize;

        let now = Utc::now();
        let mut seen: HashSet<&str> = HashSet::with_capacity(remote.len());
        let mut insertions = Vec::new();
        for event in remote {
            if cancel.is_set() {
                break;
            }
            // Recurrence overrides share their parent's uid; only the first
            // occurrence is materialized, matching the one index row per uid.
            if !seen.insert(event.uid.as_str()) {
                continue;
            }
            self.insert_event(subscription, calendar, event, now, &mut outcome, &mut insertions)
                .await;
        }

        self.db
            .events
            .apply(subscription.id, &insertions, &[], &[], now)
            .await?;
        Ok(outcome)
    }

    /// Merge strategy: three-way classification against a snapshot of the
    /// index taken at entry.
    async fn merge(
        &self,
        subscription: &Subscription,
        calendar: &CalendarHandle,
        remote: &[RemoteEvent],
        cancel: &CancelFlag,
    ) -> Result<ReconcileOutcome, SyncError> {
        let indexed = self.db.events.for_subscription(subscription.id).await?;
        let by_uid: HashMap<&str, &IndexedEvent> =
            indexed.iter().map(|e| (e.uid.as_str(), e)).collect();

        let mut outcome = ReconcileOutcome::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(remote.len());
        let mut insertions = Vec::new();
        let mut updates = Vec::new();
        let mut deletions = Vec::new();

        let now = Utc::now();
        let mut cancelled = false;
        for event in remote {
            if cancel.is_set() {
                cancelled = true;
                break;
            }
            // Recurrence overrides share their parent's uid; only the first
            // occurrence drives classification, so a duplicate can never
            // leave a store event the index does not track.
            if !seen.insert(event.uid.as_str()) {
                continue;
            }

            match by_uid.get(event.uid.as_str()) {
                None => {
                    self.insert_event(subscription, calendar, event, now, &mut outcome, &mut insertions)
                        .await;
                }
                Some(entry) => {
                    // Strictly-later stamps only; an equal or missing stamp
                    // never triggers an update.
                    let Some(stamp) = event.stamp else { continue };
                    if stamp <= entry.updated_at {
                        continue;
                    }
                    self.update_event(subscription, entry, event, stamp, &mut outcome, &mut updates)
                        .await;
                }
            }
        }

        // Deletions require having seen the whole feed; a cancelled pass
        // must not treat unprocessed events as vanished.
        if !cancelled {
            for entry in &indexed {
                if cancel.is_set() {
                    break;
                }
                if seen.contains(entry.uid.as_str()) {
                    continue;
                }
                match self.store.delete_event(&entry.event_handle).await {
                    Ok(()) => {
                        outcome.deleted += 1;
                        deletions.push(entry.uid.clone());
                    }
                    // Already gone from the store (edited by another app):
                    // reconciled, just drop the index entry.
                    Err(StoreError::NotFound(_)) => {
                        outcome.deleted += 1;
                        deletions.push(entry.uid.clone());
                    }
                    Err(e) => {
                        tracing::warn!(uid = %entry.uid, err = %e, "failed to delete event");
                        outcome.record_failure(&entry.uid, e.to_string());
                    }
                }
            }
        }

        self.db
            .events
            .apply(subscription.id, &insertions, &updates, &deletions, now)
            .await?;
        Ok(outcome)
    }

    async fn insert_event(
        &self,
        subscription: &Subscription,
        calendar: &CalendarHandle,
        event: &RemoteEvent,
        now: DateTime<Utc>,
        outcome: &mut ReconcileOutcome,
        insertions: &mut Vec<IndexInsert>,
    ) {
        let Some(fields) = event.to_event_fields(subscription.reminder_minutes) else {
            outcome.record_failure(&event.uid, MISSING_INSTANTS);
            return;
        };

        match self.store.insert_event(calendar, &fields).await {
            Ok(handle) => {
                outcome.added += 1;
                insertions.push(IndexInsert {
                    uid: event.uid.clone(),
                    event_handle: handle,
                    stamp: event.stamp.unwrap_or(now),
                });
            }
            Err(e) => {
                tracing::warn!(uid = %event.uid, err = %e, "failed to insert event");
                outcome.record_failure(&event.uid, e.to_string());
            }
        }
    }

    async fn update_event(
        &self,
        subscription: &Subscription,
        entry: &IndexedEvent,
        event: &RemoteEvent,
        stamp: DateTime<Utc>,
        outcome: &mut ReconcileOutcome,
        updates: &mut Vec<IndexUpdate>,
    ) {
        let Some(fields) = event.to_event_fields(subscription.reminder_minutes) else {
            outcome.record_failure(&event.uid, MISSING_INSTANTS);
            return;
        };

        match self.store.update_event(&entry.event_handle, &fields).await {
            Ok(()) => {
                outcome.updated += 1;
                updates.push(IndexUpdate {
                    uid: event.uid.clone(),
                    stamp,
                });
            }
            Err(e) => {
                tracing::warn!(uid = %event.uid, err = %e, "failed to update event");
                outcome.record_failure(&event.uid, e.to_string());
            }
        }
    }
}

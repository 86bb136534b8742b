// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the sync orchestrator.

mod common;

use std::sync::Arc;

use icsync_core::{
    CancelFlag, LocalDb, PassOutcome, SubscriptionDraft, SyncError, Syncer,
};

use common::{MemoryStore, Script, ScriptedFetcher, ics_feed};

const STAMP: &str = "20260301T080000Z";

fn setup_parts() -> (Arc<MemoryStore>, Arc<ScriptedFetcher>) {
    (Arc::new(MemoryStore::new()), Arc::new(ScriptedFetcher::new()))
}

async fn setup() -> (LocalDb, Arc<MemoryStore>, Arc<ScriptedFetcher>, Syncer) {
    let db = LocalDb::open(None).await.unwrap();
    let (store, fetcher) = setup_parts();
    let syncer = Syncer::new(db.clone(), store.clone(), fetcher.clone());
    (db, store, fetcher, syncer)
}

#[tokio::test]
async fn first_sync_creates_calendar_and_assigns_handle_once() {
    let (db, store, fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();
    assert!(sub.calendar_handle.is_none());

    fetcher.script(
        "https://example.com/team.ics",
        vec![
            Script::Body(ics_feed(&[("a", STAMP)])),
            Script::Body(ics_feed(&[("a", STAMP)])),
        ],
    );

    let report = syncer.run_pass(&CancelFlag::new()).await.unwrap();
    assert_eq!(report.failed_count(), 0);
    assert_eq!(store.calendar_count(), 1);

    let synced = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    let handle = synced.calendar_handle.clone().unwrap();
    assert!(synced.last_sync.is_some());

    // A second pass reuses the same calendar.
    syncer.run_pass(&CancelFlag::new()).await.unwrap();
    let again = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    assert_eq!(again.calendar_handle, Some(handle));
    assert_eq!(store.calendar_count(), 1);
}

#[tokio::test]
async fn one_failing_subscription_does_not_affect_the_others() {
    let (db, store, fetcher, syncer) = setup().await;
    let bad = syncer
        .import(&SubscriptionDraft::new("Bad", "https://example.com/bad.ics"))
        .await
        .unwrap();
    let good = syncer
        .import(&SubscriptionDraft::new("Good", "https://example.com/good.ics"))
        .await
        .unwrap();

    // Both attempts for the bad feed time out; the retry is spent.
    fetcher.script(
        "https://example.com/bad.ics",
        vec![Script::Timeout, Script::Timeout],
    );
    fetcher.script(
        "https://example.com/good.ics",
        vec![Script::Body(ics_feed(&[("a", STAMP), ("b", STAMP)]))],
    );

    let report = syncer.run_pass(&CancelFlag::new()).await.unwrap();
    assert_eq!(report.subscriptions.len(), 2);
    assert_eq!(report.failed_count(), 1);
    assert!(report.subscriptions[0].outcome.is_failed());
    assert!(!report.subscriptions[1].outcome.is_failed());

    let bad = db.subscriptions.get(bad.id).await.unwrap().unwrap();
    assert!(bad.error_message.is_some());
    assert!(bad.last_sync.is_none());

    let good = db.subscriptions.get(good.id).await.unwrap().unwrap();
    assert!(good.error_message.is_none());
    let calendar = good.calendar_handle.unwrap();
    assert_eq!(store.sorted_event_titles(&calendar).len(), 2);
}

#[tokio::test]
async fn fetch_timeout_is_retried_once_within_the_pass() {
    let (_db, _store, fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();

    fetcher.script(
        "https://example.com/team.ics",
        vec![Script::Timeout, Script::Body(ics_feed(&[("a", STAMP)]))],
    );

    let report = syncer.sync_one(sub.id, &CancelFlag::new()).await.unwrap();
    assert!(matches!(report.outcome, PassOutcome::Synced { .. }));
    assert_eq!(fetcher.calls("https://example.com/team.ics"), 2);
}

#[tokio::test]
async fn malformed_feed_fails_that_subscription() {
    let (db, _store, fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();

    fetcher.script(
        "https://example.com/team.ics",
        vec![Script::Body("not a calendar".into())],
    );

    let report = syncer.sync_one(sub.id, &CancelFlag::new()).await.unwrap();
    let PassOutcome::Failed { reason } = report.outcome else {
        panic!("expected failure");
    };
    assert!(reason.contains("malformed"), "unexpected reason: {reason}");

    let stored = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    assert_eq!(stored.error_message, Some(reason));
}

#[tokio::test]
async fn successful_sync_records_etag() {
    let (db, _store, fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();

    fetcher.script(
        "https://example.com/team.ics",
        vec![Script::BodyWithEtag(ics_feed(&[("a", STAMP)]), "\"v1\"".into())],
    );

    syncer.sync_one(sub.id, &CancelFlag::new()).await.unwrap();
    let stored = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    assert_eq!(stored.etag.as_deref(), Some("\"v1\""));
}

#[tokio::test]
async fn update_subscription_pushes_display_properties() {
    let (db, store, fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();
    fetcher.script(
        "https://example.com/team.ics",
        vec![Script::Body(ics_feed(&[("a", STAMP)]))],
    );
    syncer.sync_one(sub.id, &CancelFlag::new()).await.unwrap();

    let mut edited = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    edited.name = "Renamed".into();
    edited.color = 0xFF0000;
    syncer.update_subscription(&edited).await.unwrap();

    let stored = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.color, 0xFF0000);

    // The target calendar reflects the edit immediately.
    let calendar = stored.calendar_handle.unwrap();
    let properties = store.calendar_properties(&calendar).unwrap();
    assert_eq!(properties.name, "Renamed");
    assert_eq!(properties.color, 0xFF0000);
}

#[tokio::test]
async fn update_subscription_before_first_sync_touches_no_store() {
    let (db, store, _fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();

    let mut edited = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    edited.name = "Renamed".into();
    syncer.update_subscription(&edited).await.unwrap();

    // No calendar exists yet; only the subscription row changes.
    assert_eq!(store.calendar_count(), 0);
    let stored = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Renamed");
}

#[tokio::test]
async fn sync_one_rejects_unknown_subscription() {
    let (_db, _store, _fetcher, syncer) = setup().await;
    let result = syncer.sync_one(999, &CancelFlag::new()).await;
    assert!(matches!(result, Err(SyncError::SubscriptionNotFound(999))));
}

#[tokio::test]
async fn import_rejects_empty_uri() {
    let (_db, _store, _fetcher, syncer) = setup().await;
    let result = syncer.import(&SubscriptionDraft::new("Team", "  ")).await;
    assert!(matches!(result, Err(SyncError::EmptyUri)));
}

#[tokio::test]
async fn remove_deletes_calendar_and_index_rows() {
    let (db, store, fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();
    fetcher.script(
        "https://example.com/team.ics",
        vec![Script::Body(ics_feed(&[("a", STAMP)]))],
    );
    syncer.sync_one(sub.id, &CancelFlag::new()).await.unwrap();
    assert_eq!(store.calendar_count(), 1);

    syncer.remove(sub.id).await.unwrap();

    assert_eq!(store.calendar_count(), 0);
    assert!(db.subscriptions.get(sub.id).await.unwrap().is_none());
    assert!(db.events.for_subscription(sub.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_pass_marks_remaining_subscriptions_failed() {
    let (db, _store, _fetcher, syncer) = setup().await;
    let sub = syncer
        .import(&SubscriptionDraft::new("Team", "https://example.com/team.ics"))
        .await
        .unwrap();

    let cancel = CancelFlag::new();
    cancel.set();
    let report = syncer.run_pass(&cancel).await.unwrap();

    assert_eq!(report.failed_count(), 1);
    // Nothing was attempted, so no error is recorded on the row.
    let stored = db.subscriptions.get(sub.id).await.unwrap().unwrap();
    assert!(stored.error_message.is_none());
}

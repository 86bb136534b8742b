// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{format_ts, parse_ts};
use crate::store::EventHandle;

/// Durable link between a remote event and its materialized counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEvent {
    pub subscription_id: i64,
    pub uid: String,
    pub event_handle: EventHandle,
    pub created_at: DateTime<Utc>,
    /// The remote event's stamp at the time of the last applied write.
    pub updated_at: DateTime<Utc>,
}

/// New index entry for an inserted event.
#[derive(Debug, Clone)]
pub struct IndexInsert {
    pub uid: String,
    pub event_handle: EventHandle,
    pub stamp: DateTime<Utc>,
}

/// Stamp refresh for an updated event.
#[derive(Debug, Clone)]
pub struct IndexUpdate {
    pub uid: String,
    pub stamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IndexedEvents {
    pool: SqlitePool,
}

impl IndexedEvents {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All indexed events for a subscription. No ordering guarantee.
    pub async fn for_subscription(
        &self,
        subscription_id: i64,
    ) -> Result<Vec<IndexedEvent>, sqlx::Error> {
        const SQL: &str = "\
SELECT subscription_id, uid, event_handle, created_at, updated_at
FROM indexed_events
WHERE subscription_id = ?;
";

        let rows: Vec<IndexedEventRow> = sqlx::query_as(SQL)
            .bind(subscription_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(IndexedEventRow::into_event).collect()
    }

    /// Applies one reconcile's worth of index mutations in a single
    /// transaction. A duplicate uid insert is treated as an update, matching
    /// merge semantics.
    pub async fn apply(
        &self,
        subscription_id: i64,
        insertions: &[IndexInsert],
        updates: &[IndexUpdate],
        deletions: &[String],
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        const INSERT: &str = "\
INSERT INTO indexed_events (subscription_id, uid, event_handle, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT(subscription_id, uid) DO UPDATE SET
    event_handle = excluded.event_handle,
    updated_at   = excluded.updated_at;
";
        const UPDATE: &str = "\
UPDATE indexed_events SET updated_at = ? WHERE subscription_id = ? AND uid = ?;
";
        const DELETE: &str = "\
DELETE FROM indexed_events WHERE subscription_id = ? AND uid = ?;
";

        let mut tx = self.pool.begin().await?;

        for insert in insertions {
            sqlx::query(INSERT)
                .bind(subscription_id)
                .bind(&insert.uid)
                .bind(insert.event_handle.as_str())
                .bind(format_ts(&now))
                .bind(format_ts(&insert.stamp))
                .execute(&mut *tx)
                .await?;
        }
        for update in updates {
            sqlx::query(UPDATE)
                .bind(format_ts(&update.stamp))
                .bind(subscription_id)
                .bind(&update.uid)
                .execute(&mut *tx)
                .await?;
        }
        for uid in deletions {
            sqlx::query(DELETE)
                .bind(subscription_id)
                .bind(uid)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }

    /// Drops every index entry for a subscription. Returns the number of
    /// removed entries.
    pub async fn clear_subscription(&self, subscription_id: i64) -> Result<u64, sqlx::Error> {
        const SQL: &str = "DELETE FROM indexed_events WHERE subscription_id = ?;";

        let result = sqlx::query(SQL)
            .bind(subscription_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IndexedEventRow {
    subscription_id: i64,
    uid: String,
    event_handle: String,
    created_at: String,
    updated_at: String,
}

impl IndexedEventRow {
    fn into_event(self) -> Result<IndexedEvent, sqlx::Error> {
        Ok(IndexedEvent {
            subscription_id: self.subscription_id,
            uid: self.uid,
            event_handle: EventHandle::new(self.event_handle),
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::LocalDb;
    use crate::subscription::SubscriptionDraft;

    async fn setup() -> (LocalDb, i64) {
        let db = LocalDb::open(None).await.expect("failed to open test database");
        let draft = SubscriptionDraft::new("Team", "https://example.com/team.ics");
        let sub = db.subscriptions.insert(&draft, Utc::now()).await.unwrap();
        (db, sub.id)
    }

    fn insert(uid: &str, handle: &str, stamp: DateTime<Utc>) -> IndexInsert {
        IndexInsert {
            uid: uid.to_string(),
            event_handle: EventHandle::new(handle),
            stamp,
        }
    }

    #[tokio::test]
    async fn indexed_events_apply_inserts_and_deletes() {
        let (db, sub) = setup().await;
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

        db.events
            .apply(sub, &[insert("a", "cal/a", t1), insert("b", "cal/b", t1)], &[], &[], t1)
            .await
            .unwrap();
        assert_eq!(db.events.for_subscription(sub).await.unwrap().len(), 2);

        db.events
            .apply(sub, &[], &[], &["a".to_string()], t1)
            .await
            .unwrap();
        let remaining = db.events.for_subscription(sub).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].uid, "b");
    }

    #[tokio::test]
    async fn indexed_events_duplicate_insert_behaves_as_update() {
        let (db, sub) = setup().await;
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        db.events.apply(sub, &[insert("a", "cal/a", t1)], &[], &[], t1).await.unwrap();
        db.events.apply(sub, &[insert("a", "cal/a2", t2)], &[], &[], t2).await.unwrap();

        let rows = db.events.for_subscription(sub).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_handle.as_str(), "cal/a2");
        assert_eq!(rows[0].updated_at, t2);
    }

    #[tokio::test]
    async fn indexed_events_update_refreshes_stamp() {
        let (db, sub) = setup().await;
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap();

        db.events.apply(sub, &[insert("a", "cal/a", t1)], &[], &[], t1).await.unwrap();
        db.events
            .apply(
                sub,
                &[],
                &[IndexUpdate { uid: "a".into(), stamp: t2 }],
                &[],
                t2,
            )
            .await
            .unwrap();

        let rows = db.events.for_subscription(sub).await.unwrap();
        assert_eq!(rows[0].updated_at, t2);
        assert_eq!(rows[0].created_at, t1);
    }

    #[tokio::test]
    async fn indexed_events_cascade_on_subscription_delete() {
        let (db, sub) = setup().await;
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        db.events.apply(sub, &[insert("a", "cal/a", t1)], &[], &[], t1).await.unwrap();

        db.subscriptions.delete(sub).await.unwrap();

        assert!(db.events.for_subscription(sub).await.unwrap().is_empty());
    }
}

// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{format_ts, parse_ts};
use crate::store::CalendarHandle;
use crate::subscription::{Subscription, SubscriptionDraft, SyncStrategy};

const COLUMNS: &str = "\
id, calendar_handle, name, uri, etag, strategy, color, reminder_minutes,
error_message, last_modified, last_sync, user_agent, username, password";

#[derive(Debug, Clone)]
pub struct Subscriptions {
    pool: SqlitePool,
}

impl Subscriptions {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        draft: &SubscriptionDraft,
        now: DateTime<Utc>,
    ) -> Result<Subscription, sqlx::Error> {
        const SQL: &str = "\
INSERT INTO subscriptions
    (name, uri, strategy, color, reminder_minutes, user_agent, username, password, last_modified)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
";

        let result = sqlx::query(SQL)
            .bind(&draft.name)
            .bind(&draft.uri)
            .bind(draft.strategy.as_str())
            .bind(i64::from(draft.color))
            .bind(draft.reminder_minutes.map(i64::from))
            .bind(&draft.user_agent)
            .bind(&draft.username)
            .bind(&draft.password)
            .bind(format_ts(&now))
            .execute(&self.pool)
            .await?;

        Ok(Subscription {
            id: result.last_insert_rowid(),
            calendar_handle: None,
            name: draft.name.clone(),
            uri: draft.uri.clone(),
            etag: None,
            strategy: draft.strategy,
            color: draft.color,
            reminder_minutes: draft.reminder_minutes,
            error_message: None,
            last_modified: now,
            last_sync: None,
            user_agent: draft.user_agent.clone(),
            username: draft.username.clone(),
            password: draft.password.clone(),
        })
    }

    pub async fn list(&self) -> Result<Vec<Subscription>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM subscriptions ORDER BY id;");
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(SubscriptionRow::into_subscription).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<Subscription>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?;");
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(SubscriptionRow::into_subscription).transpose()
    }

    /// Assigns the target-store calendar handle. The handle is assigned at
    /// most once; returns `false` when one was already set.
    pub async fn assign_calendar_handle(
        &self,
        id: i64,
        handle: &CalendarHandle,
    ) -> Result<bool, sqlx::Error> {
        const SQL: &str = "\
UPDATE subscriptions SET calendar_handle = ?
WHERE id = ? AND calendar_handle IS NULL;
";

        let result = sqlx::query(SQL)
            .bind(handle.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Persists an edit of the user-facing settings and bumps last_modified.
    pub async fn update(&self, sub: &Subscription, now: DateTime<Utc>) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
UPDATE subscriptions SET
    name             = ?,
    uri              = ?,
    strategy         = ?,
    color            = ?,
    reminder_minutes = ?,
    user_agent       = ?,
    username         = ?,
    password         = ?,
    last_modified    = ?
WHERE id = ?;
";

        sqlx::query(SQL)
            .bind(&sub.name)
            .bind(&sub.uri)
            .bind(sub.strategy.as_str())
            .bind(i64::from(sub.color))
            .bind(sub.reminder_minutes.map(i64::from))
            .bind(&sub.user_agent)
            .bind(&sub.username)
            .bind(&sub.password)
            .bind(format_ts(&now))
            .bind(sub.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a successful pass: refreshes last_sync and clears any stale
    /// error message.
    pub async fn set_last_sync(&self, id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        const SQL: &str =
            "UPDATE subscriptions SET last_sync = ?, error_message = NULL WHERE id = ?;";

        sqlx::query(SQL)
            .bind(format_ts(&at))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_error(&self, id: i64, message: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE subscriptions SET error_message = ? WHERE id = ?;";

        sqlx::query(SQL)
            .bind(message)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_etag(&self, id: i64, etag: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE subscriptions SET etag = ? WHERE id = ?;";

        sqlx::query(SQL)
            .bind(etag)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes the subscription; indexed events cascade.
    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM subscriptions WHERE id = ?;")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    calendar_handle: Option<String>,
    name: String,
    uri: String,
    etag: Option<String>,
    strategy: String,
    color: i64,
    reminder_minutes: Option<i64>,
    error_message: Option<String>,
    last_modified: String,
    last_sync: Option<String>,
    user_agent: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl SubscriptionRow {
    fn into_subscription(self) -> Result<Subscription, sqlx::Error> {
        let strategy: SyncStrategy = self
            .strategy
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

        Ok(Subscription {
            id: self.id,
            calendar_handle: self.calendar_handle.map(CalendarHandle::new),
            name: self.name,
            uri: self.uri,
            etag: self.etag,
            strategy,
            color: self.color as u32,
            reminder_minutes: self.reminder_minutes.map(|m| m as u32),
            error_message: self.error_message,
            last_modified: parse_ts(&self.last_modified)?,
            last_sync: self.last_sync.as_deref().map(parse_ts).transpose()?,
            user_agent: self.user_agent,
            username: self.username,
            password: self.password,
        })
    }
}

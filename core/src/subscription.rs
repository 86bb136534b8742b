// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::fetch::Credentials;
use crate::store::{CalendarHandle, CalendarProperties};

/// Default display color for imported calendars (material blue).
pub const DEFAULT_COLOR: u32 = 0x2196F3;

/// How a subscription's feed is reconciled into the target store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Diff the feed against the local event index and apply only changes.
    #[default]
    Merge,
    /// Drop every stored event and re-insert the whole feed.
    Replace,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            other => Err(format!("unknown sync strategy: {other}")),
        }
    }
}

/// A user-configured calendar feed.
///
/// The calendar handle is absent until the first successful sync creates the
/// target-store calendar; once assigned it never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub calendar_handle: Option<CalendarHandle>,
    pub name: String,
    /// Feed location: an HTTP(S) endpoint or a local file reference.
    pub uri: String,
    /// Entity tag of the last successfully applied fetch, when the server
    /// provides one. Informational; merge updates are gated per event.
    pub etag: Option<String>,
    pub strategy: SyncStrategy,
    pub color: u32,
    pub reminder_minutes: Option<u32>,
    pub error_message: Option<String>,
    /// When the subscription itself was last edited.
    pub last_modified: DateTime<Utc>,
    pub last_sync: Option<DateTime<Utc>>,
    pub user_agent: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Subscription {
    /// Display properties pushed to the target calendar store.
    pub fn display_properties(&self) -> CalendarProperties {
        CalendarProperties {
            name: self.name.clone(),
            color: self.color,
        }
    }

    /// Credentials for fetching, when both parts are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                secret: password.clone(),
            }),
            _ => None,
        }
    }
}

/// Fields for importing a new subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionDraft {
    pub name: String,
    pub uri: String,
    pub strategy: SyncStrategy,
    pub color: u32,
    pub reminder_minutes: Option<u32>,
    pub user_agent: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SubscriptionDraft {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            strategy: SyncStrategy::default(),
            color: DEFAULT_COLOR,
            reminder_minutes: None,
            user_agent: None,
            username: None,
            password: None,
        }
    }
}

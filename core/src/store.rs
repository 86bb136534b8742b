// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Target calendar store capability interface.
//!
//! The store is an external, failure-prone system keyed by opaque handles it
//! assigns. Other processes may edit it concurrently; the engine treats it
//! as eventually-reconciled rather than exclusively owned.

mod dir;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

pub use dir::DirectoryStore;

/// Opaque handle of a calendar in the target store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CalendarHandle(String);

impl CalendarHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CalendarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle of an event in the target store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EventHandle(String);

impl EventHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display properties of a materialized calendar.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalendarProperties {
    pub name: String,
    pub color: u32,
}

/// Writable field set of a materialized event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub all_day: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub reminder_minutes: Option<u32>,
}

/// One event as reported back by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub handle: EventHandle,
    pub title: String,
    pub all_day: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
}

/// Narrow interface over the native calendar storage.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn create_calendar(
        &self,
        properties: &CalendarProperties,
    ) -> Result<CalendarHandle, StoreError>;

    async fn update_calendar(
        &self,
        calendar: &CalendarHandle,
        properties: &CalendarProperties,
    ) -> Result<(), StoreError>;

    async fn delete_calendar(&self, calendar: &CalendarHandle) -> Result<(), StoreError>;

    async fn insert_event(
        &self,
        calendar: &CalendarHandle,
        fields: &EventFields,
    ) -> Result<EventHandle, StoreError>;

    async fn update_event(
        &self,
        event: &EventHandle,
        fields: &EventFields,
    ) -> Result<(), StoreError>;

    async fn delete_event(&self, event: &EventHandle) -> Result<(), StoreError>;

    async fn delete_all_events(&self, calendar: &CalendarHandle) -> Result<(), StoreError>;

    async fn list_events(&self, calendar: &CalendarHandle) -> Result<Vec<StoredEvent>, StoreError>;
}

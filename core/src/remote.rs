// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};

use crate::store::EventFields;

/// One parsed entry from a fetched feed. Transient; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    /// Stable identifier, unique per subscription feed.
    pub uid: String,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub timezone: Option<String>,
    /// DTSTAMP of the entry, used for merge change detection.
    pub stamp: Option<DateTime<Utc>>,
}

impl RemoteEvent {
    /// Both instants, or `None` when either is missing. Events without a
    /// start or end cannot be materialized and are skipped by the engine.
    pub fn instants(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.start.zip(self.end)
    }

    /// The writable field set for the target store, or `None` when a
    /// required instant is missing.
    pub fn to_event_fields(&self, reminder_minutes: Option<u32>) -> Option<EventFields> {
        let (start, end) = self.instants()?;
        let timezone = if self.all_day {
            // All-day events are date-valued and pinned to UTC.
            "UTC".to_string()
        } else {
            self.timezone.clone().unwrap_or_else(|| "UTC".to_string())
        };

        Some(EventFields {
            title: self
                .summary
                .clone()
                .unwrap_or_else(|| "Untitled event".to_string()),
            location: self.location.clone(),
            description: self.description.clone(),
            all_day: self.all_day,
            start,
            end,
            timezone,
            reminder_minutes,
        })
    }
}

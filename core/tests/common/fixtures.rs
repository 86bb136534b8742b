// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use icsync_core::{CalendarStore, LocalDb, RemoteEvent, Subscription, SubscriptionDraft};

use super::MemoryStore;

/// A fixed instant in March 2026, offset by day and hour.
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

/// A one-hour remote event on 2026-03-01 with the given uid and stamp.
pub fn remote_event(uid: &str, stamp: Option<DateTime<Utc>>) -> RemoteEvent {
    RemoteEvent {
        uid: uid.to_string(),
        summary: Some(format!("Event {uid}")),
        location: None,
        description: None,
        start: Some(at(1, 10)),
        end: Some(at(1, 11)),
        all_day: false,
        timezone: None,
        stamp,
    }
}

/// Renders a feed of one-hour events as ICS text. Each entry is a
/// (uid, dtstamp) pair with the dtstamp in basic UTC format.
pub fn ics_feed(events: &[(&str, &str)]) -> String {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n");
    for (uid, stamp) in events {
        out.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{uid}\r\nDTSTAMP:{stamp}\r\nSUMMARY:Event {uid}\r\n\
             DTSTART:20260301T100000Z\r\nDTEND:20260301T110000Z\r\nEND:VEVENT\r\n"
        ));
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

/// Inserts a subscription and assigns it a freshly created calendar, as a
/// completed first sync would have.
pub async fn synced_subscription(
    db: &LocalDb,
    store: &Arc<MemoryStore>,
    name: &str,
) -> Subscription {
    let draft = SubscriptionDraft::new(name, format!("https://example.com/{name}.ics"));
    let sub = db.subscriptions.insert(&draft, Utc::now()).await.unwrap();
    let handle = store.create_calendar(&sub.display_properties()).await.unwrap();
    assert!(
        db.subscriptions
            .assign_calendar_handle(sub.id, &handle)
            .await
            .unwrap()
    );
    db.subscriptions.get(sub.id).await.unwrap().unwrap()
}

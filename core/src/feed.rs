// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Adapter from the `icalendar` wire parser to [`RemoteEvent`]s.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike};

use crate::error::ParseError;
use crate::remote::RemoteEvent;

/// Parse a fetched feed body into the sequence of remote events.
///
/// Non-VEVENT components are ignored. A VEVENT without a UID cannot be
/// reconciled and is dropped with a warning.
pub fn parse_feed(input: &str) -> Result<Vec<RemoteEvent>, ParseError> {
    // The wire parser accepts arbitrary text as an empty calendar. An HTML
    // error page must fail the pass instead of emptying the target calendar,
    // so anything without a VCALENDAR wrapper is malformed.
    if !input.contains("BEGIN:VCALENDAR") {
        return Err(ParseError::Malformed(
            "input has no VCALENDAR component".to_string(),
        ));
    }
    let calendar: Calendar = input.parse().map_err(ParseError::Malformed)?;

    let mut events = Vec::new();
    for component in &calendar.components {
        if let CalendarComponent::Event(vevent) = component {
            match remote_event(vevent) {
                Some(event) => events.push(event),
                None => tracing::warn!("dropping VEVENT without UID"),
            }
        }
    }

    Ok(events)
}

fn remote_event(vevent: &icalendar::Event) -> Option<RemoteEvent> {
    let uid = vevent.get_uid()?.to_string();

    let (start, start_all_day, timezone) = resolve(vevent.get_start());
    let (end, _, _) = resolve(vevent.get_end());

    Some(RemoteEvent {
        uid,
        summary: vevent.get_summary().map(str::to_string),
        location: vevent.get_location().map(str::to_string),
        description: vevent.get_description().map(str::to_string),
        start,
        end,
        all_day: start_all_day,
        timezone,
        stamp: vevent.get_timestamp(),
    })
}

/// Resolve a DTSTART/DTEND value to a UTC instant, an all-day flag, and the
/// original timezone id when one was present.
pub(crate) fn resolve(
    value: Option<DatePerhapsTime>,
) -> (Option<DateTime<Utc>>, bool, Option<String>) {
    match value {
        None => (None, false, None),
        // DATE-valued: an all-day boundary at UTC midnight.
        Some(DatePerhapsTime::Date(date)) => (
            Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))),
            true,
            None,
        ),
        Some(DatePerhapsTime::DateTime(dt)) => match dt {
            CalendarDateTime::Utc(instant) => (Some(instant), false, None),
            CalendarDateTime::Floating(naive) => {
                // Floating times have no zone; pin them to UTC.
                (Some(Utc.from_utc_datetime(&naive)), false, None)
            }
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                let instant = tzid
                    .parse::<chrono_tz::Tz>()
                    .ok()
                    .and_then(|tz| tz.from_local_datetime(&date_time).single())
                    .map(|zoned| zoned.with_timezone(&Utc))
                    // Unknown or ambiguous tzid: fall back to UTC rather
                    // than dropping the event.
                    .unwrap_or_else(|| Utc.from_utc_datetime(&date_time));
                (Some(instant), false, Some(tzid))
            }
        },
    }
}

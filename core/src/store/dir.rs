// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Directory-backed calendar store.
//!
//! Each calendar is a directory under the store root holding a
//! `calendar.json` with its display properties and one `.ics` file per
//! materialized event. Handles are uuid-based and opaque to callers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Duration;
use icalendar::{Alarm, Calendar, CalendarComponent, Component, EventLike};
use tokio::fs;
use uuid::Uuid;

use crate::error::StoreError;
use crate::feed;
use crate::store::{
    CalendarHandle, CalendarProperties, CalendarStore, EventFields, EventHandle, StoredEvent,
};

const PROPERTIES_FILE: &str = "calendar.json";
const TIMEZONE_PROPERTY: &str = "X-ICSYNC-TZ";

/// Calendar store materializing calendars as directories of .ics files.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn calendar_dir(&self, calendar: &CalendarHandle) -> PathBuf {
        self.root.join(calendar.as_str())
    }

    /// Event handles encode `<calendar>/<event>` so event operations need
    /// no separate calendar argument.
    fn event_path(&self, event: &EventHandle) -> Result<PathBuf, StoreError> {
        let (calendar, id) = event
            .as_str()
            .split_once('/')
            .ok_or_else(|| StoreError::Event(format!("malformed event handle: {event}")))?;
        Ok(self.root.join(calendar).join(format!("{id}.ics")))
    }

    async fn require_calendar_dir(&self, calendar: &CalendarHandle) -> Result<PathBuf, StoreError> {
        let dir = self.calendar_dir(calendar);
        if !fs::try_exists(&dir).await? {
            return Err(StoreError::NotFound(calendar.to_string()));
        }
        Ok(dir)
    }
}

#[async_trait]
impl CalendarStore for DirectoryStore {
    async fn create_calendar(
        &self,
        properties: &CalendarProperties,
    ) -> Result<CalendarHandle, StoreError> {
        let handle = CalendarHandle::new(Uuid::new_v4().to_string());
        let dir = self.calendar_dir(&handle);
        fs::create_dir_all(&dir).await?;
        write_properties(&dir, properties).await?;

        tracing::debug!(calendar = %handle, name = %properties.name, "created calendar");
        Ok(handle)
    }

    async fn update_calendar(
        &self,
        calendar: &CalendarHandle,
        properties: &CalendarProperties,
    ) -> Result<(), StoreError> {
        let dir = self.require_calendar_dir(calendar).await?;
        write_properties(&dir, properties).await
    }

    async fn delete_calendar(&self, calendar: &CalendarHandle) -> Result<(), StoreError> {
        let dir = self.calendar_dir(calendar);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            // Deleting an already-absent calendar is a no-op.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_event(
        &self,
        calendar: &CalendarHandle,
        fields: &EventFields,
    ) -> Result<EventHandle, StoreError> {
        let dir = self.require_calendar_dir(calendar).await?;

        let id = Uuid::new_v4().to_string();
        let path = dir.join(format!("{id}.ics"));
        fs::write(&path, render_event(&id, fields)).await?;

        Ok(EventHandle::new(format!("{calendar}/{id}")))
    }

    async fn update_event(
        &self,
        event: &EventHandle,
        fields: &EventFields,
    ) -> Result<(), StoreError> {
        let path = self.event_path(event)?;
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(event.to_string()));
        }

        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(event.as_str());
        fs::write(&path, render_event(id, fields)).await?;
        Ok(())
    }

    async fn delete_event(&self, event: &EventHandle) -> Result<(), StoreError> {
        let path = self.event_path(event)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(event.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all_events(&self, calendar: &CalendarHandle) -> Result<(), StoreError> {
        let dir = self.require_calendar_dir(calendar).await?;

        let mut reader = fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "ics") {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    async fn list_events(&self, calendar: &CalendarHandle) -> Result<Vec<StoredEvent>, StoreError> {
        let dir = self.require_calendar_dir(calendar).await?;

        let mut events = Vec::new();
        let mut reader = fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "ics") {
                continue;
            }
            match read_event(calendar, &path).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), err = %e, "skipping unreadable event file")
                }
            }
        }
        Ok(events)
    }
}

async fn write_properties(dir: &Path, properties: &CalendarProperties) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(properties)
        .map_err(|e| StoreError::Calendar(format!("failed to encode properties: {e}")))?;
    fs::write(dir.join(PROPERTIES_FILE), json).await?;
    Ok(())
}

fn render_event(id: &str, fields: &EventFields) -> String {
    let mut vevent = icalendar::Event::new();
    vevent.uid(id).summary(&fields.title);

    if let Some(location) = &fields.location {
        vevent.location(location);
    }
    if let Some(description) = &fields.description {
        vevent.description(description);
    }

    if fields.all_day {
        vevent
            .starts(fields.start.date_naive())
            .ends(fields.end.date_naive());
    } else {
        vevent.starts(fields.start).ends(fields.end);
    }
    vevent.add_property(TIMEZONE_PROPERTY, &fields.timezone);

    if let Some(minutes) = fields.reminder_minutes {
        vevent.alarm(Alarm::display(
            &fields.title,
            -Duration::minutes(i64::from(minutes)),
        ));
    }

    Calendar::new().push(vevent.done()).done().to_string()
}

async fn read_event(
    calendar: &CalendarHandle,
    path: &Path,
) -> Result<Option<StoredEvent>, StoreError> {
    let content = fs::read_to_string(path).await?;
    let parsed: Calendar = content
        .parse()
        .map_err(|e: String| StoreError::Event(format!("{}: {e}", path.display())))?;

    let Some(vevent) = parsed.components.iter().find_map(|c| match c {
        CalendarComponent::Event(event) => Some(event),
        _ => None,
    }) else {
        return Ok(None);
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let (start, all_day, tzid) = feed::resolve(vevent.get_start());
    let (end, _, _) = feed::resolve(vevent.get_end());

    Ok(Some(StoredEvent {
        handle: EventHandle::new(format!("{calendar}/{stem}")),
        title: vevent.get_summary().unwrap_or_default().to_string(),
        all_day,
        start,
        end,
        timezone: vevent
            .property_value(TIMEZONE_PROPERTY)
            .map(str::to_string)
            .or(tzid),
    }))
}

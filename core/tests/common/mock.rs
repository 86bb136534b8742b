// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory doubles for the calendar store and the feed fetcher.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use icsync_core::{
    CalendarHandle, CalendarProperties, CalendarStore, EventFields, EventHandle, FeedFetcher,
    FetchError, Fetched, StoreError, StoredEvent,
};

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    calendars: HashMap<String, CalendarProperties>,
    // handle -> (owning calendar, fields)
    events: HashMap<String, (String, EventFields)>,
    fail_titles: HashSet<String>,
    inserts: usize,
}

/// In-memory [`CalendarStore`] with injectable per-event failures.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes inserts and updates of events with this title fail.
    pub fn fail_on_title(&self, title: &str) {
        self.inner.lock().unwrap().fail_titles.insert(title.to_string());
    }

    pub fn calendar_count(&self) -> usize {
        self.inner.lock().unwrap().calendars.len()
    }

    /// Handle of the store's single calendar. Panics when there is not
    /// exactly one.
    pub fn only_calendar(&self) -> CalendarHandle {
        let inner = self.inner.lock().unwrap();
        assert_eq!(inner.calendars.len(), 1, "expected exactly one calendar");
        CalendarHandle::new(inner.calendars.keys().next().unwrap().clone())
    }

    /// Display properties currently on a calendar.
    pub fn calendar_properties(&self, calendar: &CalendarHandle) -> Option<CalendarProperties> {
        self.inner.lock().unwrap().calendars.get(calendar.as_str()).cloned()
    }

    /// Total successful event inserts over the store's lifetime.
    pub fn insert_count(&self) -> usize {
        self.inner.lock().unwrap().inserts
    }

    /// Titles of events in a calendar, sorted for stable comparison.
    pub fn sorted_event_titles(&self, calendar: &CalendarHandle) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut titles: Vec<String> = inner
            .events
            .values()
            .filter(|(cal, _)| cal == calendar.as_str())
            .map(|(_, fields)| fields.title.clone())
            .collect();
        titles.sort();
        titles
    }

    /// Removes an event directly, as an out-of-band edit by another app.
    pub fn remove_event_raw(&self, event: &EventHandle) {
        self.inner.lock().unwrap().events.remove(event.as_str());
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn create_calendar(
        &self,
        properties: &CalendarProperties,
    ) -> Result<CalendarHandle, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let handle = format!("cal-{}", inner.next_id);
        inner.calendars.insert(handle.clone(), properties.clone());
        Ok(CalendarHandle::new(handle))
    }

    async fn update_calendar(
        &self,
        calendar: &CalendarHandle,
        properties: &CalendarProperties,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.calendars.get_mut(calendar.as_str()) {
            Some(existing) => {
                *existing = properties.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(calendar.to_string())),
        }
    }

    async fn delete_calendar(&self, calendar: &CalendarHandle) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calendars.remove(calendar.as_str());
        inner.events.retain(|_, (cal, _)| cal.as_str() != calendar.as_str());
        Ok(())
    }

    async fn insert_event(
        &self,
        calendar: &CalendarHandle,
        fields: &EventFields,
    ) -> Result<EventHandle, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.calendars.contains_key(calendar.as_str()) {
            return Err(StoreError::NotFound(calendar.to_string()));
        }
        if inner.fail_titles.contains(&fields.title) {
            return Err(StoreError::Event(format!("injected failure: {}", fields.title)));
        }
        inner.next_id += 1;
        inner.inserts += 1;
        let handle = format!("{}/evt-{}", calendar.as_str(), inner.next_id);
        inner
            .events
            .insert(handle.clone(), (calendar.to_string(), fields.clone()));
        Ok(EventHandle::new(handle))
    }

    async fn update_event(
        &self,
        event: &EventHandle,
        fields: &EventFields,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_titles.contains(&fields.title) {
            return Err(StoreError::Event(format!("injected failure: {}", fields.title)));
        }
        match inner.events.get_mut(event.as_str()) {
            Some((_, existing)) => {
                *existing = fields.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(event.to_string())),
        }
    }

    async fn delete_event(&self, event: &EventHandle) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.events.remove(event.as_str()) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(event.to_string())),
        }
    }

    async fn delete_all_events(&self, calendar: &CalendarHandle) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.retain(|_, (cal, _)| cal.as_str() != calendar.as_str());
        Ok(())
    }

    async fn list_events(&self, calendar: &CalendarHandle) -> Result<Vec<StoredEvent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .filter(|(_, (cal, _))| cal == calendar.as_str())
            .map(|(handle, (_, fields))| StoredEvent {
                handle: EventHandle::new(handle.clone()),
                title: fields.title.clone(),
                all_day: fields.all_day,
                start: Some(fields.start),
                end: Some(fields.end),
                timezone: Some(fields.timezone.clone()),
            })
            .collect())
    }
}

/// One scripted fetch response.
pub enum Script {
    Body(String),
    BodyWithEtag(String, String),
    /// Sleeps before returning the body, holding the pass in its fetch.
    SlowBody(String),
    Timeout,
    NotFound,
}

const SLOW_RESPONSE: std::time::Duration = std::time::Duration::from_secs(30);

/// [`FeedFetcher`] replaying scripted responses per location.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, location: &str, responses: Vec<Script>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(location.to_string())
            .or_default()
            .extend(responses);
    }

    pub fn calls(&self, location: &str) -> usize {
        self.calls.lock().unwrap().get(location).copied().unwrap_or(0)
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        location: &str,
        _credentials: Option<&icsync_core::Credentials>,
        _user_agent: Option<&str>,
    ) -> Result<Fetched, FetchError> {
        *self.calls.lock().unwrap().entry(location.to_string()).or_insert(0) += 1;

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(location)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Script::Body(body)) => Ok(Fetched { body, etag: None }),
            Some(Script::BodyWithEtag(body, etag)) => Ok(Fetched {
                body,
                etag: Some(etag),
            }),
            Some(Script::SlowBody(body)) => {
                tokio::time::sleep(SLOW_RESPONSE).await;
                Ok(Fetched { body, etag: None })
            }
            Some(Script::Timeout) => Err(FetchError::Timeout(location.to_string())),
            Some(Script::NotFound) | None => Err(FetchError::NotFound(location.to_string())),
        }
    }
}

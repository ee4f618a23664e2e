//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body};
use chrono::{DateTime, FixedOffset, NaiveDate};

use sharecal::api::{AppState, app};
use sharecal::calendar::{BackendError, CalendarBackend, CalendarEvent, DateResolver, EventTime};
use sharecal::commands::{CommandContext, CommandRegistry, Invocation};
use sharecal::core::{AccessControl, AllowList, AppConfig, PairingDirectory, UserId, UserIdentity};

pub const ALICE: UserId = UserId(1001);
pub const BOB: UserId = UserId(1002);
// Paired with alice but not allowed to write
pub const MALLORY: UserId = UserId(9999);
// Neither allowed nor paired
pub const STRANGER: UserId = UserId(4242);

/// Every call the commands made against the calendar, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { date: NaiveDate, title: String },
    Update { id: String, date: NaiveDate, title: String },
    Delete { id: String },
    ListRange { start: DateTime<FixedOffset>, end: DateTime<FixedOffset> },
}

/// In-memory calendar that records calls and can be told to fail.
#[derive(Default)]
pub struct FakeCalendar {
    events: Mutex<Vec<CalendarEvent>>,
    calls: Mutex<Vec<Call>>,
    fail_create: Option<BackendError>,
    fail_update: Option<BackendError>,
    fail_delete: Option<BackendError>,
    fail_list: Option<BackendError>,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn failing_create(mut self, err: BackendError) -> Self {
        self.fail_create = Some(err);
        self
    }

    pub fn failing_update(mut self, err: BackendError) -> Self {
        self.fail_update = Some(err);
        self
    }

    pub fn failing_delete(mut self, err: BackendError) -> Self {
        self.fail_delete = Some(err);
        self
    }

    pub fn failing_list(mut self, err: BackendError) -> Self {
        self.fail_list = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CalendarBackend for FakeCalendar {
    async fn create(&self, date: NaiveDate, title: &str) -> Result<CalendarEvent, BackendError> {
        self.record(Call::Create {
            date,
            title: title.to_string(),
        });
        if let Some(err) = &self.fail_create {
            return Err(err.clone());
        }

        let mut events = self.events.lock().unwrap();
        let id = format!("evt-{}", events.len() + 1);
        let event = all_day(&id, title, date);
        events.push(event.clone());
        Ok(event)
    }

    async fn update(
        &self,
        event_id: &str,
        new_date: NaiveDate,
        new_title: &str,
    ) -> Result<CalendarEvent, BackendError> {
        self.record(Call::Update {
            id: event_id.to_string(),
            date: new_date,
            title: new_title.to_string(),
        });
        if let Some(err) = &self.fail_update {
            return Err(err.clone());
        }

        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| BackendError::Unexpected(format!("no event {}", event_id)))?;
        *event = all_day(event_id, new_title, new_date);
        Ok(event.clone())
    }

    async fn delete(&self, event_id: &str) -> Result<(), BackendError> {
        self.record(Call::Delete {
            id: event_id.to_string(),
        });
        if let Some(err) = &self.fail_delete {
            return Err(err.clone());
        }

        self.events.lock().unwrap().retain(|e| e.id != event_id);
        Ok(())
    }

    async fn list_range(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, BackendError> {
        self.record(Call::ListRange { start, end });
        if let Some(err) = &self.fail_list {
            return Err(err.clone());
        }

        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|e| match &e.time {
                EventTime::AllDay { date } => {
                    *date >= start.date_naive() && *date < end.date_naive()
                }
                EventTime::Timed { start: s, .. } => *s >= start && *s < end,
            })
            .cloned()
            .collect())
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn all_day(id: &str, title: &str, date: NaiveDate) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        title: title.to_string(),
        time: EventTime::AllDay { date },
        link: Some(format!("https://calendar.example.com/event/{}", id)),
    }
}

pub fn timed(id: &str, title: &str, start: &str, end: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        title: title.to_string(),
        time: EventTime::Timed {
            start: DateTime::parse_from_rfc3339(start).unwrap(),
            end: DateTime::parse_from_rfc3339(end).unwrap(),
        },
        link: None,
    }
}

pub fn user(id: UserId, name: &str) -> UserIdentity {
    UserIdentity {
        id,
        display_name: name.to_string(),
    }
}

pub fn alice() -> UserIdentity {
    user(ALICE, "alice")
}

pub fn mallory() -> UserIdentity {
    user(MALLORY, "mallory")
}

pub fn stranger() -> UserIdentity {
    user(STRANGER, "stranger")
}

/// alice and bob may write and are paired with each other. mallory is
/// paired with alice but may not write.
pub fn test_access() -> AccessControl {
    let allow_list: AllowList = [(ALICE, "alice".to_string()), (BOB, "bob".to_string())]
        .into_iter()
        .collect();
    let pairings: PairingDirectory = [(ALICE, BOB), (BOB, ALICE), (MALLORY, ALICE)]
        .into_iter()
        .collect();
    AccessControl::new(allow_list, pairings)
}

/// Command context over `calendar` with "today" pinned to 2024-03-01.
pub fn test_context(calendar: Arc<FakeCalendar>) -> CommandContext {
    CommandContext::new(
        calendar,
        Arc::new(test_access()),
        DateResolver::pinned(ymd(2024, 3, 1)),
    )
}

pub fn test_registry(calendar: Arc<FakeCalendar>) -> CommandRegistry {
    CommandRegistry::new(test_context(calendar))
}

pub fn invocation(user: UserIdentity, args: serde_json::Value) -> Invocation {
    Invocation::new(user, args)
}

pub fn test_config(webhook_url: Option<String>) -> AppConfig {
    AppConfig {
        calendar_id: Some(String::from("test-calendar")),
        credentials_path: None,
        calendar_scope: String::from("https://www.googleapis.com/auth/calendar"),
        access_config_path: String::from("config/config.json"),
        webhook_url,
        google_api_url: String::from("http://127.0.0.1:9"),
        google_token_url: String::from("http://127.0.0.1:9/token"),
    }
}

/// Creates a test application router backed by `calendar`.
pub fn test_app(calendar: Arc<FakeCalendar>, webhook_url: Option<String>) -> Router {
    let state = AppState::with_context(test_context(calendar), test_config(webhook_url));
    app(Arc::new(state))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

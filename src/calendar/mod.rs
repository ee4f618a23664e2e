//! Calendar domain types and the backend contract that every chat
//! command runs against. Events are never cached locally, each
//! operation goes back to the backend.

pub mod dates;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

pub use dates::{DateError, DateResolver, DayWindow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventTime {
    AllDay {
        date: NaiveDate,
    },
    Timed {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub time: EventTime,
    pub link: Option<String>,
}

impl CalendarEvent {
    pub fn is_all_day(&self) -> bool {
        matches!(self.time, EventTime::AllDay { .. })
    }
}

/// Reasons a backend call can fail. The display strings are shown to
/// chat users as-is so keep them readable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("could not connect to the calendar service: {0}")]
    Unreachable(String),

    #[error("the calendar is not configured: {0}")]
    MissingConfig(String),

    #[error("calendar API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no event titled '{title}' was found on {date}")]
    NotFound { date: NaiveDate, title: String },

    #[error("unexpected calendar error: {0}")]
    Unexpected(String),
}

#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Create an all-day event on `date`.
    async fn create(&self, date: NaiveDate, title: &str) -> Result<CalendarEvent, BackendError>;

    /// Overwrite the title and date of an existing event. Timed events
    /// become all-day events.
    async fn update(
        &self,
        event_id: &str,
        new_date: NaiveDate,
        new_title: &str,
    ) -> Result<CalendarEvent, BackendError>;

    async fn delete(&self, event_id: &str) -> Result<(), BackendError>;

    /// Events in `[start, end)` ordered by start time with recurring
    /// events expanded into single occurrences.
    async fn list_range(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, BackendError>;

    /// First event on `date` whose title is byte-for-byte equal to
    /// `title`, in the order the backend listed them. Duplicate titles on
    /// the same day are not reported, the earliest one wins.
    async fn find_by_exact_title(
        &self,
        date: NaiveDate,
        title: &str,
    ) -> Result<CalendarEvent, BackendError> {
        let window = DayWindow::for_date(date, dates::calendar_offset());
        let events = self.list_range(window.start, window.end).await?;

        events
            .into_iter()
            .find(|event| event.title == title)
            .ok_or_else(|| BackendError::NotFound {
                date,
                title: title.to_string(),
            })
    }
}

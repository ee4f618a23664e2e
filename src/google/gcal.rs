//! Google Calendar v3 client backing the chat commands.
//!
//! Only the handful of endpoints the bot needs are covered: insert,
//! list, get, update and delete on a single calendar.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::oauth::Credentials;
use crate::calendar::{BackendError, CalendarBackend, CalendarEvent, EventTime};
use crate::core::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// Refresh a little early so a token never expires mid-request
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const PAGE_SIZE: &str = "250";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

/// Event resource as returned by the Calendar API, trimmed to the
/// fields the bot reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

impl TryFrom<Event> for CalendarEvent {
    type Error = BackendError;

    fn try_from(event: Event) -> Result<Self, Self::Error> {
        let start = event.start.ok_or_else(|| {
            BackendError::Unexpected(format!("event {} has no start", event.id))
        })?;

        let time = if let Some(date) = start.date {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|err| {
                BackendError::Unexpected(format!("bad start date {:?}: {}", date, err))
            })?;
            EventTime::AllDay { date }
        } else if let Some(start_time) = start.date_time {
            let start = parse_timestamp(&start_time)?;
            let end = match event.end.and_then(|end| end.date_time) {
                Some(end_time) => parse_timestamp(&end_time)?,
                None => start,
            };
            EventTime::Timed { start, end }
        } else {
            return Err(BackendError::Unexpected(format!(
                "event {} has neither date nor dateTime",
                event.id
            )));
        };

        Ok(CalendarEvent {
            id: event.id,
            title: event.summary.unwrap_or_else(|| "(no title)".to_string()),
            time,
            link: event.html_link,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, BackendError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|err| BackendError::Unexpected(format!("bad timestamp {:?}: {}", value, err)))
}

/// All-day events end on the following day, the API treats the end
/// date as exclusive.
fn all_day(date: NaiveDate) -> (Value, Value) {
    let end = date.succ_opt().unwrap_or(date);
    (
        json!({ "date": date.format("%Y-%m-%d").to_string() }),
        json!({ "date": end.format("%Y-%m-%d").to_string() }),
    )
}

pub(crate) fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_connect() || err.is_timeout() {
        BackendError::Unreachable(err.to_string())
    } else {
        BackendError::Unexpected(err.to_string())
    }
}

async fn api_error(resp: Response) -> BackendError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoogleErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    BackendError::Api { status, message }
}

async fn decode<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, BackendError> {
    resp.json::<T>()
        .await
        .map_err(|err| BackendError::Unexpected(format!("invalid response: {}", err)))
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct GoogleCalendar {
    client: Client,
    api_url: String,
    token_url: String,
    calendar_id: Option<String>,
    credentials_path: Option<String>,
    scope: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleCalendar {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.google_api_url.trim_end_matches('/').to_string(),
            token_url: config.google_token_url.clone(),
            calendar_id: config.calendar_id.clone(),
            credentials_path: config.credentials_path.clone(),
            scope: config.calendar_scope.clone(),
            token: Mutex::new(None),
        }
    }

    fn events_url(&self) -> Result<String, BackendError> {
        let calendar_id = self.calendar_id.as_deref().ok_or_else(|| {
            BackendError::MissingConfig("no calendar id is set".to_string())
        })?;
        Ok(format!(
            "{}/calendars/{}/events",
            self.api_url,
            urlencoding::encode(calendar_id)
        ))
    }

    fn event_url(&self, event_id: &str) -> Result<String, BackendError> {
        Ok(format!(
            "{}/{}",
            self.events_url()?,
            urlencoding::encode(event_id)
        ))
    }

    async fn access_token(&self) -> Result<String, BackendError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.access_token.clone());
        }

        let path = self.credentials_path.as_deref().ok_or_else(|| {
            BackendError::MissingConfig("no credentials path is set".to_string())
        })?;
        let credentials = Credentials::from_file(path).await?;
        let token_url = credentials.token_uri().unwrap_or(&self.token_url);

        let oauth = credentials
            .fetch_access_token(&self.client, token_url, &self.scope)
            .await?;
        let lifetime = Duration::from_secs(oauth.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            access_token: oauth.access_token.clone(),
            expires_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        });

        Ok(oauth.access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let token = self.access_token().await?;
        let resp = request
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(api_error(resp).await)
        }
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendar {
    async fn create(&self, date: NaiveDate, title: &str) -> Result<CalendarEvent, BackendError> {
        let url = self.events_url()?;
        let (start, end) = all_day(date);
        let body = json!({
            "summary": title,
            "start": start,
            "end": end,
            "transparency": "transparent",
        });

        let resp = self.send(self.client.post(url).json(&body)).await?;
        let event: Event = decode(resp).await?;
        tracing::info!("Event created: {:?}", event.html_link);
        event.try_into()
    }

    async fn update(
        &self,
        event_id: &str,
        new_date: NaiveDate,
        new_title: &str,
    ) -> Result<CalendarEvent, BackendError> {
        let url = self.event_url(event_id)?;

        // Write back the whole resource so fields we don't model survive
        let resp = self.send(self.client.get(&url)).await?;
        let mut resource: Value = decode(resp).await?;
        let (start, end) = all_day(new_date);
        resource["summary"] = json!(new_title);
        resource["start"] = start;
        resource["end"] = end;

        let resp = self.send(self.client.put(&url).json(&resource)).await?;
        let event: Event = decode(resp).await?;
        tracing::info!("Event updated: {:?}", event.html_link);
        event.try_into()
    }

    async fn delete(&self, event_id: &str) -> Result<(), BackendError> {
        let url = self.event_url(event_id)?;
        self.send(self.client.delete(url)).await?;
        tracing::info!("Event deleted: {}", event_id);
        Ok(())
    }

    async fn list_range(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, BackendError> {
        let url = self.events_url()?;
        let time_min = start.to_rfc3339();
        let time_max = end.to_rfc3339();

        let mut events = vec![];
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let resp = self.send(self.client.get(&url).query(&query)).await?;
            let page: EventList = decode(resp).await?;
            for event in page.items {
                events.push(CalendarEvent::try_from(event)?);
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }
}

//! Google Calendar v3 events client

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::CalendarEvents;
use super::service_account::{ServiceAccountCredentials, TokenCache};
use crate::core::QueryWindow;

#[derive(Debug, Deserialize)]
pub struct ListEventsResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// A non-success response from the Calendar API.
#[derive(Debug, Clone)]
pub struct GoogleApiError {
    pub status: StatusCode,
    pub reason: String,
}

impl GoogleApiError {
    /// Prefer the message Google puts in the error body and fall back
    /// to the canonical reason phrase for the status.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let reason = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .filter(|message| !message.is_empty())
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_else(|| status.to_string());
        Self { status, reason }
    }
}

impl fmt::Display for GoogleApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Google Calendar API returned {}: {}",
            self.status.as_u16(),
            self.reason
        )
    }
}

impl std::error::Error for GoogleApiError {}

/// Authenticated handle for reading events
pub struct GoogleCalendar {
    client: Client,
    api_url: String,
    credentials: Arc<ServiceAccountCredentials>,
    tokens: Arc<TokenCache>,
}

impl GoogleCalendar {
    pub fn new(
        client: Client,
        api_url: &str,
        credentials: Arc<ServiceAccountCredentials>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            tokens,
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_url,
            urlencoding::encode(calendar_id)
        )
    }
}

#[async_trait]
impl CalendarEvents for GoogleCalendar {
    async fn list_events(&self, calendar_id: &str, window: &QueryWindow) -> Result<Vec<Value>> {
        let access_token = self
            .tokens
            .get_or_refresh(&self.client, &self.credentials)
            .await?;

        let res = self
            .client
            .get(self.events_url(calendar_id))
            .bearer_auth(&access_token)
            .query(&[
                ("timeMin", window.time_min()),
                ("timeMax", window.time_max()),
                ("singleEvents", String::from("true")),
                ("orderBy", String::from("startTime")),
            ])
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate(&access_token);
        }
        if !status.is_success() {
            return Err(GoogleApiError::from_response(status, &text).into());
        }

        let events: ListEventsResponse = serde_json::from_str(&text)?;
        tracing::debug!(
            "Listed {} events for calendar {} between {} and {}",
            events.items.len(),
            calendar_id,
            window.time_min(),
            window.time_max()
        );
        Ok(events.items)
    }
}

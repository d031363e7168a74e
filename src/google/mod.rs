//! Google Calendar access through a service account

pub mod gcal;
pub mod service_account;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::{AppConfig, QueryWindow};
use gcal::GoogleCalendar;
use service_account::{CALENDAR_READONLY_SCOPE, ServiceAccountCredentials, TokenCache};

/// Read access to a calendar provider's events
#[async_trait]
pub trait CalendarEvents: Send + Sync {
    /// Events starting inside `window`, recurring events expanded into
    /// instances and ordered by start time.
    async fn list_events(&self, calendar_id: &str, window: &QueryWindow) -> Result<Vec<Value>>;
}

/// Produces an authenticated calendar handle. Handlers go through this
/// so tests can swap in a fake provider.
#[async_trait]
pub trait CalendarConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn CalendarEvents>>;
}

/// Connects to Google Calendar with the service account held in
/// `GOOGLE_CREDENTIALS_JSON`.
pub struct GoogleConnector {
    client: Client,
    api_url: String,
    credentials_json: Option<String>,
    tokens: Arc<TokenCache>,
}

impl GoogleConnector {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            api_url: config.calendar_api_url.clone(),
            credentials_json: config.google_credentials_json.clone(),
            tokens: Arc::new(TokenCache::default()),
        })
    }
}

#[async_trait]
impl CalendarConnector for GoogleConnector {
    async fn connect(&self) -> Result<Arc<dyn CalendarEvents>> {
        let credentials = ServiceAccountCredentials::from_json(
            self.credentials_json.as_deref(),
            CALENDAR_READONLY_SCOPE,
        )?;
        Ok(Arc::new(GoogleCalendar::new(
            self.client.clone(),
            &self.api_url,
            Arc::new(credentials),
            Arc::clone(&self.tokens),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn config(credentials: Option<String>) -> AppConfig {
        AppConfig {
            google_credentials_json: credentials,
            calendar_api_url: String::from("http://localhost:1"),
            request_timeout: Duration::from_secs(5),
            cors_allowed_origins: vec![],
        }
    }

    #[tokio::test]
    async fn it_fails_to_connect_without_credentials() {
        let connector = GoogleConnector::new(&config(None)).unwrap();
        assert!(connector.connect().await.is_err());
    }

    #[tokio::test]
    async fn it_fails_to_connect_with_malformed_credentials() {
        let connector = GoogleConnector::new(&config(Some(String::from("not json")))).unwrap();
        assert!(connector.connect().await.is_err());
    }

    #[tokio::test]
    async fn it_connects_with_a_service_account() {
        let json = fs::read_to_string("./tests/data/service_account.json").unwrap();
        let connector = GoogleConnector::new(&config(Some(json))).unwrap();
        assert!(connector.connect().await.is_ok());
    }

    #[tokio::test]
    async fn it_does_not_serialize_requests_behind_a_hanging_token_endpoint() {
        // Accepts connections into the backlog but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let raw = fs::read_to_string("./tests/data/service_account.json").unwrap();
        let mut key: Value = serde_json::from_str(&raw).unwrap();
        key["token_uri"] =
            Value::String(format!("http://{}/token", listener.local_addr().unwrap()));

        let timeout = Duration::from_millis(500);
        let connector = Arc::new(
            GoogleConnector::new(&AppConfig {
                request_timeout: timeout,
                ..config(Some(key.to_string()))
            })
            .unwrap(),
        );
        let window = QueryWindow::for_month(2024, 2).unwrap();

        let started = std::time::Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let connector = Arc::clone(&connector);
                let window = window.clone();
                tokio::spawn(async move {
                    let calendar = connector.connect().await?;
                    calendar.list_events("primary", &window).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_err());
        }
        let elapsed = started.elapsed();

        assert!(elapsed < timeout * 3, "took {:?}", elapsed);
        drop(listener);
    }
}

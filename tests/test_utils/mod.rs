//! Test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{Router, body::Body};
use serde_json::Value;

use gcal_proxy::api::AppState;
use gcal_proxy::api::app;
use gcal_proxy::core::{AppConfig, QueryWindow};
use gcal_proxy::google::gcal::GoogleApiError;
use gcal_proxy::google::{CalendarConnector, CalendarEvents, GoogleConnector};

pub fn test_config(credentials: Option<String>, api_url: &str) -> AppConfig {
    AppConfig {
        google_credentials_json: credentials,
        calendar_api_url: api_url.to_string(),
        request_timeout: Duration::from_secs(5),
        cors_allowed_origins: vec![],
    }
}

/// Service account key from `tests/data` pointing its token endpoint
/// at `token_uri`.
pub fn service_account_json(token_uri: &str) -> String {
    let raw = fs::read_to_string("./tests/data/service_account.json").unwrap();
    let mut key: Value = serde_json::from_str(&raw).unwrap();
    key["token_uri"] = Value::String(token_uri.to_string());
    key.to_string()
}

/// Creates a test application router backed by the real Google
/// connector.
pub fn google_app(config: AppConfig) -> Router {
    let connector = GoogleConnector::new(&config).expect("Failed to build connector");
    let app_state = AppState::new(config, Arc::new(connector));
    app(Arc::new(app_state))
}

/// Creates a test application router backed by a fake provider
pub fn fake_app(connector: FakeConnector) -> Router {
    let config = test_config(None, "http://localhost:1");
    let app_state = AppState::new(config, Arc::new(connector));
    app(Arc::new(app_state))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}

pub enum FakeOutcome {
    Items(Vec<Value>),
    ProviderError(u16, String),
    Failure(String),
}

/// Records every call so tests can check what reached the provider
#[derive(Clone)]
pub struct FakeConnector {
    pub available: bool,
    outcome: Arc<Mutex<Option<FakeOutcome>>>,
    pub connects: Arc<AtomicUsize>,
    pub calls: Arc<Mutex<Vec<(String, QueryWindow)>>>,
}

impl FakeConnector {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self {
            available: true,
            outcome: Arc::new(Mutex::new(Some(outcome))),
            connects: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(FakeOutcome::Items(vec![]))
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn recorded_calls(&self) -> Vec<(String, QueryWindow)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarConnector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn CalendarEvents>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(anyhow!("GOOGLE_CREDENTIALS_JSON is not set"));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl CalendarEvents for FakeConnector {
    async fn list_events(&self, calendar_id: &str, window: &QueryWindow) -> Result<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), window.clone()));

        match self.outcome.lock().unwrap().take() {
            Some(FakeOutcome::Items(items)) => Ok(items),
            Some(FakeOutcome::ProviderError(status, reason)) => Err(GoogleApiError {
                status: http::StatusCode::from_u16(status).unwrap(),
                reason,
            }
            .into()),
            Some(FakeOutcome::Failure(msg)) => Err(anyhow!(msg)),
            None => Err(anyhow!("FakeConnector called more than once")),
        }
    }
}

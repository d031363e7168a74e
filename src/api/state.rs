use std::sync::Arc;

use crate::core::AppConfig;
use crate::google::CalendarConnector;

pub struct AppState {
    pub config: AppConfig,
    pub calendar: Arc<dyn CalendarConnector>,
}

impl AppState {
    pub fn new(config: AppConfig, calendar: Arc<dyn CalendarConnector>) -> Self {
        Self { config, calendar }
    }
}

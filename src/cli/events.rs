use anyhow::{Context, Result};

use crate::api::init_tracing;
use crate::api::public::events::EventsResponse;
use crate::core::{AppConfig, QueryWindow};
use crate::google::{CalendarConnector, GoogleConnector};

pub async fn run(calendar_id: &str, year: i32, month: i32) -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    init_tracing();

    let config = AppConfig::default();
    let window = QueryWindow::for_month(year, month)?;

    let calendar = GoogleConnector::new(&config)?
        .connect()
        .await
        .context("Failed to connect to the Google Calendar service")?;
    let items = calendar.list_events(calendar_id, &window).await?;

    let resp = EventsResponse { items };
    println!("{}", serde_json::to_string_pretty(&resp)?);

    Ok(())
}

//! Router for the events API

use std::sync::Arc;

use axum::{Router, extract::State, response::Json};
use axum_extra::extract::{Query, QueryRejection};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::core::QueryWindow;

type SharedState = Arc<AppState>;

async fn events_handler(
    State(state): State<SharedState>,
    query: Result<Query<public::EventsQuery>, QueryRejection>,
) -> Result<Json<public::EventsResponse>, ApiError> {
    let Query(params) = query.map_err(|rejection| ApiError::Validation(rejection.to_string()))?;
    if params.calendar_id.is_empty() {
        return Err(ApiError::Validation(String::from(
            "calendar_id must not be empty",
        )));
    }

    let calendar = state
        .calendar
        .connect()
        .await
        .map_err(ApiError::ServiceUnavailable)?;

    // Checked after connecting so a misconfigured service fails the
    // same way for every query
    let window = QueryWindow::for_month(params.year, params.month)
        .map_err(|err| ApiError::Validation(err.to_string()))?;

    let items = calendar.list_events(&params.calendar_id, &window).await?;

    Ok(Json(public::EventsResponse { items }))
}

/// Create the events router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::get(events_handler))
}

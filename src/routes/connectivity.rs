use axum::{Json, extract::State, http::StatusCode};

use crate::common::AppState;
use crate::services::monitor::ConnectivityStatus;

/// Current backend connectivity state
#[utoipa::path(
    get,
    path = "/api/connectivity",
    responses(
        (status = 200, description = "Monitor state and retry counter", body = ConnectivityStatus),
    ),
    tag = "connectivity"
)]
pub async fn get_connectivity(State(state): State<AppState>) -> Json<ConnectivityStatus> {
    Json(state.monitor.status())
}

/// Manual reconnect
///
/// Resets the retry budget and triggers an immediate probe, the same action
/// as the dashboard's "Reconnect" button. The probe itself runs
/// asynchronously; poll `/api/connectivity` for the outcome.
#[utoipa::path(
    post,
    path = "/api/connectivity/reconnect",
    responses(
        (status = 202, description = "Reconnect probe scheduled", body = ConnectivityStatus),
    ),
    tag = "connectivity"
)]
pub async fn reconnect(
    State(state): State<AppState>,
) -> (StatusCode, Json<ConnectivityStatus>) {
    state.monitor.force_reconnect();
    (StatusCode::ACCEPTED, Json(state.monitor.status()))
}

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::common::{AppState, DashboardSnapshot};
use crate::error::{AppError, AppResult};
use crate::services::monitor::ConnectivityStatus;
use crate::services::stabilizer::StabilizedReading;

/// Full dashboard payload: the latest snapshot plus the live monitor state.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub snapshot: DashboardSnapshot,
    pub connectivity: ConnectivityStatus,
}

/// Latest consolidated dashboard snapshot
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Current dashboard snapshot", body = DashboardResponse),
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let snapshot = state.snapshot.dashboard().await;
    Json(DashboardResponse {
        snapshot,
        connectivity: state.monitor.status(),
    })
}

/// Latest stabilized reading for one sensor
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Plant sensor tag, e.g. 040PT01"),
    ),
    responses(
        (status = 200, description = "Latest stabilized reading", body = StabilizedReading),
        (status = 404, description = "Unknown sensor tag"),
    ),
    tag = "dashboard"
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<StabilizedReading>> {
    state
        .snapshot
        .reading(&sensor_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Sensor '{sensor_id}' not found")))
}

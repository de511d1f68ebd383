use axum::http::StatusCode;

/// Health check endpoint
///
/// Returns 200 OK if the gateway process is running. Backend reachability
/// is reported separately by `/api/connectivity`.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Gateway is healthy"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed backend payload: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a reqwest failure into the Network/Http taxonomy.
    /// Timeouts and connection failures are network errors; anything
    /// carrying a status code is an HTTP error.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Network(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Network(msg) => {
                tracing::error!("Network error: {msg}");
                (StatusCode::BAD_GATEWAY, format!("Backend unreachable: {msg}"))
            }
            Self::Http { status, message } => {
                tracing::error!("Backend HTTP {status}: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Backend returned HTTP {status}"),
                )
            }
            Self::Data(msg) => {
                tracing::error!("Malformed backend payload: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Malformed backend payload".to_string(),
                )
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

use super::state::AppState;
use crate::device::DeviceRecord;
use crate::error::LogError;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const EMPTY_LOG_MESSAGE: &str = "Log file is empty or does not exist";
pub const RECORD_WRITTEN_MESSAGE: &str = "Record written successfully";
pub const LOG_CLEARED_MESSAGE: &str = "Log file cleared";
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

impl IntoResponse for LogError {
    fn into_response(self) -> Response {
        let message = match self {
            LogError::Read(_) => "Failed to read log file",
            LogError::Open(_) => "Failed to open log file",
            LogError::Write(_) => "Failed to write to log file",
            LogError::Truncate(_) => "Failed to clear log file",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

// GET / - return the raw log contents
pub async fn read_log(State(state): State<Arc<AppState>>) -> Response {
    match state.log.read().await {
        Ok(Some(content)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response(),
        Ok(None) => (StatusCode::OK, EMPTY_LOG_MESSAGE).into_response(),
        Err(e) => {
            error!("{}", e);
            e.into_response()
        }
    }
}

// POST / - append one device record
//
// The body is decoded by hand so any Content-Type is accepted and every
// decode failure maps to 400.
pub async fn append_record(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let record = match DeviceRecord::from_json(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected malformed device record: {}", e);
            return (StatusCode::BAD_REQUEST, INVALID_JSON_MESSAGE).into_response();
        }
    };

    match state.log.append(&record).await {
        Ok(()) => {
            info!(
                "Logged device {} ({}, {}, {})",
                record.device_name, record.device_type, record.ip_address, record.routing_type
            );
            (StatusCode::OK, RECORD_WRITTEN_MESSAGE).into_response()
        }
        Err(e) => {
            error!("Failed to log device {}: {}", record.device_name, e);
            e.into_response()
        }
    }
}

// DELETE / - truncate the log
pub async fn clear_log(State(state): State<Arc<AppState>>) -> Response {
    match state.log.clear().await {
        Ok(()) => {
            info!("Log file cleared");
            (StatusCode::OK, LOG_CLEARED_MESSAGE).into_response()
        }
        Err(e) => {
            error!("{}", e);
            e.into_response()
        }
    }
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
}

//! HTTP handlers for API endpoints.

use crate::channel::{ChannelError, SnapshotChannel};
use crate::metrics::Snapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared handler state: the channel every request reads from.
pub type AppState = Arc<dyn SnapshotChannel>;

/// Return the newest published snapshot.
pub async fn get_metrics(
    State(channel): State<AppState>,
) -> Result<Json<Snapshot>, ChannelError> {
    let snapshot = channel.latest().await?;
    debug!("Serving snapshot taken at {}", snapshot.timestamp);
    Ok(Json(snapshot))
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "hostpulse",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

impl ChannelError {
    /// HTTP status a polling client should see for this failure.
    ///
    /// Only an empty channel maps to 503, meaning "try again shortly".
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChannelError::NoData => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChannelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            debug!("Metrics channel empty");
        } else {
            error!("Failed to read metrics channel: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

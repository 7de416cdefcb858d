//! Readiness handler.
//!
//! An external scheduler pings this to keep the relay warm and to notice
//! outages. It deliberately touches no external dependency: the directory
//! host being down must not make the relay look dead.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{debug, instrument};

/// Readiness endpoint handler.
///
/// Always answers 200 with a static readiness body; called frequently, so
/// it avoids any expensive work.
#[instrument(name = "readiness_check")]
pub async fn readiness_check() -> Response {
    debug!("Performing readiness check");

    let response = serde_json::json!({
        "status": "ready",
        "service": "coupon-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response)).into_response()
}

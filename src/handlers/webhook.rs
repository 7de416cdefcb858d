//! Order webhook handler: verify, resolve, dispatch, acknowledge.
//!
//! The body is captured as raw `Bytes` and verified before any JSON
//! decoding; HMACs are sensitive to exact byte representation, so a
//! decode-then-re-encode would desynchronize the signature.
//!
//! After a verified signature the sender always receives 200, whatever
//! happens downstream. The order platform retries failed webhooks and
//! alert delivery is not safe to repeat blindly, so reliability of the
//! alerting path is traded away to avoid duplicate alerts.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::crypto::verify_signature;
use crate::dispatch::AlertPayload;
use crate::error::RelayError;
use crate::order;
use crate::AppState;

/// Header carrying the base64 HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-wc-webhook-signature";

/// Acknowledgment returned to the webhook sender.
#[derive(Debug, Serialize)]
pub struct RelayAck {
    /// Outcome summary: `processed`, `no_coupon`, `no_match`, or
    /// `directory_unavailable`.
    pub status: &'static str,
    /// Destinations that acknowledged the alert with 2xx.
    pub delivered: usize,
    /// Destinations that did not.
    pub failed: usize,
}

impl RelayAck {
    fn skipped(status: &'static str) -> Self {
        Self { status, delivered: 0, failed: 0 }
    }
}

/// Error response with code and message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details including code and message.
    pub error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Stable snake_case error code.
    pub code: String,
    /// Human-readable error description.
    pub message: String,
}

/// Relays one signed order webhook.
///
/// Pipeline, in order: secret presence check, signature verification over
/// the raw bytes, directory fetch, order extraction, coupon lookup, alert
/// fan-out. Verification short-circuits before any downstream work.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 401: signature mismatch or missing signature header
/// - 500: webhook secret not configured
/// - 200: everything else, including downstream failures (webhook
///   acknowledgment semantics; the sender must never retry)
#[instrument(
    name = "order_webhook",
    skip(state, headers, body),
    fields(
        content_length = body.len(),
        signature_present = headers.contains_key(SIGNATURE_HEADER),
    )
)]
pub async fn handle_order_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    debug!("Processing order webhook");

    if !state.config.has_secret() {
        warn!("Webhook secret is not configured, refusing delivery");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &RelayError::SecretNotConfigured,
        );
    }

    let signature =
        headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();

    let verdict = verify_signature(&body, signature, &state.config.webhook_secret);
    if !verdict.is_valid {
        warn!(reason = ?verdict.error_message, "Webhook signature rejected");
        return error_response(StatusCode::UNAUTHORIZED, &RelayError::InvalidSignature);
    }

    debug!("Signature verified");

    // Everything below is best-effort: log, acknowledge, never retry.
    let directory = match state.directory.fetch().await {
        Ok(directory) => directory,
        Err(e) => {
            warn!(error = %e, code = e.code(), "Destination directory fetch failed");
            return ack(RelayAck::skipped("directory_unavailable"));
        },
    };

    let Some(event) = order::extract_from_bytes(&body) else {
        debug!("Order carries no coupon, nothing to dispatch");
        return ack(RelayAck::skipped("no_coupon"));
    };

    let Some(destinations) = directory.lookup(&event.coupon_code) else {
        debug!(coupon = %event.coupon_code, "No destination mapped for coupon");
        return ack(RelayAck::skipped("no_match"));
    };

    let payload = AlertPayload::for_order(&event);
    let outcomes = state.dispatcher.dispatch_all(destinations, &payload).await;

    let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
    let failed = outcomes.len() - delivered;

    info!(
        coupon = %event.coupon_code,
        destinations = outcomes.len(),
        delivered,
        failed,
        "Order webhook relayed"
    );

    ack(RelayAck { status: "processed", delivered, failed })
}

fn ack(body: RelayAck) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(status: StatusCode, error: &RelayError) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail { code: error.code().to_string(), message: error.to_string() },
    };

    (status, Json(body)).into_response()
}
